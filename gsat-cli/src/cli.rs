//! Contains structures and functionality for the binary
use std::{path::PathBuf, time::Duration};

use gsat::saturation::{ProcessingOrder, SaturationParameters};

/// Possible settings for the reporting option.
#[derive(clap::ValueEnum, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub(crate) enum Reporting {
    /// Disable reporting.
    None,
    /// Print short report if the rules are written to a file. Otherwise disable reporting.
    #[default]
    Auto,
    /// Print short report.
    Short,
    /// Print short report and detailed timing.
    Time,
}

/// When to drop rules that are irrelevant for the target predicates
#[derive(clap::ValueEnum, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub(crate) enum FilterStage {
    /// Filter the input rules
    Before,
    /// Filter the saturated rules
    After,
    /// Filter the input rules and the saturated rules
    #[default]
    Both,
}

impl FilterStage {
    /// Whether the input rules are filtered
    pub(crate) fn before(self) -> bool {
        matches!(self, Self::Before | Self::Both)
    }

    /// Whether the saturated rules are filtered
    pub(crate) fn after(self) -> bool {
        matches!(self, Self::After | Self::Both)
    }
}

/// Order in which derived rules are processed
#[derive(clap::ValueEnum, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub(crate) enum Order {
    /// Process rules in the order they were derived
    #[default]
    Fifo,
    /// Process the most recently derived rule first
    Lifo,
}

impl From<Order> for ProcessingOrder {
    fn from(value: Order) -> Self {
        match value {
            Order::Fifo => ProcessingOrder::Fifo,
            Order::Lifo => ProcessingOrder::Lifo,
        }
    }
}

/// Cli Arguments related to logging
#[derive(clap::Args, Debug)]
pub(crate) struct LoggingArgs {
    /// Increase log verbosity (multiple uses increase verbosity further)
    #[arg(short, long, action = clap::builder::ArgAction::Count, group = "verbosity")]
    verbose: u8,
    /// Reduce log verbosity to show only errors (equivalent to --log error)
    #[arg(short, long, group = "verbosity")]
    quiet: bool,
    /// Set log verbosity (default is "warn")
    #[arg(long = "log", value_parser=clap::builder::PossibleValuesParser::new(["error", "warn", "info", "debug", "trace"]), group = "verbosity")]
    log_level: Option<String>,
}

impl LoggingArgs {
    /// Initialising Logging
    ///
    /// Sets the logging verbosity to the given log-level in the following order:
    ///  * `Info`, `Debug`, `Trace`; depending on the count of `-v`
    ///  * `Error` when `-q` is used
    ///  * The `GSAT_LOG` environment variable value
    ///  * `Warn` otherwise
    pub(crate) fn initialize_logging(&self) {
        let mut builder = env_logger::Builder::new();

        // Default log level
        builder.filter_level(log::LevelFilter::Warn);

        builder.parse_env("GSAT_LOG");
        if let Some(ref level) = self.log_level {
            builder.parse_filters(level);
        } else if self.quiet {
            builder.filter_level(log::LevelFilter::Error);
        } else if self.verbose > 0 {
            builder.filter_level(match self.verbose {
                1 => log::LevelFilter::Info,
                2 => log::LevelFilter::Debug,
                _ => log::LevelFilter::Trace,
            });
        }
        builder.init();
    }
}

/// Cli arguments related to the saturation
#[derive(Debug, clap::Args)]
pub(crate) struct SaturationArgs {
    /// Stop after processing this many rules
    #[arg(long = "step-limit")]
    step_limit: Option<usize>,
    /// Stop after this many milliseconds
    #[arg(long = "time-limit", value_name = "MS")]
    time_limit: Option<u64>,
    /// Order in which derived rules are processed
    #[arg(long = "order", value_enum, default_value_t)]
    order: Order,
}

impl SaturationArgs {
    /// Translate the arguments into [SaturationParameters].
    pub(crate) fn parameters(&self) -> SaturationParameters {
        let mut parameters = SaturationParameters::default().with_order(self.order.into());
        parameters.set_step_limit(self.step_limit);
        parameters.set_time_limit(self.time_limit.map(Duration::from_millis));

        parameters
    }
}

/// Cli arguments related to file output
#[derive(Debug, clap::Args)]
pub(crate) struct OutputArgs {
    /// File to write the saturated rules to (default is standard output)
    #[arg(short, long = "output")]
    pub(crate) output: Option<PathBuf>,
    /// Replace an existing output file
    #[arg(long = "overwrite", default_value = "false")]
    pub(crate) overwrite: bool,
    /// File to write the statistics of the saturation to, as JSON
    #[arg(long = "statistics")]
    pub(crate) statistics: Option<PathBuf>,
}

/// Gsat CLI
#[derive(clap::Parser, Debug)]
#[command(author, version, about)]
pub struct CliApp {
    /// Rule file to saturate
    #[arg(value_parser)]
    pub(crate) rules: PathBuf,
    /// Only keep rules relevant for this predicate (may be given multiple times)
    #[arg(short, long = "target")]
    pub(crate) targets: Vec<String>,
    /// When to filter rules by the target predicates
    #[arg(long = "filter", value_enum, default_value_t)]
    pub(crate) filter: FilterStage,
    /// Arguments related to the saturation
    #[command(flatten)]
    pub(crate) saturation: SaturationArgs,
    /// Arguments related to output
    #[command(flatten)]
    pub(crate) output: OutputArgs,
    /// Control amount of reporting printed by the program
    #[arg(long = "report", value_enum, default_value_t)]
    pub(crate) reporting: Reporting,
    /// Arguments related to logging
    #[command(flatten)]
    pub(crate) logging: LoggingArgs,
}
