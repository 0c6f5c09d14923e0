/*!
  Binary for the CLI of gsat
*/

#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences
)]

pub mod cli;
pub mod error;

use std::path::Path;

use clap::Parser;
use cli::{CliApp, Reporting};
use colored::Colorize;
use error::CliError;
use gsat::{
    filter::{filter_raw_rules, filter_rule_set},
    meta::timing::{Stopwatch, TimedCode, TimedSorting},
    model::RuleSet,
    parser::read_rules,
    saturate_with,
    saturation::SaturationStatus,
    statistics::{SaturationPhase, Statistics, StatisticsEvent},
};

fn print_finished_message(statistics: &Statistics, status: SaturationStatus) {
    let overall_time = TimedCode::instance().total().system_time().as_millis();
    let phases = [
        ("Normalization:", SaturationPhase::Normalization),
        ("Evolve:", SaturationPhase::Evolve),
        ("Subsumption:", SaturationPhase::Subsumption),
    ];

    let times: Vec<u128> = phases
        .iter()
        .map(|(_, phase)| statistics.duration(*phase).as_millis())
        .collect();
    let max_string_len = times
        .iter()
        .map(|time| time.to_string().len())
        .max()
        .unwrap_or(1)
        + 2; // for the unit ms

    let outcome = match status {
        SaturationStatus::Complete => "completed".green().bold(),
        SaturationStatus::Interrupted => "interrupted".yellow().bold(),
    };

    println!(
        "Saturation {} in {}{}. Derived {} full rules from {} input rules.",
        outcome,
        overall_time.to_string().green().bold(),
        "ms".green().bold(),
        statistics
            .get(StatisticsEvent::OutputRules)
            .to_string()
            .green()
            .bold(),
        statistics.get(StatisticsEvent::InputRules),
    );

    for ((label, _), time) in phases.iter().zip(times) {
        println!("   {0: <14} {1:>max_string_len$}ms", label, time);
    }
}

fn write_file(path: &Path, content: &str, overwrite: bool) -> Result<(), CliError> {
    if !overwrite && path.exists() {
        return Err(CliError::OutputExists {
            filename: path.to_path_buf(),
        });
    }

    std::fs::write(path, content).map_err(|error| CliError::Writing {
        error,
        filename: path.to_path_buf(),
    })
}

fn run(cli: CliApp) -> Result<(), CliError> {
    let overall = Stopwatch::start();
    let reading = Stopwatch::start();

    log::info!("Parsing rules ...");

    let mut rules = read_rules(&cli.rules)?;
    let targets: Vec<&str> = cli.targets.iter().map(String::as_str).collect();

    if !targets.is_empty() && cli.filter.before() {
        rules = filter_raw_rules(rules, &targets);
    }

    log::info!("Rules parsed");
    TimedCode::instance().sub("Reading").record(reading.stop());

    let mut statistics = Statistics::new();
    let result = saturate_with(&rules, &cli.saturation.parameters(), &mut statistics)?;

    if result.status == SaturationStatus::Interrupted {
        log::warn!("Saturation was interrupted; the resulting rules may be incomplete");
    }

    let mut saturated: RuleSet = result.rules;
    if !targets.is_empty() && cli.filter.after() {
        saturated = filter_rule_set(saturated, &targets);
    }

    let writing = Stopwatch::start();
    match &cli.output.output {
        Some(path) => write_file(path, &saturated.to_string(), cli.output.overwrite)?,
        None => print!("{saturated}"),
    }

    if let Some(path) = &cli.output.statistics {
        let json = serde_json::to_string_pretty(&statistics)?;
        write_file(path, &json, cli.output.overwrite)?;
    }
    TimedCode::instance().sub("Output").record(writing.stop());

    TimedCode::instance().record(overall.stop());

    let report = match cli.reporting {
        Reporting::None => false,
        Reporting::Auto => cli.output.output.is_some(),
        Reporting::Short | Reporting::Time => true,
    };

    if report {
        print_finished_message(&statistics, result.status);
    }

    if cli.reporting == Reporting::Time {
        println!(
            "\n{}",
            TimedCode::instance().create_tree_string("gsat", TimedSorting::LongestThreadTime)
        );
    }

    Ok(())
}

fn main() {
    let cli = CliApp::parse();

    cli.logging.initialize_logging();
    log::info!("Version: {}", clap::crate_version!());
    log::debug!("Rule file: {:?}", cli.rules);

    run(cli).unwrap_or_else(|err| {
        log::error!("{} {err}", "error:".red().bold());
        std::process::exit(1)
    })
}
