//! Code for timing the phases of the saturation
//!
//! Measurements are taken with a [Stopwatch] and recorded into a tree of [TimedCode] blocks.
//! The global tree is available through [TimedCode::instance].

use std::{
    cmp::Reverse,
    ops::AddAssign,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use ascii_tree::{write_tree, Tree};
use cpu_time::{ProcessTime, ThreadTime};
use linked_hash_map::LinkedHashMap;
use once_cell::sync::Lazy;

/// Global instance of the [TimedCode]
static TIMECODE_INSTANCE: Lazy<Mutex<TimedCode>> = Lazy::new(|| Mutex::new(TimedCode::new()));

/// Times spent in a block of code
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    system: Duration,
    process: Duration,
    thread: Duration,
}

impl Measurement {
    /// Return the elapsed wall-clock time.
    pub fn system_time(&self) -> Duration {
        self.system
    }

    /// Return the CPU time used by the whole process.
    pub fn process_time(&self) -> Duration {
        self.process
    }

    /// Return the CPU time used by the measuring thread.
    pub fn thread_time(&self) -> Duration {
        self.thread
    }
}

impl AddAssign for Measurement {
    fn add_assign(&mut self, other: Self) {
        self.system += other.system;
        self.process += other.process;
        self.thread += other.thread;
    }
}

/// A running measurement
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    system: Instant,
    process: Duration,
    thread: Duration,
}

impl Stopwatch {
    /// Start a new measurement.
    pub fn start() -> Self {
        Self {
            system: Instant::now(),
            process: ProcessTime::now().as_duration(),
            thread: ThreadTime::now().as_duration(),
        }
    }

    /// Return the times elapsed since the measurement was started.
    pub fn stop(self) -> Measurement {
        Measurement {
            system: self.system.elapsed(),
            process: ProcessTime::now().as_duration().saturating_sub(self.process),
            thread: ThreadTime::now().as_duration().saturating_sub(self.thread),
        }
    }
}

/// How to sort the blocks of each layer of a [TimedCode] tree
#[derive(Debug, Copy, Clone, Default)]
pub enum TimedSorting {
    /// The order the blocks were first recorded in
    #[default]
    Default,
    /// Alphabetical by the title of the block
    Alphabetical,
    /// Show the blocks which took longest first
    LongestThreadTime,
}

/// Accumulated timings of a block of code and its subblocks
#[derive(Debug, Default, Clone)]
pub struct TimedCode {
    total: Measurement,
    runs: u64,
    subblocks: LinkedHashMap<String, TimedCode>,
}

impl TimedCode {
    /// Create new [TimedCode] object
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the global instance
    pub fn instance() -> MutexGuard<'static, TimedCode> {
        TIMECODE_INSTANCE
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Navigate to a subblock (use forward slash to go multiple layers at once)
    pub fn sub(&mut self, name: &str) -> &mut TimedCode {
        let mut current_block = self;
        for part in name.split('/') {
            current_block = current_block
                .subblocks
                .entry(part.to_string())
                .or_default();
        }

        current_block
    }

    /// Add a finished measurement to this block.
    pub fn record(&mut self, measurement: Measurement) {
        self.total += measurement;
        self.runs += 1;
    }

    /// Reset the current node, remove all subnodes
    pub fn reset(&mut self) {
        self.total = Measurement::default();
        self.runs = 0;
        self.subblocks.clear();
    }

    /// Return the accumulated times of this block.
    pub fn total(&self) -> Measurement {
        self.total
    }

    /// Return how many measurements were recorded for this block.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Return an iterator through the sub-nodes
    pub fn sub_nodes(&self) -> impl Iterator<Item = (&str, &TimedCode)> {
        self.subblocks
            .iter()
            .map(|(name, block)| (name.as_str(), block))
    }

    /// Turns e.g. (Evolve, 64.2355, 1234, 56) into "Evolve [64.2%, 1234ms, 56x]"
    fn format_title(title: &str, percentage: f64, msecs: u128, runs: u64) -> String {
        format!("{title} [{percentage:.1}%, {msecs}ms, {runs}x]")
    }

    fn create_tree_recursive(&self, title: String, sorting: TimedSorting) -> Tree {
        let mut blocks: Vec<(&str, &TimedCode)> = self.sub_nodes().collect();
        match sorting {
            TimedSorting::Default => {}
            TimedSorting::Alphabetical => blocks.sort_by_key(|(name, _)| *name),
            TimedSorting::LongestThreadTime => {
                blocks.sort_by_key(|(_, block)| Reverse(block.total.thread))
            }
        }

        let subnodes: Vec<Tree> = blocks
            .into_iter()
            .map(|(name, block)| {
                let percentage = if self.total.thread > Duration::ZERO {
                    100.0 * block.total.thread.as_secs_f64() / self.total.thread.as_secs_f64()
                } else {
                    0.0
                };

                block.create_tree_recursive(
                    Self::format_title(
                        name,
                        percentage,
                        block.total.thread.as_millis(),
                        block.runs,
                    ),
                    sorting,
                )
            })
            .collect();

        if subnodes.is_empty() {
            Tree::Leaf(vec![title])
        } else {
            Tree::Node(title, subnodes)
        }
    }

    /// Creates an ASCII tree
    pub fn create_tree(&self, title: &str, sorting: TimedSorting) -> Tree {
        let title = format!(
            "{title} [system/process/thread (ms): {}/{}/{}]",
            self.total.system.as_millis(),
            self.total.process.as_millis(),
            self.total.thread.as_millis()
        );

        self.create_tree_recursive(title, sorting)
    }

    /// Creates an ASCII tree and converts it to a string representation
    pub fn create_tree_string(&self, title: &str, sorting: TimedSorting) -> String {
        let tree = self.create_tree(title, sorting);

        let mut output = String::new();
        if write_tree(&mut output, &tree).is_err() {
            log::warn!("failed to render the timing tree");
        }

        output
    }
}
