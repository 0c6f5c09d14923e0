//! This module defines the observations emitted by the saturation
//! and [Statistics], a sink collecting them.

use std::{collections::BTreeMap, fmt, time::Duration};

use serde::{Serialize, Serializer};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Countable events of the saturation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatisticsEvent {
    /// Raw rules given to the saturation
    InputRules,
    /// Full rules obtained by normalizing the input
    InputFullRules,
    /// Non-full rules obtained by normalizing the input
    InputNonFullRules,
    /// Rules taken from the worklist
    ProcessedRules,
    /// Pairs of a non-full and a full rule that were evolved
    EvolveAttempts,
    /// Rules derived by evolving
    EvolveDerivations,
    /// Derived rules that were equal to one of their parents
    EvolveStoppedBecauseEqual,
    /// Evolve attempts without any derived rule
    HyperresolutionFailures,
    /// Derived rules whose head is contained in their body
    DiscardedTautologies,
    /// Derived rules subsumed by a stored rule
    ForwardSubsumed,
    /// Stored rules removed because a new rule subsumes them
    BackwardSubsumed,
    /// Full rules added to the working set
    AdmittedFullRules,
    /// Non-full rules added to the working set
    AdmittedNonFullRules,
    /// Full rules in the result
    OutputRules,
}

/// Timed phases of the saturation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SaturationPhase {
    /// Translating the input into skolemized rules
    Normalization,
    /// Deriving new rules by hyperresolution
    Evolve,
    /// Tautology and subsumption checks
    Subsumption,
}

/// Receiver of the observations made during the saturation
pub trait StatisticsSink {
    /// Count `amount` occurrences of `event`.
    fn count(&mut self, event: StatisticsEvent, amount: usize);

    /// Record time spent in `phase`.
    fn record_duration(&mut self, phase: SaturationPhase, duration: Duration);
}

/// Sink discarding all observations
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStatistics;

impl StatisticsSink for NoStatistics {
    fn count(&mut self, _event: StatisticsEvent, _amount: usize) {}

    fn record_duration(&mut self, _phase: SaturationPhase, _duration: Duration) {}
}

/// In-memory sink summing up all observations
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    counters: BTreeMap<StatisticsEvent, usize>,
    #[serde(rename = "durations_ms", serialize_with = "serialize_durations")]
    durations: BTreeMap<SaturationPhase, Duration>,
}

fn serialize_durations<S: Serializer>(
    durations: &BTreeMap<SaturationPhase, Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(
        durations
            .iter()
            .map(|(phase, duration)| (phase, duration.as_secs_f64() * 1000.0)),
    )
}

impl Statistics {
    /// Create a new empty [Statistics] object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return how often `event` was counted.
    pub fn get(&self, event: StatisticsEvent) -> usize {
        self.counters.get(&event).copied().unwrap_or(0)
    }

    /// Return the total time spent in `phase`.
    pub fn duration(&self, phase: SaturationPhase) -> Duration {
        self.durations.get(&phase).copied().unwrap_or_default()
    }
}

impl StatisticsSink for Statistics {
    fn count(&mut self, event: StatisticsEvent, amount: usize) {
        *self.counters.entry(event).or_default() += amount;
    }

    fn record_duration(&mut self, phase: SaturationPhase, duration: Duration) {
        *self.durations.entry(phase).or_default() += duration;
    }
}

impl<Sink: StatisticsSink + ?Sized> StatisticsSink for &mut Sink {
    fn count(&mut self, event: StatisticsEvent, amount: usize) {
        (**self).count(event, amount)
    }

    fn record_duration(&mut self, phase: SaturationPhase, duration: Duration) {
        (**self).record_duration(phase, duration)
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = StatisticsEvent::iter()
            .map(|event| event.to_string().len())
            .chain(SaturationPhase::iter().map(|phase| phase.to_string().len() + 3))
            .max()
            .unwrap_or(0);

        for event in StatisticsEvent::iter() {
            writeln!(f, "{:<width$} {}", event.to_string(), self.get(event))?;
        }
        for phase in SaturationPhase::iter() {
            writeln!(
                f,
                "{:<width$} {}",
                format!("{phase}_ms"),
                self.duration(phase).as_millis()
            )?;
        }

        Ok(())
    }
}
