//! This module defines [Saturation], the fixpoint loop of the saturation,
//! and the entry points [saturate] and [saturate_with].

use std::{
    borrow::Borrow,
    collections::{HashMap, HashSet, VecDeque},
    time::Instant,
};

use crate::{
    error::Error,
    index::UnificationIndex,
    logic::normalization::normalize_all,
    meta::timing::{Stopwatch, TimedCode},
    model::{RawRule, Rule, RuleKind, RuleSet, SymbolTable},
    statistics::{NoStatistics, SaturationPhase, Statistics, StatisticsEvent, StatisticsSink},
};

use super::{
    evolve::{evolve, Evolution},
    parameters::{ProcessingOrder, SaturationParameters},
    subsumption::{condense, SubsumptionIndex},
};

/// Position of a rule in the working set
pub(crate) type RuleId = usize;

/// Whether a stored rule still has to be combined with the other stored rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleStatus {
    /// Waiting in the worklist
    Pending,
    /// Combined with all processed rules of the other kind
    Processed,
}

#[derive(Debug)]
struct StoredRule {
    rule: Rule,
    status: RuleStatus,
}

/// How the saturation loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaturationStatus {
    /// The worklist ran empty; the stored full rules are complete
    Complete,
    /// A step or time limit was reached; the stored full rules are sound but may be incomplete
    Interrupted,
}

/// State of the saturation of a set of skolemized rules
///
/// Every rule that enters the working set is put on a single worklist.
/// Taking a non-full rule from the worklist evolves it with all processed full rules,
/// taking a full rule evolves all processed non-full rules with it.
/// Hence every pair of a non-full and a full rule in the working set is evolved exactly once.
/// Derived rules only enter the working set if they are neither tautologies
/// nor subsumed by a stored rule of the same kind,
/// and they evict all stored rules of the same kind they subsume.
#[derive(Debug)]
pub struct Saturation<Sink: StatisticsSink = Statistics> {
    parameters: SaturationParameters,

    /// Working set; evicted rules leave a hole
    rules: Vec<Option<StoredRule>>,
    /// Stored rules by their canonical form
    known: HashMap<Rule, RuleId>,
    worklist: VecDeque<RuleId>,

    /// Body atoms of full rules
    full_bodies: UnificationIndex<RuleId>,
    /// Head atoms of full rules
    full_heads: SubsumptionIndex,
    /// Head atoms of non-full rules
    non_full_heads: SubsumptionIndex,

    sink: Sink,
}

impl Saturation<Statistics> {
    /// Create a new [Saturation] collecting [Statistics].
    pub fn new(parameters: SaturationParameters) -> Self {
        Self::with_sink(parameters, Statistics::new())
    }
}

impl<Sink: StatisticsSink> Saturation<Sink> {
    /// Create a new [Saturation] reporting to the given sink.
    pub fn with_sink(parameters: SaturationParameters, sink: Sink) -> Self {
        Self {
            parameters,
            rules: Vec::new(),
            known: HashMap::new(),
            worklist: VecDeque::new(),
            full_bodies: UnificationIndex::new(),
            full_heads: SubsumptionIndex::default(),
            non_full_heads: SubsumptionIndex::default(),
            sink,
        }
    }

    /// Return the statistics sink.
    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Return the statistics sink, consuming this object.
    pub fn into_sink(self) -> Sink {
        self.sink
    }

    /// Add rules to the working set.
    ///
    /// The rules are filtered like derived rules.
    pub fn add_rules<Rules: IntoIterator<Item = Rule>>(&mut self, rules: Rules) {
        let stopwatch = Stopwatch::start();

        for rule in rules {
            self.admit(rule);
        }

        self.record(SaturationPhase::Subsumption, stopwatch);
    }

    /// Return the full rules of the working set.
    pub fn full_rules(&self) -> Vec<Rule> {
        self.stored_rules(RuleKind::Full)
    }

    /// Return the non-full rules of the working set.
    pub fn non_full_rules(&self) -> Vec<Rule> {
        self.stored_rules(RuleKind::NonFull)
    }

    /// Return the number of rules waiting in the worklist.
    pub fn pending(&self) -> usize {
        self.worklist
            .iter()
            .filter(|&&id| self.status(id) == Some(RuleStatus::Pending))
            .count()
    }

    /// Run the saturation loop until the worklist is empty or a limit is reached.
    ///
    /// Limits are checked before each step, so the working set is always
    /// left in the state after a complete step.
    /// Calling this method again after an interruption continues the saturation.
    pub fn run(&mut self) -> SaturationStatus {
        let started = Instant::now();
        let stopwatch = Stopwatch::start();
        let mut steps = 0;

        log::info!(
            "Saturating {} full and {} non-full rules",
            self.count_stored(RuleKind::Full),
            self.count_stored(RuleKind::NonFull)
        );

        let status = loop {
            let Some(id) = self.next_pending() else {
                break SaturationStatus::Complete;
            };

            let step_limit_reached = self
                .parameters
                .step_limit
                .is_some_and(|limit| steps >= limit);
            let time_limit_reached = self
                .parameters
                .time_limit
                .is_some_and(|limit| started.elapsed() >= limit);

            if step_limit_reached || time_limit_reached {
                self.return_pending(id);
                log::warn!("Saturation interrupted after {steps} steps");
                break SaturationStatus::Interrupted;
            }

            steps += 1;
            self.process(id);
        };

        TimedCode::instance()
            .sub("Saturation/Loop")
            .record(stopwatch.stop());

        log::info!(
            "Saturation finished after {steps} steps with {} full and {} non-full rules",
            self.count_stored(RuleKind::Full),
            self.count_stored(RuleKind::NonFull)
        );

        status
    }

    fn stored_rules(&self, kind: RuleKind) -> Vec<Rule> {
        self.rules
            .iter()
            .flatten()
            .filter(|stored| stored.rule.kind() == kind)
            .map(|stored| stored.rule.clone())
            .collect()
    }

    fn count_stored(&self, kind: RuleKind) -> usize {
        self.rules
            .iter()
            .flatten()
            .filter(|stored| stored.rule.kind() == kind)
            .count()
    }

    fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id)?.as_ref().map(|stored| &stored.rule)
    }

    fn status(&self, id: RuleId) -> Option<RuleStatus> {
        self.rules.get(id)?.as_ref().map(|stored| stored.status)
    }

    /// Take the next rule from the worklist, skipping evicted rules.
    fn next_pending(&mut self) -> Option<RuleId> {
        loop {
            let id = match self.parameters.order {
                ProcessingOrder::Fifo => self.worklist.pop_front(),
                ProcessingOrder::Lifo => self.worklist.pop_back(),
            }?;

            if self.status(id) == Some(RuleStatus::Pending) {
                return Some(id);
            }
        }
    }

    /// Undo [Saturation::next_pending].
    fn return_pending(&mut self, id: RuleId) {
        match self.parameters.order {
            ProcessingOrder::Fifo => self.worklist.push_front(id),
            ProcessingOrder::Lifo => self.worklist.push_back(id),
        }
    }

    fn record(&mut self, phase: SaturationPhase, stopwatch: Stopwatch) {
        let measurement = stopwatch.stop();

        let path = match phase {
            SaturationPhase::Normalization => "Saturation/Normalization",
            SaturationPhase::Evolve => "Saturation/Evolve",
            SaturationPhase::Subsumption => "Saturation/Subsumption",
        };
        TimedCode::instance().sub(path).record(measurement);

        self.sink
            .record_duration(phase, measurement.system_time());
    }

    /// Evolve the rule `id` with all processed rules of the other kind
    /// and admit the derived rules.
    fn process(&mut self, id: RuleId) {
        let Some(stored) = self.rules.get_mut(id).and_then(Option::as_mut) else {
            return;
        };
        stored.status = RuleStatus::Processed;
        let rule = stored.rule.clone();

        self.sink.count(StatisticsEvent::ProcessedRules, 1);
        log::trace!("Processing rule {id}");

        let stopwatch = Stopwatch::start();
        let partners = self.partners(&rule);
        let mut derived = Vec::new();

        for partner in partners {
            let Some(partner_rule) = self.rule(partner) else {
                continue;
            };

            let evolution = match rule.kind() {
                RuleKind::NonFull => evolve(&rule, partner_rule),
                RuleKind::Full => evolve(partner_rule, &rule),
            };
            self.count_evolution(&evolution);

            derived.extend(evolution.into_derived());
        }
        self.record(SaturationPhase::Evolve, stopwatch);

        let stopwatch = Stopwatch::start();
        for rule in derived {
            self.admit(rule);
        }
        self.record(SaturationPhase::Subsumption, stopwatch);
    }

    /// Return the processed rules of the other kind that `rule` can be evolved with.
    fn partners(&self, rule: &Rule) -> Vec<RuleId> {
        let mut seen = HashSet::new();

        let candidates: Vec<RuleId> = match rule.kind() {
            // a Skolem atom of the non-full rule has to be resolved
            RuleKind::NonFull => rule
                .head()
                .iter()
                .filter(|atom| atom.contains_function())
                .flat_map(|atom| self.full_bodies.get(atom))
                .collect(),
            RuleKind::Full => rule
                .body()
                .iter()
                .flat_map(|atom| self.non_full_heads.candidates(atom))
                .collect(),
        };

        candidates
            .into_iter()
            .filter(|id| seen.insert(*id))
            .filter(|&id| self.status(id) == Some(RuleStatus::Processed))
            .collect()
    }

    fn count_evolution(&mut self, evolution: &Evolution) {
        self.sink.count(StatisticsEvent::EvolveAttempts, 1);
        self.sink
            .count(StatisticsEvent::EvolveDerivations, evolution.derived().len());
        self.sink.count(
            StatisticsEvent::EvolveStoppedBecauseEqual,
            evolution.equal_to_parent(),
        );

        if evolution.is_failure() {
            self.sink.count(StatisticsEvent::HyperresolutionFailures, 1);
        }
    }

    fn subsumption_index(&self, kind: RuleKind) -> &SubsumptionIndex {
        match kind {
            RuleKind::Full => &self.full_heads,
            RuleKind::NonFull => &self.non_full_heads,
        }
    }

    /// Add `rule` to the working set unless it is redundant.
    ///
    /// Returns whether the rule was added.
    fn admit(&mut self, rule: Rule) -> bool {
        if rule.is_tautology() {
            self.sink.count(StatisticsEvent::DiscardedTautologies, 1);
            log::trace!("Discarding tautology");
            return false;
        }

        let rule = condense(&rule);

        if self.known.contains_key(&rule) {
            self.sink.count(StatisticsEvent::ForwardSubsumed, 1);
            log::trace!("Discarding known rule");
            return false;
        }

        let subsumption = {
            let lookup = |id: RuleId| self.rule(id);
            let index = self.subsumption_index(rule.kind());

            match index.find_subsuming(&rule, lookup) {
                Some(subsuming) => Err(subsuming),
                None => Ok(index.find_subsumed(&rule, lookup)),
            }
        };

        let subsumed = match subsumption {
            Ok(subsumed) => subsumed,
            Err(subsuming) => {
                self.sink.count(StatisticsEvent::ForwardSubsumed, 1);
                log::trace!("Discarding rule subsumed by rule {subsuming}");
                return false;
            }
        };

        for id in subsumed {
            self.evict(id);
        }

        self.insert(rule);
        true
    }

    fn insert(&mut self, rule: Rule) {
        let id = self.rules.len();

        match rule.kind() {
            RuleKind::Full => {
                for atom in rule.body() {
                    self.full_bodies.put(atom.clone(), id);
                }
                self.full_heads.insert(id, &rule);
                self.sink.count(StatisticsEvent::AdmittedFullRules, 1);
            }
            RuleKind::NonFull => {
                self.non_full_heads.insert(id, &rule);
                self.sink.count(StatisticsEvent::AdmittedNonFullRules, 1);
            }
        }

        log::debug!("Admitted rule {id}");

        self.known.insert(rule.clone(), id);
        self.rules.push(Some(StoredRule {
            rule,
            status: RuleStatus::Pending,
        }));
        self.worklist.push_back(id);
    }

    fn evict(&mut self, id: RuleId) {
        let Some(StoredRule { rule, .. }) = self.rules.get_mut(id).and_then(Option::take) else {
            return;
        };

        match rule.kind() {
            RuleKind::Full => {
                for atom in rule.body() {
                    self.full_bodies.remove(atom, &id);
                }
                self.full_heads.remove(id, &rule);
            }
            RuleKind::NonFull => self.non_full_heads.remove(id, &rule),
        }
        self.known.remove(&rule);

        self.sink.count(StatisticsEvent::BackwardSubsumed, 1);
        log::debug!("Evicted rule {id}");
    }
}

/// Result of [saturate_with]
#[derive(Debug)]
pub struct SaturationResult {
    /// The full rules obtained by the saturation
    pub rules: RuleSet,
    /// Whether the saturation ran to completion
    pub status: SaturationStatus,
}

/// Saturate a set of rules, i.e. compute a set of full rules that,
/// over any database, entails the same facts as the input rules.
///
/// Fails if one of the input rules is malformed.
pub fn saturate<Rules>(rules: Rules) -> Result<RuleSet, Error>
where
    Rules: IntoIterator,
    Rules::Item: Borrow<RawRule>,
{
    saturate_with(rules, &SaturationParameters::default(), &mut NoStatistics)
        .map(|result| result.rules)
}

/// Saturate a set of rules like [saturate],
/// respecting the given parameters and reporting to the given statistics sink.
///
/// All input rules are normalized before the saturation starts,
/// so a malformed rule is reported before any work is done.
pub fn saturate_with<Rules, Sink>(
    rules: Rules,
    parameters: &SaturationParameters,
    sink: &mut Sink,
) -> Result<SaturationResult, Error>
where
    Rules: IntoIterator,
    Rules::Item: Borrow<RawRule>,
    Sink: StatisticsSink,
{
    let total = Stopwatch::start();
    let stopwatch = Stopwatch::start();

    let raw: Vec<Rules::Item> = rules.into_iter().collect();
    let mut symbols = SymbolTable::new();
    let normalized = normalize_all(
        raw.iter().map(<Rules::Item as Borrow<RawRule>>::borrow),
        &mut symbols,
    )?;

    let full = normalized.iter().filter(|rule| rule.is_full()).count();
    sink.count(StatisticsEvent::InputRules, raw.len());
    sink.count(StatisticsEvent::InputFullRules, full);
    sink.count(StatisticsEvent::InputNonFullRules, normalized.len() - full);

    let measurement = stopwatch.stop();
    TimedCode::instance()
        .sub("Saturation/Normalization")
        .record(measurement);
    sink.record_duration(SaturationPhase::Normalization, measurement.system_time());
    log::info!(
        "Normalized {} rules into {} full and {} non-full rules",
        raw.len(),
        full,
        normalized.len() - full
    );

    let mut saturation = Saturation::with_sink(*parameters, &mut *sink);
    saturation.add_rules(normalized);
    let status = saturation.run();
    let full_rules = saturation.full_rules();

    sink.count(StatisticsEvent::OutputRules, full_rules.len());
    TimedCode::instance().sub("Saturation").record(total.stop());

    Ok(SaturationResult {
        rules: RuleSet::new(symbols, full_rules),
        status,
    })
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use test_log::test;

    use crate::{
        logic::normalization::normalize_all,
        model::{RuleKind, RuleSet, SymbolTable},
        parser::parse_rules,
        saturation::parameters::{ProcessingOrder, SaturationParameters},
        statistics::{Statistics, StatisticsEvent},
    };

    use super::{saturate_with, Saturation, SaturationStatus};

    fn saturated(
        program: &str,
        parameters: SaturationParameters,
    ) -> (RuleSet, SaturationStatus, Statistics) {
        let rules = parse_rules(program).unwrap();
        let mut statistics = Statistics::new();

        let result = saturate_with(&rules, &parameters, &mut statistics).unwrap();
        (result.rules, result.status, statistics)
    }

    fn printed(rules: &RuleSet) -> Vec<String> {
        let mut printed: Vec<String> = rules.to_string().lines().map(String::from).collect();
        printed.sort();
        printed
    }

    #[test]
    fn existential_is_pushed_through() {
        let (rules, status, statistics) = saturated(
            "S(?x) :- R(?x) .
             T(?x, !y) :- S(?x) .
             U(?x) :- T(?x, ?y) .",
            SaturationParameters::default(),
        );

        assert_eq!(status, SaturationStatus::Complete);
        // `U :- R` is entailed through `U :- S` and `S :- R` rather than stored
        assert_eq!(
            printed(&rules),
            vec![
                "S(?x0) :- R(?x0) .",
                "U(?x0) :- S(?x0) .",
                "U(?x0) :- T(?x0, ?x1) .",
            ]
        );
        assert_eq!(statistics.get(StatisticsEvent::InputRules), 3);
        assert_eq!(statistics.get(StatisticsEvent::InputNonFullRules), 1);
        assert_eq!(statistics.get(StatisticsEvent::OutputRules), 3);
        assert_eq!(statistics.get(StatisticsEvent::EvolveDerivations), 1);
    }

    #[test]
    fn full_rules_derived_later_are_used() {
        // the non-full rule is processed before the full rule for B is derived
        let (rules, _, _) = saturated(
            "R(?x, !y) :- A(?x) .
             B(?y) :- R(?x, ?y) .
             C(?x) :- R(?x, ?y), B(?y) .",
            SaturationParameters::default(),
        );

        assert!(printed(&rules).contains(&"C(?x0) :- A(?x0) .".to_string()));
    }

    #[test]
    fn tautologies_and_subsumed_rules_are_removed() {
        let (rules, _, statistics) = saturated(
            "S(?x) :- S(?x), P(?x) .
             S(?x) :- R(?x, ?y) .
             S(?x) :- R(?x, ?y), Q(?y) .
             S(?x) :- R(?x, ?x) .",
            SaturationParameters::default(),
        );

        assert_eq!(printed(&rules), vec!["S(?x0) :- R(?x0, ?x1) ."]);
        assert_eq!(statistics.get(StatisticsEvent::DiscardedTautologies), 1);
        assert_eq!(statistics.get(StatisticsEvent::ForwardSubsumed), 2);
    }

    #[test]
    fn backward_subsumption_evicts() {
        let (rules, _, statistics) = saturated(
            "S(?x) :- R(?x, ?y), Q(?y) .
             S(?x) :- R(?x, ?y) .",
            SaturationParameters::default(),
        );

        assert_eq!(printed(&rules), vec!["S(?x0) :- R(?x0, ?x1) ."]);
        assert_eq!(statistics.get(StatisticsEvent::BackwardSubsumed), 1);
    }

    #[test]
    fn step_limit_interrupts() {
        let program = "T(?x, !y) :- S(?x) .
                       U(?x) :- T(?x, ?y) .";

        let (_, status, statistics) =
            saturated(program, SaturationParameters::default().with_step_limit(1));
        assert_eq!(status, SaturationStatus::Interrupted);
        assert_eq!(statistics.get(StatisticsEvent::ProcessedRules), 1);

        let (rules, status, _) =
            saturated(program, SaturationParameters::default().with_order(ProcessingOrder::Lifo));
        assert_eq!(status, SaturationStatus::Complete);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn time_limit_interrupts() {
        let program = "T(?x, !y) :- S(?x) .
                       U(?x) :- T(?x, ?y) .";

        let (rules, status, statistics) = saturated(
            program,
            SaturationParameters::default().with_time_limit(Duration::ZERO),
        );
        assert_eq!(status, SaturationStatus::Interrupted);
        assert_eq!(statistics.get(StatisticsEvent::ProcessedRules), 0);
        assert_eq!(printed(&rules), vec!["U(?x0) :- T(?x0, ?x1) ."]);

        let (rules, status, _) = saturated(
            program,
            SaturationParameters::default().with_time_limit(Duration::from_secs(60)),
        );
        assert_eq!(status, SaturationStatus::Complete);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn interrupted_saturation_can_be_resumed() {
        let mut symbols = SymbolTable::new();
        let rules = normalize_all(
            parse_rules(
                "T(?x, !y) :- S(?x) .
                 U(?x) :- T(?x, ?y) .",
            )
            .unwrap(),
            &mut symbols,
        )
        .unwrap();

        let mut saturation = Saturation::new(SaturationParameters::default().with_step_limit(0));
        saturation.add_rules(rules);
        assert_eq!(saturation.run(), SaturationStatus::Interrupted);
        assert_eq!(saturation.pending(), 2);
        assert_eq!(saturation.full_rules().len(), 1);

        saturation.parameters = SaturationParameters::default();
        assert_eq!(saturation.run(), SaturationStatus::Complete);
        assert_eq!(saturation.pending(), 0);
        assert_eq!(saturation.full_rules().len(), 2);
        assert_eq!(saturation.non_full_rules().len(), 1);
        assert_eq!(saturation.count_stored(RuleKind::Full), 2);
        assert_eq!(saturation.count_stored(RuleKind::NonFull), 1);
        // the derived full rule is processed as well
        assert_eq!(saturation.sink().get(StatisticsEvent::ProcessedRules), 3);
    }
}
