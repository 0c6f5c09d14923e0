//! This module implements filtering rules by the predicates they can contribute to.
//!
//! A rule is relevant for a set of target predicates if one of its head predicates
//! is reachable from a target in the graph with an edge from each head predicate
//! to each body predicate of every rule.

use std::collections::HashSet;

use petgraph::{
    graphmap::{DiGraphMap, NodeTrait},
    visit::Dfs,
};

use crate::model::{Atom, RawAtom, RawRule, RuleSet};

/// Graph of the dependencies between predicates
#[derive(Debug)]
pub struct DependencyFilter<Node: NodeTrait> {
    graph: DiGraphMap<Node, ()>,
}

impl<Node: NodeTrait> Default for DependencyFilter<Node> {
    fn default() -> Self {
        Self {
            graph: DiGraphMap::new(),
        }
    }
}

impl<Node: NodeTrait> DependencyFilter<Node> {
    /// Create a new empty [DependencyFilter].
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the dependencies of a rule with the given head and body predicates.
    pub fn add_rule<Heads, Bodies>(&mut self, heads: Heads, bodies: Bodies)
    where
        Heads: IntoIterator<Item = Node>,
        Bodies: IntoIterator<Item = Node>,
    {
        let bodies: Vec<Node> = bodies.into_iter().collect();

        for head in heads {
            self.graph.add_node(head);

            for &body in &bodies {
                self.graph.add_edge(head, body, ());
            }
        }
    }

    /// Return all predicates some target depends on, including the targets themselves.
    ///
    /// Targets that do not occur in any rule are ignored.
    pub fn reachable<Targets>(&self, targets: Targets) -> HashSet<Node>
    where
        Targets: IntoIterator<Item = Node>,
    {
        let mut result = HashSet::new();

        for target in targets {
            if !self.graph.contains_node(target) || result.contains(&target) {
                continue;
            }

            let mut dfs = Dfs::new(&self.graph, target);
            while let Some(node) = dfs.next(&self.graph) {
                result.insert(node);
            }
        }

        result
    }
}

/// Keep only the raw rules relevant for the given target predicates.
pub fn filter_raw_rules(rules: Vec<RawRule>, targets: &[&str]) -> Vec<RawRule> {
    let keep: Vec<bool> = {
        let mut filter = DependencyFilter::new();
        for rule in &rules {
            filter.add_rule(
                rule.head().iter().map(RawAtom::predicate),
                rule.body().iter().map(RawAtom::predicate),
            );
        }

        let relevant = filter.reachable(targets.iter().copied());
        rules
            .iter()
            .map(|rule| {
                rule.head()
                    .iter()
                    .any(|atom| relevant.contains(atom.predicate()))
            })
            .collect()
    };

    let total = rules.len();
    let result: Vec<RawRule> = rules
        .into_iter()
        .zip(keep)
        .filter_map(|(rule, keep)| keep.then_some(rule))
        .collect();

    log::debug!("Kept {} of {total} rules relevant for {targets:?}", result.len());

    result
}

/// Keep only the rules of `rules` relevant for the given target predicates.
pub fn filter_rule_set(mut rules: RuleSet, targets: &[&str]) -> RuleSet {
    let mut filter = DependencyFilter::new();
    for rule in rules.iter() {
        filter.add_rule(
            rule.head().iter().map(Atom::predicate),
            rule.body().iter().map(Atom::predicate),
        );
    }

    let targets = targets
        .iter()
        .filter_map(|name| rules.symbols().lookup_predicate(name));
    let relevant = filter.reachable(targets);

    let total = rules.len();
    rules.retain(|rule| {
        rule.head()
            .iter()
            .any(|atom| relevant.contains(&atom.predicate()))
    });

    log::debug!("Kept {} of {total} saturated rules", rules.len());

    rules
}
