//! This module implements subsumption between rules.
//!
//! A rule `general` subsumes a rule `specific` if there is a substitution σ
//! mapping every body atom of `general` to a body atom of `specific`
//! such that every head atom of `specific` is the image under σ of a head atom of `general`.
//! Then every consequence of `specific` is also a consequence of `general`.

use std::collections::HashSet;

use crate::{
    index::UnificationIndex,
    logic::{substitution::Substitution, unification::match_atom},
    model::{Atom, Rule},
};

use super::engine::RuleId;

/// Return whether `general` subsumes `specific`.
pub fn subsumes(general: &Rule, specific: &Rule) -> bool {
    let body_predicates: HashSet<_> = specific.body().iter().map(Atom::predicate).collect();
    if !general
        .body()
        .iter()
        .all(|atom| body_predicates.contains(&atom.predicate()))
    {
        return false;
    }

    cover_head(general, specific.head(), specific.body(), &Substitution::new())
}

/// Find images for all `targets` among the head atoms of `general`, then map its body into `body`.
fn cover_head(
    general: &Rule,
    targets: &[Atom],
    body: &[Atom],
    substitution: &Substitution,
) -> bool {
    let Some((target, rest)) = targets.split_first() else {
        return map_atoms(general.body(), body, substitution);
    };

    general.head().iter().any(|pattern| {
        let mut extended = substitution.clone();
        match_atom(pattern, target, &mut extended) && cover_head(general, rest, body, &extended)
    })
}

/// Extend `substitution` so that every atom of `patterns` is mapped to some atom of `targets`.
fn map_atoms(patterns: &[Atom], targets: &[Atom], substitution: &Substitution) -> bool {
    let Some((pattern, rest)) = patterns.split_first() else {
        return true;
    };

    targets.iter().any(|target| {
        let mut extended = substitution.clone();
        match_atom(pattern, target, &mut extended) && map_atoms(rest, targets, &extended)
    })
}

/// Remove body atoms that are not needed to derive the head.
///
/// The result is subsumption-equivalent to `rule`,
/// so equivalent rules condense to alphabetic variants of each other.
pub fn condense(rule: &Rule) -> Rule {
    let mut current = rule.clone();
    let mut position = 0;

    while position < current.body().len() {
        let reduced_body = current
            .body()
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != position)
            .map(|(_, atom)| atom.clone());
        let reduced = Rule::new(reduced_body, current.head().to_vec());

        if subsumes(&current, &reduced) {
            current = reduced;
            position = 0;
        } else {
            position += 1;
        }
    }

    current
}

/// Index over the head atoms of a set of rules, used to find candidates for subsumption
#[derive(Debug, Default)]
pub(crate) struct SubsumptionIndex {
    heads: UnificationIndex<RuleId>,
}

impl SubsumptionIndex {
    pub(crate) fn insert(&mut self, id: RuleId, rule: &Rule) {
        for atom in rule.head() {
            self.heads.put(atom.clone(), id);
        }
    }

    pub(crate) fn remove(&mut self, id: RuleId, rule: &Rule) {
        for atom in rule.head() {
            self.heads.remove(atom, &id);
        }
    }

    /// Return the rules with a head atom unifying with `atom`.
    pub(crate) fn candidates(&self, atom: &Atom) -> Vec<RuleId> {
        self.heads.get(atom)
    }

    /// Return a stored rule subsuming `rule`.
    pub(crate) fn find_subsuming<'a, Lookup>(&self, rule: &Rule, lookup: Lookup) -> Option<RuleId>
    where
        Lookup: Fn(RuleId) -> Option<&'a Rule>,
    {
        // some head atom of a subsuming rule is mapped onto the first head atom of `rule`
        let first = rule.head().first()?;

        self.heads.get(first).into_iter().find(|&candidate| {
            lookup(candidate).is_some_and(|candidate| subsumes(candidate, rule))
        })
    }

    /// Return all stored rules subsumed by `rule`.
    pub(crate) fn find_subsumed<'a, Lookup>(&self, rule: &Rule, lookup: Lookup) -> Vec<RuleId>
    where
        Lookup: Fn(RuleId) -> Option<&'a Rule>,
    {
        let mut seen = HashSet::new();

        rule.head()
            .iter()
            .flat_map(|atom| self.heads.get(atom))
            .filter(|candidate| seen.insert(*candidate))
            .filter(|&candidate| {
                lookup(candidate).is_some_and(|candidate| candidate != rule && subsumes(rule, candidate))
            })
            .collect()
    }
}
