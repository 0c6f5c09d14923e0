//! This module implements the hyperresolution step of the saturation.

use std::collections::HashSet;

use crate::{
    logic::{substitution::Substitution, unification::unify_atoms_with},
    model::{Atom, Rule, RuleKind},
};

/// Result of evolving a non-full rule with a full rule
#[derive(Debug, Default)]
pub struct Evolution {
    derived: Vec<Rule>,
    equal_to_parent: usize,
}

impl Evolution {
    /// Return the derived rules, without duplicates.
    pub fn derived(&self) -> &[Rule] {
        &self.derived
    }

    /// Return the derived rules, consuming this object.
    pub fn into_derived(self) -> Vec<Rule> {
        self.derived
    }

    /// Return the number of derivations that were dropped because they equal one of the parents.
    pub fn equal_to_parent(&self) -> usize {
        self.equal_to_parent
    }

    /// Return whether no pairing of atoms led to a derivation.
    pub fn is_failure(&self) -> bool {
        self.derived.is_empty() && self.equal_to_parent == 0
    }
}

/// Choice made for one body atom of the full rule
#[derive(Debug, Clone, Copy)]
enum Pairing {
    /// Kept in the body of the derived rule
    Unmatched,
    /// Resolved with the head atom at the given position of the non-full rule
    Matched(usize),
}

/// Enumerates the pairings between the body of a full rule and the head of a non-full rule
#[derive(Debug)]
struct Evolver<'a> {
    non_full: &'a Rule,
    full: &'a Rule,
    /// The full rule with variables renamed apart from the non-full rule
    renamed: Rule,
    /// Positions of the head atoms of the non-full rule that may be paired with each body atom
    candidates: Vec<Vec<usize>>,

    seen: HashSet<Rule>,
    result: Evolution,
}

impl<'a> Evolver<'a> {
    fn new(non_full: &'a Rule, full: &'a Rule) -> Self {
        let renamed = full.shifted(non_full.variable_count());
        let candidates = renamed
            .body()
            .iter()
            .map(|body_atom| {
                non_full
                    .head()
                    .iter()
                    .enumerate()
                    .filter(|(_, head_atom)| {
                        head_atom.predicate() == body_atom.predicate()
                            && head_atom.arity() == body_atom.arity()
                    })
                    .map(|(position, _)| position)
                    .collect()
            })
            .collect();

        Self {
            non_full,
            full,
            renamed,
            candidates,
            seen: HashSet::new(),
            result: Evolution::default(),
        }
    }

    /// Decide the pairing of the body atom at `position` and all following ones.
    fn search(&mut self, position: usize, pairings: &mut Vec<Pairing>, unifier: &Substitution) {
        if position == self.candidates.len() {
            let resolves_skolem_atom = pairings.iter().any(|pairing| match pairing {
                Pairing::Matched(head) => self.non_full.head()[*head].contains_function(),
                Pairing::Unmatched => false,
            });

            if resolves_skolem_atom {
                self.derive(pairings, unifier);
            }

            return;
        }

        pairings.push(Pairing::Unmatched);
        self.search(position + 1, pairings, unifier);
        pairings.pop();

        for index in 0..self.candidates[position].len() {
            let head = self.candidates[position][index];

            let mut extended = unifier.clone();
            if unify_atoms_with(
                &self.renamed.body()[position],
                &self.non_full.head()[head],
                &mut extended,
            ) {
                pairings.push(Pairing::Matched(head));
                self.search(position + 1, pairings, &extended);
                pairings.pop();
            }
        }
    }

    /// Build the rules for a complete pairing.
    fn derive(&mut self, pairings: &[Pairing], unifier: &Substitution) {
        let non_full = self.non_full;
        let unmatched = self
            .renamed
            .body()
            .iter()
            .zip(pairings)
            .filter(|(_, pairing)| matches!(pairing, Pairing::Unmatched))
            .map(|(atom, _)| atom);

        let body: Vec<Atom> = unifier
            .apply_atoms(non_full.body())
            .chain(unifier.apply_atoms(unmatched))
            .collect();
        if body.iter().any(Atom::contains_function) {
            return;
        }

        let head: Vec<Atom> = unifier.apply_atoms(self.renamed.head()).collect();

        for atom in head.iter().filter(|atom| !atom.contains_function()) {
            self.add(Rule::new(body.clone(), vec![atom.clone()]));
        }

        if head.iter().any(Atom::contains_function) {
            let combined = unifier
                .apply_atoms(non_full.head())
                .chain(head.iter().cloned());
            self.add(Rule::new(body, combined));
        }
    }

    fn add(&mut self, rule: Rule) {
        if rule == *self.non_full || rule == *self.full {
            self.result.equal_to_parent += 1;
        } else if self.seen.insert(rule.clone()) {
            self.result.derived.push(rule);
        }
    }
}

/// Derive all rules obtained by resolving head atoms of `non_full`
/// with body atoms of `full` (hyperresolution).
///
/// Any subset of the body atoms of `full` can be resolved at once,
/// each with some head atom of `non_full`,
/// as long as at least one of these head atoms contains a Skolem term.
/// The derived rule's body consists of the body of `non_full`
/// and the unresolved body atoms of `full`, and must not contain Skolem terms.
/// Every head atom of `full` without Skolem terms yields a full rule;
/// if some head atom still contains a Skolem term,
/// the head atoms of both rules are combined into a new non-full rule.
pub fn evolve(non_full: &Rule, full: &Rule) -> Evolution {
    debug_assert_eq!(non_full.kind(), RuleKind::NonFull);
    debug_assert_eq!(full.kind(), RuleKind::Full);

    let mut evolver = Evolver::new(non_full, full);
    let mut pairings = Vec::with_capacity(evolver.candidates.len());
    evolver.search(0, &mut pairings, &Substitution::new());

    log::trace!(
        "evolve produced {} rule(s), {} equal to a parent",
        evolver.result.derived.len(),
        evolver.result.equal_to_parent
    );

    evolver.result
}

#[cfg(test)]
mod test {
    use test_log::test;

    use crate::{
        logic::normalization::Normalizer,
        model::{Rule, RuleKind, SymbolDisplay, SymbolTable},
        parser::parse_rules,
    };

    use super::evolve;

    fn skolemized(program: &str) -> (SymbolTable, Vec<Rule>) {
        let mut symbols = SymbolTable::new();
        let raw = parse_rules(program).unwrap();

        let mut normalizer = Normalizer::new(&mut symbols);
        let rules = raw
            .iter()
            .map(|rule| normalizer.skolemize(rule).unwrap())
            .collect();

        (symbols, rules)
    }

    fn printed(symbols: &SymbolTable, rules: &[Rule]) -> Vec<String> {
        rules
            .iter()
            .map(|rule| rule.display(symbols).to_string())
            .collect()
    }

    #[test]
    fn existential_is_resolved() {
        let (symbols, rules) = skolemized(
            "T(?x, !y) :- S(?x) .
             U(?x) :- T(?x, ?y) .",
        );

        let evolution = evolve(&rules[0], &rules[1]);
        assert_eq!(printed(&symbols, evolution.derived()), vec!["U(?x0) :- S(?x0) ."]);
        assert!(!evolution.is_failure());
    }

    #[test]
    fn several_body_atoms_at_once() {
        let (symbols, rules) = skolemized(
            "R(?x, !y), S(!y) :- A(?x) .
             B(?x) :- R(?x, ?y), S(?y) .",
        );

        let evolution = evolve(&rules[0], &rules[1]);
        assert_eq!(printed(&symbols, evolution.derived()), vec!["B(?x0) :- A(?x0) ."]);
    }

    #[test]
    fn unmatched_body_atoms_are_kept() {
        let (symbols, rules) = skolemized(
            "R(?x, !y) :- A(?x) .
             B(?z) :- R(?x, ?y), C(?x, ?z) .",
        );

        let evolution = evolve(&rules[0], &rules[1]);
        assert_eq!(
            printed(&symbols, evolution.derived()),
            vec!["B(?x1) :- A(?x0), C(?x0, ?x1) ."]
        );
    }

    #[test]
    fn skolem_terms_in_the_head_give_non_full_rules() {
        let (symbols, rules) = skolemized(
            "R(?x, !y) :- A(?x) .
             S(?y, ?x), Q(?x) :- R(?x, ?y) .",
        );

        let evolution = evolve(&rules[0], &rules[1]);
        assert_eq!(evolution.derived().len(), 2);
        assert_eq!(evolution.derived()[0].kind(), RuleKind::Full);
        assert_eq!(evolution.derived()[1].kind(), RuleKind::NonFull);
        assert_eq!(
            printed(&symbols, evolution.derived()),
            vec![
                "Q(?x0) :- A(?x0) .",
                "R(?x0, sk0_0(?x0)), S(sk0_0(?x0), ?x0) :- A(?x0) .",
            ]
        );
    }

    #[test]
    fn derivation_equal_to_parent() {
        let (_, rules) = skolemized(
            "R(?x, !y), Q(!y) :- A(?x) .
             Q(?y) :- R(?x, ?y) .",
        );

        let evolution = evolve(&rules[0], &rules[1]);
        assert!(evolution.derived().is_empty());
        assert_eq!(evolution.equal_to_parent(), 1);
        assert!(!evolution.is_failure());
    }

    #[test]
    fn hyperresolution_failures() {
        let (_, rules) = skolemized(
            "R(?x, !y) :- A(?x) .
             B(?x) :- R(?x, ?x) .
             B(?x) :- R(?x, ?y), C(?y) .
             B(?x) :- R(?y, ?x) .",
        );

        // ?x would have to equal the Skolem term over ?x
        assert!(evolve(&rules[0], &rules[1]).is_failure());
        // C would be applied to a Skolem term in the body
        assert!(evolve(&rules[0], &rules[2]).is_failure());
        // B would be applied to a Skolem term
        let evolution = evolve(&rules[0], &rules[3]);
        assert_eq!(evolution.derived().len(), 1);
        assert_eq!(evolution.derived()[0].kind(), RuleKind::NonFull);
    }
}
