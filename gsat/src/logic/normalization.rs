//! This module defines [Normalizer],
//! which turns [RawRule]s into skolemized [Rule]s.

use std::{borrow::Borrow, collections::HashMap, fmt::Write};

use crate::{
    error::Error,
    model::{Atom, RawAtom, RawRule, RawTerm, Rule, RuleKind, SymbolTable, Term, Variable},
};

/// Quantification of a variable in a raw rule, decided by its occurrences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    /// Occurs in the body
    Universal(Variable),
    /// Occurs only in the head; carries its position among the existential variables
    Existential(usize),
}

/// Variables of a raw rule
#[derive(Debug, Default)]
struct Quantification<'r> {
    variables: HashMap<&'r str, Quantifier>,
    universal_count: u32,
    existentials: Vec<&'r str>,
}

impl<'r> Quantification<'r> {
    fn new(rule: &'r RawRule) -> Self {
        let mut result = Self::default();

        for name in rule.body().iter().flat_map(RawAtom::variables) {
            if !result.variables.contains_key(name) {
                let variable = Variable::new(result.universal_count);
                result.universal_count += 1;
                result.variables.insert(name, Quantifier::Universal(variable));
            }
        }

        for name in rule.head().iter().flat_map(RawAtom::variables) {
            if !result.variables.contains_key(name) {
                result
                    .variables
                    .insert(name, Quantifier::Existential(result.existentials.len()));
                result.existentials.push(name);
            }
        }

        result
    }

    fn get(&self, name: &str) -> Quantifier {
        self.variables[name]
    }

    /// Return the universal variables occurring in the head, ordered by their first occurrence in the body.
    fn frontier(&self, rule: &RawRule) -> Vec<Variable> {
        let mut frontier: Vec<Variable> = rule
            .head()
            .iter()
            .flat_map(RawAtom::variables)
            .filter_map(|name| match self.get(name) {
                Quantifier::Universal(variable) => Some(variable),
                Quantifier::Existential(_) => None,
            })
            .collect();
        frontier.sort();
        frontier.dedup();

        frontier
    }
}

/// Converts raw rules into internal rules
///
/// Predicates and constants are interned into the given [SymbolTable]
/// and every existential variable is replaced by a Skolem term over the frontier of its rule.
/// Malformed rules are reported as errors.
#[derive(Debug)]
pub struct Normalizer<'a> {
    symbols: &'a mut SymbolTable,
}

impl<'a> Normalizer<'a> {
    /// Create a new [Normalizer] interning symbols into `symbols`.
    pub fn new(symbols: &'a mut SymbolTable) -> Self {
        Self { symbols }
    }

    /// Skolemize a single rule.
    ///
    /// The resulting rule is non-full if the raw rule contains an existential variable.
    /// Skolem symbols only depend on the structure of the rule,
    /// so skolemizing the same rule (or an alphabetic variant of it) twice
    /// produces the same function symbols.
    pub fn skolemize(&mut self, rule: &RawRule) -> Result<Rule, Error> {
        if rule.head().is_empty() {
            return Err(Error::EmptyHead {
                rule: rule.to_string(),
            });
        }

        let quantification = Quantification::new(rule);
        let frontier = quantification.frontier(rule);

        if let Some(variable) = quantification.existentials.first() {
            if frontier.is_empty() {
                return Err(Error::ExistentialWithoutFrontier {
                    variable: variable.to_string(),
                    rule: rule.to_string(),
                });
            }
        }

        let skolem_terms = if quantification.existentials.is_empty() {
            Vec::new()
        } else {
            let key = rule_key(rule, &quantification);
            let arguments: Vec<Term> = frontier.into_iter().map(Term::Variable).collect();

            (0..quantification.existentials.len())
                .map(|existential| {
                    let symbol = self.symbols.skolem(&key, existential, arguments.len());
                    Term::function(symbol, arguments.iter().cloned())
                })
                .collect()
        };

        let body = rule
            .body()
            .iter()
            .map(|atom| self.atom(atom, rule, &quantification, &skolem_terms))
            .collect::<Result<Vec<_>, _>>()?;
        let head = rule
            .head()
            .iter()
            .map(|atom| self.atom(atom, rule, &quantification, &skolem_terms))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Rule::new(body, head))
    }

    /// Skolemize a rule and split it into the rules used by the saturation.
    ///
    /// A full rule is split into one rule per head atom.
    /// A non-full rule is kept as it is, and additionally yields
    /// the full rule `body -> atom` for each of its function-free head atoms.
    pub fn normalize(&mut self, rule: &RawRule) -> Result<Vec<Rule>, Error> {
        let skolemized = self.skolemize(rule)?;

        let result = match skolemized.kind() {
            RuleKind::Full if skolemized.head().len() == 1 => vec![skolemized],
            kind => {
                let mut result: Vec<Rule> = skolemized
                    .head()
                    .iter()
                    .filter(|atom| !atom.contains_function())
                    .map(|atom| Rule::new(skolemized.body().to_vec(), vec![atom.clone()]))
                    .collect();

                if kind == RuleKind::NonFull {
                    result.push(skolemized);
                }

                result
            }
        };

        log::trace!("normalized `{rule}` into {} rule(s)", result.len());

        Ok(result)
    }

    fn atom(
        &mut self,
        atom: &RawAtom,
        rule: &RawRule,
        quantification: &Quantification,
        skolem_terms: &[Term],
    ) -> Result<Atom, Error> {
        let predicate = self
            .symbols
            .predicate(atom.predicate(), atom.terms().len())
            .map_err(|conflict| Error::ArityMismatch {
                symbol: atom.predicate().to_string(),
                expected: conflict.expected,
                found: atom.terms().len(),
                rule: rule.to_string(),
            })?;

        let terms = atom
            .terms()
            .iter()
            .map(|term| match term {
                RawTerm::Variable(name) => match quantification.get(name) {
                    Quantifier::Universal(variable) => Term::Variable(variable),
                    Quantifier::Existential(index) => skolem_terms[index].clone(),
                },
                RawTerm::Constant(name) => Term::Constant(self.symbols.constant(name)),
            })
            .collect::<Vec<_>>();

        Ok(Atom::new(predicate, terms))
    }
}

/// Normalize all given rules, see [Normalizer::normalize].
///
/// Fails on the first malformed rule.
pub fn normalize_all<Rules>(rules: Rules, symbols: &mut SymbolTable) -> Result<Vec<Rule>, Error>
where
    Rules: IntoIterator,
    Rules::Item: Borrow<RawRule>,
{
    let mut normalizer = Normalizer::new(symbols);
    let mut result = Vec::new();

    for rule in rules {
        result.extend(normalizer.normalize(rule.borrow())?);
    }

    Ok(result)
}

/// Text identifying a raw rule up to the names of its variables
fn rule_key(rule: &RawRule, quantification: &Quantification) -> String {
    let mut key = String::new();

    let write_atoms = |key: &mut String, atoms: &[RawAtom]| {
        for atom in atoms {
            let _ = write!(key, "{}(", atom.predicate());
            for term in atom.terms() {
                let _ = match term {
                    RawTerm::Variable(name) => match quantification.get(name) {
                        Quantifier::Universal(variable) => write!(key, "{variable},"),
                        Quantifier::Existential(index) => write!(key, "!{index},"),
                    },
                    RawTerm::Constant(name) => write!(key, "{name:?},"),
                };
            }
            key.push_str(") ");
        }
    };

    write_atoms(&mut key, rule.head());
    key.push_str(":- ");
    write_atoms(&mut key, rule.body());

    key
}

#[cfg(test)]
mod test {
    use test_log::test;

    use crate::{
        error::Error,
        model::{RawAtom, RawRule, RawTerm, RuleKind, SymbolDisplay, SymbolTable},
    };

    use super::{normalize_all, Normalizer};

    fn atom(predicate: &str, terms: &[&str]) -> RawAtom {
        RawAtom::new(
            predicate,
            terms.iter().map(|term| {
                if term.chars().next().is_some_and(char::is_uppercase) {
                    RawTerm::variable(term)
                } else {
                    RawTerm::constant(term)
                }
            }),
        )
    }

    #[test]
    fn skolemize_existential() {
        let mut symbols = SymbolTable::new();
        let rule = RawRule::new(
            vec![atom("S", &["X"])],
            vec![atom("T", &["X", "Y", "Z"]), atom("U", &["X"])],
        );

        let skolemized = Normalizer::new(&mut symbols).skolemize(&rule).unwrap();

        assert_eq!(skolemized.kind(), RuleKind::NonFull);
        assert_eq!(
            skolemized.display(&symbols).to_string(),
            "T(?x0, sk0_0(?x0), sk0_1(?x0)), U(?x0) :- S(?x0) ."
        );
        assert_eq!(symbols.skolem_count(), 2);
    }

    #[test]
    fn skolem_symbols_are_reused() {
        let mut symbols = SymbolTable::new();
        let first = RawRule::new(vec![atom("S", &["X"])], vec![atom("T", &["X", "Y"])]);
        let variant = RawRule::new(vec![atom("S", &["A"])], vec![atom("T", &["A", "B"])]);
        let other = RawRule::new(vec![atom("S", &["X"])], vec![atom("T", &["Y", "X"])]);

        let mut normalizer = Normalizer::new(&mut symbols);
        let first = normalizer.skolemize(&first).unwrap();
        let variant = normalizer.skolemize(&variant).unwrap();
        let other = normalizer.skolemize(&other).unwrap();

        assert_eq!(first, variant);
        assert_ne!(first, other);
        assert_eq!(symbols.skolem_count(), 2);
    }

    #[test]
    fn normalize_splits_heads() {
        let mut symbols = SymbolTable::new();
        let full = RawRule::new(
            vec![atom("R", &["X", "Y"])],
            vec![atom("S", &["X"]), atom("S", &["Y"])],
        );
        let non_full = RawRule::new(
            vec![atom("S", &["X"])],
            vec![atom("T", &["X", "Y"]), atom("U", &["X", "c"])],
        );

        let rules = normalize_all([&full, &non_full], &mut symbols).unwrap();
        let printed: Vec<String> = rules
            .iter()
            .map(|rule| rule.display(&symbols).to_string())
            .collect();

        assert_eq!(
            printed,
            vec![
                "S(?x0) :- R(?x0, ?x1) .",
                "S(?x1) :- R(?x0, ?x1) .",
                "U(?x0, c) :- S(?x0) .",
                "T(?x0, sk0_0(?x0)), U(?x0, c) :- S(?x0) .",
            ]
        );
    }

    #[test]
    fn facts_are_full_rules() {
        let mut symbols = SymbolTable::new();
        let fact = RawRule::new(Vec::new(), vec![atom("S", &["a"])]);

        let rules = normalize_all([fact], &mut symbols).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].is_full());
        assert!(rules[0].body().is_empty());
    }

    #[test]
    fn malformed_rules_are_rejected() {
        let mut symbols = SymbolTable::new();
        let mut normalizer = Normalizer::new(&mut symbols);

        let empty_head = RawRule::new(vec![atom("S", &["X"])], Vec::new());
        assert!(matches!(
            normalizer.normalize(&empty_head),
            Err(Error::EmptyHead { .. })
        ));

        let arity = RawRule::new(vec![atom("S", &["X"])], vec![atom("S", &["X", "X"])]);
        assert!(matches!(
            normalizer.normalize(&arity),
            Err(Error::ArityMismatch {
                expected: 1,
                found: 2,
                ..
            })
        ));

        let no_frontier = RawRule::new(vec![atom("S", &["X"])], vec![atom("T", &["Y"])]);
        match normalizer.normalize(&no_frontier) {
            Err(Error::ExistentialWithoutFrontier { variable, rule }) => {
                assert_eq!(variable, "Y");
                assert_eq!(rule, "T(!Y) :- S(?X) .");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
