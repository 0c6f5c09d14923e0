//! This module defines [Rule] and [RuleKind].

use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap, HashSet},
    fmt,
};

use super::{
    atom::Atom,
    symbol::{SymbolDisplay, SymbolTable},
    term::{Term, Variable},
};

/// Whether a rule can be used for forward chaining directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKind {
    /// No head atom contains a Skolem term
    Full,
    /// Some head atom contains a Skolem term
    NonFull,
}

/// Rule
///
/// A skolemized existential rule `body -> head`.
/// Every rule is kept in a canonical form:
/// atoms are deduplicated and arranged in the least order
/// in which variables are numbered by their first occurrence.
/// Alphabetic variants of a rule therefore compare equal and share the same hash.
/// Rules are never modified after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rule {
    body: Box<[Atom]>,
    head: Box<[Atom]>,
    kind: RuleKind,
    /// Variables of this rule are exactly `0..variable_count`
    variable_count: u32,
}

impl Rule {
    /// Create a new [Rule] in canonical form.
    pub fn new<Body, Head>(body: Body, head: Head) -> Self
    where
        Body: IntoIterator<Item = Atom>,
        Head: IntoIterator<Item = Atom>,
    {
        let mut body: Vec<Atom> = body.into_iter().collect();
        let mut head: Vec<Atom> = head.into_iter().collect();
        body.sort();
        body.dedup();
        head.sort();
        head.dedup();

        let mut atoms = Canonizer::new(&body, &head).canonize();
        let head = atoms.split_off(body.len());
        let body = atoms;
        let variable_count = body
            .iter()
            .chain(head.iter())
            .flat_map(Atom::variables)
            .collect::<HashSet<_>>()
            .len() as u32;

        let kind = if head.iter().any(Atom::contains_function) {
            RuleKind::NonFull
        } else {
            RuleKind::Full
        };

        Self {
            body: body.into(),
            head: head.into(),
            kind,
            variable_count,
        }
    }

    /// Return the body atoms of this rule.
    pub fn body(&self) -> &[Atom] {
        &self.body
    }

    /// Return the head atoms of this rule.
    pub fn head(&self) -> &[Atom] {
        &self.head
    }

    /// Return whether this rule is full or non-full.
    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Return whether this rule is full.
    pub fn is_full(&self) -> bool {
        matches!(self.kind, RuleKind::Full)
    }

    /// Return the number of distinct variables in this rule.
    pub fn variable_count(&self) -> u32 {
        self.variable_count
    }

    /// Return the universal variables shared between body and head.
    pub fn frontier(&self) -> BTreeSet<Variable> {
        let body: BTreeSet<Variable> = self.body.iter().flat_map(Atom::variables).collect();

        self.head
            .iter()
            .flat_map(Atom::variables)
            .filter(|variable| body.contains(variable))
            .collect()
    }

    /// Return whether every head atom already occurs in the body.
    pub fn is_tautology(&self) -> bool {
        self.head.iter().all(|atom| self.body.contains(atom))
    }

    /// Return whether no body atom contains a function term.
    pub fn is_body_function_free(&self) -> bool {
        !self.body.iter().any(Atom::contains_function)
    }

    /// Return a copy of this rule where every variable is shifted by `offset`.
    ///
    /// The result is not canonical and only used to rename rules apart.
    pub(crate) fn shifted(&self, offset: u32) -> Rule {
        Rule {
            body: self.body.iter().map(|atom| atom.shifted(offset)).collect(),
            head: self.head.iter().map(|atom| atom.shifted(offset)).collect(),
            kind: self.kind,
            variable_count: self.variable_count,
        }
    }
}

/// Search for the canonical arrangement of the atoms of a rule.
///
/// Body atoms are placed before head atoms. Each placed atom is renamed
/// by the first occurrence of its variables in the arrangement,
/// and the arrangement giving the least sequence of renamed atoms is chosen.
/// This sequence does not depend on the variable names of the input.
#[derive(Debug)]
struct Canonizer<'a> {
    atoms: Vec<&'a Atom>,
    body_len: usize,
    /// Least remaining sequence for each visited search state
    memo: HashMap<SearchState, Vec<Atom>>,
}

/// Everything the remainder of an arrangement depends on
#[derive(Debug, PartialEq, Eq, Hash)]
struct SearchState {
    placed: Vec<bool>,
    /// Renaming of the variables that still occur in atoms yet to be placed
    renaming: Vec<(Variable, Variable)>,
    fresh: usize,
}

impl<'a> Canonizer<'a> {
    fn new(body: &'a [Atom], head: &'a [Atom]) -> Self {
        Self {
            atoms: body.iter().chain(head.iter()).collect(),
            body_len: body.len(),
            memo: HashMap::new(),
        }
    }

    fn canonize(mut self) -> Vec<Atom> {
        let mut placed = vec![false; self.atoms.len()];
        self.least_suffix(&mut placed, &HashMap::new())
    }

    /// Return the least sequence of renamed atoms that are not placed yet.
    fn least_suffix(
        &mut self,
        placed: &mut [bool],
        renaming: &HashMap<Variable, Variable>,
    ) -> Vec<Atom> {
        let step = placed.iter().filter(|&&done| done).count();
        let candidates = if step < self.body_len {
            0..self.body_len
        } else {
            self.body_len..self.atoms.len()
        };

        let mut least: Option<Atom> = None;
        let mut tied: Vec<(usize, HashMap<Variable, Variable>)> = Vec::new();

        for index in candidates.filter(|&index| !placed[index]) {
            let mut extended = renaming.clone();
            let renamed = rename_fresh(self.atoms[index], &mut extended);

            match least.as_ref().map(|least| renamed.cmp(least)) {
                Some(Ordering::Greater) => {}
                Some(Ordering::Equal) => tied.push((index, extended)),
                Some(Ordering::Less) | None => {
                    least = Some(renamed);
                    tied = vec![(index, extended)];
                }
            }
        }

        let Some(least) = least else {
            return Vec::new();
        };

        // ties are only broken by the atoms placed afterwards
        let mut best: Option<Vec<Atom>> = None;
        for (index, extended) in tied {
            placed[index] = true;

            let state = self.state(placed, &extended);
            let suffix = match self.memo.get(&state).cloned() {
                Some(suffix) => suffix,
                None => {
                    let suffix = self.least_suffix(placed, &extended);
                    self.memo.insert(state, suffix.clone());
                    suffix
                }
            };

            placed[index] = false;

            if best.as_ref().map_or(true, |best| suffix < *best) {
                best = Some(suffix);
            }
        }

        let mut result = vec![least];
        result.extend(best.unwrap_or_default());
        result
    }

    fn state(&self, placed: &[bool], renaming: &HashMap<Variable, Variable>) -> SearchState {
        let mut open: Vec<(Variable, Variable)> = renaming
            .iter()
            .filter(|(variable, _)| {
                self.atoms
                    .iter()
                    .zip(placed)
                    .any(|(atom, &done)| !done && atom.variables().any(|other| other == **variable))
            })
            .map(|(&variable, &new)| (variable, new))
            .collect();
        open.sort();

        SearchState {
            placed: placed.to_vec(),
            renaming: open,
            fresh: renaming.len(),
        }
    }
}

/// Rename `atom`, numbering its unseen variables after those in `renaming`.
fn rename_fresh(atom: &Atom, renaming: &mut HashMap<Variable, Variable>) -> Atom {
    for variable in atom.variables() {
        let next = Variable::new(renaming.len() as u32);
        renaming.entry(variable).or_insert(next);
    }

    atom.replace_variables(&|variable| renaming.get(&variable).map(|&new| Term::Variable(new)))
}

impl SymbolDisplay for Rule {
    fn fmt_symbols(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, atom) in self.head.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            atom.fmt_symbols(symbols, f)?;
        }

        if !self.body.is_empty() {
            f.write_str(" :- ")?;

            for (index, atom) in self.body.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                atom.fmt_symbols(symbols, f)?;
            }
        }

        f.write_str(" .")
    }
}
