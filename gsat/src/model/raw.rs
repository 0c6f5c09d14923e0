//! This module defines [RawRule], the input representation of rules.
//!
//! Raw rules refer to symbols by name and do not distinguish
//! universal from existential variables; the quantification of a
//! variable is decided by where it occurs.

use std::{collections::HashSet, fmt};

/// Term of a [RawAtom]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RawTerm {
    /// Variable with the given name
    Variable(String),
    /// Constant with the given name
    Constant(String),
}

impl RawTerm {
    /// Create a variable term.
    pub fn variable(name: &str) -> Self {
        Self::Variable(name.to_string())
    }

    /// Create a constant term.
    pub fn constant(name: &str) -> Self {
        Self::Constant(name.to_string())
    }
}

/// Atom given by the name of its predicate and a list of [RawTerm]s
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawAtom {
    predicate: String,
    terms: Vec<RawTerm>,
}

impl RawAtom {
    /// Create a new [RawAtom].
    pub fn new<Terms: IntoIterator<Item = RawTerm>>(predicate: &str, terms: Terms) -> Self {
        Self {
            predicate: predicate.to_string(),
            terms: terms.into_iter().collect(),
        }
    }

    /// Return the name of the predicate.
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    /// Return the arguments of this atom.
    pub fn terms(&self) -> &[RawTerm] {
        &self.terms
    }

    /// Return the names of all variables in this atom.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|term| match term {
            RawTerm::Variable(name) => Some(name.as_str()),
            RawTerm::Constant(_) => None,
        })
    }
}

/// Rule as produced by a rule source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawRule {
    body: Vec<RawAtom>,
    head: Vec<RawAtom>,
}

impl RawRule {
    /// Create a new [RawRule].
    pub fn new(body: Vec<RawAtom>, head: Vec<RawAtom>) -> Self {
        Self { body, head }
    }

    /// Return the body atoms.
    pub fn body(&self) -> &[RawAtom] {
        &self.body
    }

    /// Return the head atoms.
    pub fn head(&self) -> &[RawAtom] {
        &self.head
    }

    /// Return the names of the variables that occur in the body.
    pub fn universal_variables(&self) -> HashSet<&str> {
        self.body.iter().flat_map(RawAtom::variables).collect()
    }
}

/// Write a comma separated list of atoms, marking variables that do not occur in `universal` as existential.
fn write_atoms(
    f: &mut fmt::Formatter<'_>,
    atoms: &[RawAtom],
    universal: &HashSet<&str>,
) -> fmt::Result {
    for (atom_index, atom) in atoms.iter().enumerate() {
        if atom_index > 0 {
            f.write_str(", ")?;
        }

        write!(f, "{}(", atom.predicate)?;
        for (term_index, term) in atom.terms.iter().enumerate() {
            if term_index > 0 {
                f.write_str(", ")?;
            }

            match term {
                RawTerm::Variable(name) if universal.contains(name.as_str()) => {
                    write!(f, "?{name}")?
                }
                RawTerm::Variable(name) => write!(f, "!{name}")?,
                RawTerm::Constant(name) => f.write_str(name)?,
            }
        }
        f.write_str(")")?;
    }

    Ok(())
}

impl fmt::Display for RawRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let universal = self.universal_variables();

        write_atoms(f, &self.head, &universal)?;
        if !self.body.is_empty() {
            f.write_str(" :- ")?;
            write_atoms(f, &self.body, &universal)?;
        }
        f.write_str(" .")
    }
}
