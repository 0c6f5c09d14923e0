//! This module defines [Atom].

use std::fmt;

#[cfg(test)]
use quickcheck::{Arbitrary, Gen};

use super::{
    symbol::{Predicate, SymbolDisplay, SymbolTable},
    term::{Term, Variable},
};

/// Atom
///
/// A predicate applied to a list of [Term]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom {
    predicate: Predicate,
    terms: Box<[Term]>,
}

impl Atom {
    /// Create a new [Atom].
    pub fn new<Terms: IntoIterator<Item = Term>>(predicate: Predicate, terms: Terms) -> Self {
        Self {
            predicate,
            terms: terms.into_iter().collect(),
        }
    }

    /// Return the predicate of this atom.
    pub fn predicate(&self) -> Predicate {
        self.predicate
    }

    /// Return the arguments of this atom.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Return the number of arguments of this atom.
    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Return an iterator over all variables occurring in this atom (with repetitions).
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.terms.iter().flat_map(|term| term.variables())
    }

    /// Return whether some argument of this atom is a function term.
    pub fn contains_function(&self) -> bool {
        self.terms.iter().any(Term::is_function)
    }

    /// Return the largest variable occurring in this atom.
    pub fn max_variable(&self) -> Option<Variable> {
        self.variables().max()
    }

    /// Replace variables according to `map`, reusing unchanged terms.
    pub fn replace_variables<Map>(&self, map: &Map) -> Atom
    where
        Map: Fn(Variable) -> Option<Term>,
    {
        let mut replaced: Option<Vec<Term>> = None;

        for (index, term) in self.terms.iter().enumerate() {
            match (term.replace_variables(map), &mut replaced) {
                (Some(new), Some(terms)) => terms.push(new),
                (Some(new), None) => {
                    let mut terms = self.terms[..index].to_vec();
                    terms.push(new);
                    replaced = Some(terms);
                }
                (None, Some(terms)) => terms.push(term.clone()),
                (None, None) => {}
            }
        }

        match replaced {
            Some(terms) => Atom::new(self.predicate, terms),
            None => self.clone(),
        }
    }

    /// Return a copy of this atom where every variable is shifted by `offset`.
    pub(crate) fn shifted(&self, offset: u32) -> Atom {
        if offset == 0 {
            return self.clone();
        }

        self.replace_variables(&|variable| Some(Term::Variable(variable.shifted(offset))))
    }

    /// Return this atom with every variable replaced by the same placeholder.
    ///
    /// Atoms that only differ in their variables have the same shape.
    pub(crate) fn shape(&self) -> Atom {
        self.replace_variables(&|_| Some(Term::variable(0)))
    }
}

impl SymbolDisplay for Atom {
    fn fmt_symbols(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(symbols.predicate_name(self.predicate))?;
        f.write_str("(")?;

        for (index, term) in self.terms.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            term.fmt_symbols(symbols, f)?;
        }

        f.write_str(")")
    }
}

/// Predicates used by generated atoms, with arities 1 and 2
#[cfg(test)]
const ARBITRARY_PREDICATES: [(usize, usize); 2] = [(0, 1), (1, 2)];

#[cfg(test)]
impl Arbitrary for Atom {
    fn arbitrary(g: &mut Gen) -> Self {
        let (predicate, arity) =
            ARBITRARY_PREDICATES[usize::arbitrary(g) % ARBITRARY_PREDICATES.len()];

        Atom::new(
            Predicate::from_index(predicate),
            (0..arity).map(|_| Term::arbitrary(g)).collect::<Vec<_>>(),
        )
    }
}
