//! This module defines [Substitution].

use std::collections::HashMap;

use crate::model::{Atom, Term, Variable};

/// Map from [Variable]s to [Term]s
///
/// Substitutions are applied simultaneously:
/// every variable is replaced once and the inserted terms are not substituted again.
/// Substitutions built through [Substitution::bind] (as done by unification)
/// are idempotent, i.e. no variable of the domain occurs in any of the terms it maps to.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Substitution {
    map: HashMap<Variable, Term>,
}

impl Substitution {
    /// Create a new empty [Substitution].
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the term `variable` is mapped to.
    pub fn get(&self, variable: Variable) -> Option<&Term> {
        self.map.get(&variable)
    }

    /// Return the number of mapped variables.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Return whether no variable is mapped.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Return an iterator over all mappings.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &Term)> {
        self.map.iter().map(|(variable, term)| (*variable, term))
    }

    /// Map `variable` to `term` without any normalization.
    ///
    /// Used for one-way matching, where the domain and the range of the substitution
    /// belong to different rules and may share variable numbers.
    /// Returns the previous mapping of `variable`.
    pub(crate) fn insert(&mut self, variable: Variable, term: Term) -> Option<Term> {
        self.map.insert(variable, term)
    }

    /// Map the unbound `variable` to `term` while keeping the substitution idempotent.
    ///
    /// `term` is instantiated with the current mappings
    /// and `variable` is replaced in all existing mappings.
    /// The caller has to make sure that `variable` does not occur in the instantiated term.
    pub(crate) fn bind(&mut self, variable: Variable, term: Term) {
        debug_assert!(!self.map.contains_key(&variable));

        let term = self.apply_term(&term);
        if term == Term::Variable(variable) {
            return;
        }
        debug_assert!(!term.contains_variable(variable));

        let replace = |other: Variable| (other == variable).then(|| term.clone());
        for value in self.map.values_mut() {
            if let Some(replaced) = value.replace_variables(&replace) {
                *value = replaced;
            }
        }

        self.map.insert(variable, term);
    }

    /// Apply this substitution to a term.
    pub fn apply_term(&self, term: &Term) -> Term {
        if self.map.is_empty() {
            return term.clone();
        }

        term.replace_variables(&|variable| self.map.get(&variable).cloned())
            .unwrap_or_else(|| term.clone())
    }

    /// Apply this substitution to an atom.
    pub fn apply_atom(&self, atom: &Atom) -> Atom {
        if self.map.is_empty() {
            return atom.clone();
        }

        atom.replace_variables(&|variable| self.map.get(&variable).cloned())
    }

    /// Apply this substitution to each of the given atoms.
    pub fn apply_atoms<'a, Atoms>(&'a self, atoms: Atoms) -> impl Iterator<Item = Atom> + 'a
    where
        Atoms: IntoIterator<Item = &'a Atom>,
        Atoms::IntoIter: 'a,
    {
        atoms.into_iter().map(|atom| self.apply_atom(atom))
    }

    /// Return whether applying this substitution twice has the same effect as applying it once.
    pub fn is_idempotent(&self) -> bool {
        self.map
            .values()
            .all(|term| term.variables().all(|variable| !self.map.contains_key(&variable)))
    }

    /// Return the substitution that first applies `self` and then `other`.
    ///
    /// The result is brought back into idempotent form.
    /// Returns `None` if this is impossible because the combined mappings are cyclic,
    /// e.g. `x -> f(y)` followed by `y -> g(x)`.
    pub fn compose(&self, other: &Substitution) -> Option<Substitution> {
        let mut map: HashMap<Variable, Term> = self
            .map
            .iter()
            .map(|(variable, term)| (*variable, other.apply_term(term)))
            .collect();
        for (variable, term) in &other.map {
            map.entry(*variable).or_insert_with(|| term.clone());
        }
        map.retain(|variable, term| *term != Term::Variable(*variable));

        // every round resolves one more link of a chain x -> .. y .. , y -> ..
        let mut result = Substitution { map };
        for _ in 0..=result.map.len() {
            if result.is_idempotent() {
                return Some(result);
            }

            let round = result.clone();
            for term in result.map.values_mut() {
                *term = round.apply_term(term);
            }

            if result
                .map
                .iter()
                .any(|(variable, term)| term.contains_variable(*variable))
            {
                return None;
            }
        }

        None
    }
}

impl FromIterator<(Variable, Term)> for Substitution {
    fn from_iter<Iter: IntoIterator<Item = (Variable, Term)>>(iter: Iter) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}
