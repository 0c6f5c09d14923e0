//! This module implements syntactic unification and one-way matching of terms and atoms.
//!
//! Unification of two expressions that have no unifier is not an error:
//! the functions of this module simply report failure.

use crate::model::{Atom, Term};

use super::substitution::Substitution;

/// Compute a most general unifier of two terms.
pub fn unify(left: &Term, right: &Term) -> Option<Substitution> {
    let mut substitution = Substitution::new();
    unify_terms_with(left, right, &mut substitution).then_some(substitution)
}

/// Compute a most general unifier of two atoms.
pub fn unify_atoms(left: &Atom, right: &Atom) -> Option<Substitution> {
    let mut substitution = Substitution::new();
    unify_atoms_with(left, right, &mut substitution).then_some(substitution)
}

/// Extend `substitution` so that it unifies `left` and `right`.
///
/// Returns `false` if no such extension exists.
/// In that case `substitution` may have been partially extended
/// and should be discarded by the caller.
pub fn unify_terms_with(left: &Term, right: &Term, substitution: &mut Substitution) -> bool {
    let left = substitution.apply_term(left);
    let right = substitution.apply_term(right);

    unify_instantiated(&left, &right, substitution)
}

/// Extend `substitution` so that it unifies `left` and `right`.
///
/// See [unify_terms_with].
pub fn unify_atoms_with(left: &Atom, right: &Atom, substitution: &mut Substitution) -> bool {
    left.predicate() == right.predicate()
        && left.arity() == right.arity()
        && left
            .terms()
            .iter()
            .zip(right.terms())
            .all(|(left, right)| unify_terms_with(left, right, substitution))
}

/// Unify two terms that are already instantiated by `substitution`.
fn unify_instantiated(left: &Term, right: &Term, substitution: &mut Substitution) -> bool {
    match (left, right) {
        (Term::Variable(left), Term::Variable(right)) if left == right => true,
        (Term::Variable(variable), term) | (term, Term::Variable(variable)) => {
            // variables may only be bound to function terms they do not occur in,
            // otherwise the unifier would need an infinite term
            if term.contains_variable(*variable) {
                return false;
            }

            substitution.bind(*variable, term.clone());
            true
        }
        (Term::Constant(left), Term::Constant(right)) => left == right,
        (Term::Function(left), Term::Function(right)) => {
            left.symbol() == right.symbol()
                && left.arguments().len() == right.arguments().len()
                && left
                    .arguments()
                    .iter()
                    .zip(right.arguments())
                    .all(|(left, right)| unify_terms_with(left, right, substitution))
        }
        _ => false,
    }
}

/// Extend `substitution` so that it maps `pattern` onto `target`.
///
/// Only variables of `pattern` are bound; variables of `target` are treated like constants.
/// Returns `false` if `pattern` cannot be mapped onto `target`.
pub fn match_term(pattern: &Term, target: &Term, substitution: &mut Substitution) -> bool {
    match (pattern, target) {
        (Term::Variable(variable), _) => match substitution.get(*variable) {
            Some(bound) => bound == target,
            None => {
                substitution.insert(*variable, target.clone());
                true
            }
        },
        (Term::Constant(pattern), Term::Constant(target)) => pattern == target,
        (Term::Function(pattern), Term::Function(target)) => {
            pattern.symbol() == target.symbol()
                && pattern.arguments().len() == target.arguments().len()
                && pattern
                    .arguments()
                    .iter()
                    .zip(target.arguments())
                    .all(|(pattern, target)| match_term(pattern, target, substitution))
        }
        _ => false,
    }
}

/// Extend `substitution` so that it maps `pattern` onto `target`.
///
/// See [match_term].
pub fn match_atom(pattern: &Atom, target: &Atom, substitution: &mut Substitution) -> bool {
    pattern.predicate() == target.predicate()
        && pattern.arity() == target.arity()
        && pattern
            .terms()
            .iter()
            .zip(target.terms())
            .all(|(pattern, target)| match_term(pattern, target, substitution))
}

#[cfg(test)]
mod test {
    use quickcheck_macros::quickcheck;
    use test_log::test;

    use crate::{
        logic::substitution::Substitution,
        model::{
            symbol::{Constant, FunctionSymbol, Predicate},
            Atom, Term, Variable,
        },
    };

    use super::{match_atom, unify, unify_atoms};

    fn x(id: u32) -> Term {
        Term::variable(id)
    }

    #[test]
    fn unify_binds_variables() {
        let f = FunctionSymbol::from_index(0);
        let a = Term::Constant(Constant::from_index(0));

        let left = Term::function(f, vec![x(0), a.clone()]);
        let right = Term::function(f, vec![x(1), x(0)]);

        let unifier = unify(&left, &right).unwrap();
        assert_eq!(unifier.apply_term(&left), unifier.apply_term(&right));
        assert_eq!(unifier.apply_term(&x(1)), a);
    }

    #[test]
    fn unify_fails_on_clashes() {
        let f = FunctionSymbol::from_index(0);
        let g = FunctionSymbol::from_index(1);
        let a = Term::Constant(Constant::from_index(0));
        let b = Term::Constant(Constant::from_index(1));

        assert!(unify(&a, &b).is_none());
        assert!(unify(&Term::function(f, vec![x(0)]), &Term::function(g, vec![x(0)])).is_none());
        assert!(unify(&Term::function(f, vec![x(0)]), &a).is_none());
        assert!(unify(
            &Term::function(f, vec![a.clone(), x(0)]),
            &Term::function(f, vec![x(0), b.clone()])
        )
        .is_none());
    }

    #[test]
    fn unify_rejects_cyclic_bindings() {
        let f = FunctionSymbol::from_index(0);
        let r = Predicate::from_index(0);

        let left = Atom::new(r, vec![x(0), Term::function(f, vec![x(0)])]);
        let right = Atom::new(r, vec![x(1), x(1)]);

        assert!(unify_atoms(&left, &right).is_none());
    }

    #[test]
    fn unify_atoms_requires_same_predicate() {
        let r = Predicate::from_index(0);
        let s = Predicate::from_index(1);

        assert!(unify_atoms(&Atom::new(r, vec![x(0)]), &Atom::new(s, vec![x(0)])).is_none());
        assert!(unify_atoms(&Atom::new(r, vec![x(0)]), &Atom::new(r, vec![x(1)])).is_some());
    }

    #[test]
    fn matching_is_one_way() {
        let r = Predicate::from_index(0);
        let f = FunctionSymbol::from_index(0);

        let general = Atom::new(r, vec![x(0), x(0)]);
        let specific = Atom::new(r, vec![Term::function(f, vec![x(0)]), Term::function(f, vec![x(0)])]);

        let mut substitution = Substitution::new();
        assert!(match_atom(&general, &specific, &mut substitution));
        assert_eq!(
            substitution.get(Variable::new(0)),
            Some(&Term::function(f, vec![x(0)]))
        );

        let mut substitution = Substitution::new();
        assert!(!match_atom(&specific, &general, &mut substitution));

        let mixed = Atom::new(r, vec![x(1), x(2)]);
        let mut substitution = Substitution::new();
        assert!(!match_atom(&general, &mixed, &mut substitution));
    }

    #[quickcheck]
    fn unifiers_are_idempotent_and_unify(left: Term, right: Term) -> bool {
        match unify(&left, &right) {
            Some(unifier) => {
                unifier.is_idempotent() && unifier.apply_term(&left) == unifier.apply_term(&right)
            }
            None => true,
        }
    }

    #[quickcheck]
    fn unification_is_symmetric(left: Term, right: Term) -> bool {
        unify(&left, &right).is_some() == unify(&right, &left).is_some()
    }
}
