//! Substitutions, unification and the normalization of input rules

pub mod normalization;
pub mod substitution;
pub mod unification;

pub use normalization::Normalizer;
pub use substitution::Substitution;
pub use unification::{match_atom, match_term, unify, unify_atoms};
