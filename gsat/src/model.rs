//! Representation of rules, atoms and terms used throughout the saturation

pub mod atom;
pub mod program;
pub mod raw;
pub mod rule;
pub mod symbol;
pub mod term;

pub use atom::Atom;
pub use program::RuleSet;
pub use raw::{RawAtom, RawRule, RawTerm};
pub use rule::{Rule, RuleKind};
pub use symbol::{Constant, FunctionSymbol, Predicate, SymbolDisplay, SymbolTable};
pub use term::{FunctionTerm, Term, Variable};
