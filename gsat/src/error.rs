//! Error-handling module for the crate

use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseError;

/// Error-Collection for all the possible Errors occurring in this crate
///
/// Failing unifications, hyperresolution attempts without result
/// and discarded rules are part of the normal operation of the saturation
/// and are never reported through this type.
#[allow(variant_size_differences)]
#[derive(Error, Debug)]
pub enum Error {
    /// A symbol is used with two different arities
    #[error("`{symbol}` is used with arity {found} but was already used with arity {expected} (in rule `{rule}`)")]
    ArityMismatch {
        /// Name of the offending symbol
        symbol: String,
        /// Arity the symbol was first used with
        expected: usize,
        /// Arity of the offending occurrence
        found: usize,
        /// The rule containing the offending occurrence
        rule: String,
    },
    /// A rule without head atoms
    #[error("rule `{rule}` has an empty head")]
    EmptyHead {
        /// The offending rule
        rule: String,
    },
    /// An existential variable in a rule that shares no variable between body and head
    #[error("existential variable `{variable}` cannot be skolemized because rule `{rule}` has an empty frontier")]
    ExistentialWithoutFrontier {
        /// Name of the existential variable
        variable: String,
        /// The offending rule
        rule: String,
    },
    /// Parse errors
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Errors on reading a rule file
    #[error("Failed to read \"{filename}\": {error}.")]
    IOReading {
        /// Contains the wrapped error
        error: std::io::Error,
        /// Filename which caused the error
        filename: PathBuf,
    },
    /// IO Error
    #[error(transparent)]
    IO(#[from] std::io::Error),
}
