//! Saturation of existential rules
//!
//! This crate rewrites a set of existential rules (tuple-generating dependencies)
//! into a finite set of full rules that entails the same facts over every database.
//! Existential variables are skolemized and pushed through the full rules by
//! hyperresolution until no new, non-redundant rule can be derived.

#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts
)]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    variant_size_differences
)]

pub mod error;
pub mod filter;
pub mod index;
pub mod logic;
pub mod meta;
pub mod model;
pub mod parser;
pub mod saturation;
pub mod statistics;

pub use saturation::engine::{saturate, saturate_with, SaturationResult};
