//! The saturation of existential rules
//!
//! Non-full rules are combined with full rules by hyperresolution ([evolve])
//! until every derivable full rule is either stored or subsumed by a stored rule ([subsumption]).
//! The fixpoint loop itself lives in [engine].

pub mod engine;
pub mod evolve;
pub mod parameters;
pub mod subsumption;

pub use engine::{Saturation, SaturationStatus};
pub use parameters::{ProcessingOrder, SaturationParameters};
