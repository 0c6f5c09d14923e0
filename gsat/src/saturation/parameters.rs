//! This module defines [SaturationParameters].

use std::time::Duration;

/// Order in which rules are taken from the worklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingOrder {
    /// Oldest rule first
    #[default]
    Fifo,
    /// Newest rule first
    Lifo,
}

/// External parameters affecting the saturation
#[derive(Debug, Clone, Copy, Default)]
pub struct SaturationParameters {
    /// Maximal number of rules taken from the worklist
    pub(crate) step_limit: Option<usize>,
    /// Maximal wall-clock time of the saturation loop
    pub(crate) time_limit: Option<Duration>,
    /// Order of the worklist
    pub(crate) order: ProcessingOrder,
}

impl SaturationParameters {
    /// Set the maximal number of rules taken from the worklist.
    pub fn set_step_limit(&mut self, limit: Option<usize>) {
        self.step_limit = limit;
    }

    /// Set the maximal wall-clock time of the saturation loop.
    pub fn set_time_limit(&mut self, limit: Option<Duration>) {
        self.time_limit = limit;
    }

    /// Set the order in which rules are taken from the worklist.
    pub fn set_order(&mut self, order: ProcessingOrder) {
        self.order = order;
    }

    /// Builder-style variant of [SaturationParameters::set_step_limit].
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Builder-style variant of [SaturationParameters::set_time_limit].
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Builder-style variant of [SaturationParameters::set_order].
    pub fn with_order(mut self, order: ProcessingOrder) -> Self {
        self.order = order;
        self
    }

    /// Return the step limit.
    pub fn step_limit(&self) -> Option<usize> {
        self.step_limit
    }

    /// Return the time limit.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Return the processing order.
    pub fn order(&self) -> ProcessingOrder {
        self.order
    }
}
