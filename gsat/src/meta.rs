//! Utilities for measuring the saturation

pub mod timing;
