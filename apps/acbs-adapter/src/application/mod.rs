//! Application layer - port definitions.

pub mod ports;
