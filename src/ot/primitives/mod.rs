//! Causality primitives: the version vector and the gap between two of
//! them.

pub mod difference;
pub mod state;
