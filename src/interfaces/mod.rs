//! Adapters between the bridge and the outside world.

pub mod cli;
pub mod json;
