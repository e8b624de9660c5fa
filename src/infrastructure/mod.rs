//! Concrete transports and inbound sources.

pub mod in_memory;
pub mod script;
pub mod stdio;
