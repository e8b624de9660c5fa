//! Domain types and ports of the embedded-page messaging bridge.

pub mod context;
pub mod event;
pub mod message;
pub mod ports;
