//! Application layer containing the messaging bridge.
//!
//! `Bridge` owns the outbound queue, the table of messages awaiting
//! acknowledgment and the readiness flag for one embedded page. `session`
//! drives a bridge from a stream of inbound payloads.

pub mod bridge;
pub mod session;
