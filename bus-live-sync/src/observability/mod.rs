//! Structured logging vocabulary.
//!
//! Library code emits `tracing` events named from [`events`] with values
//! formatted by [`fields`]; it never installs a global subscriber. Binaries and
//! tests initialize `tracing_subscriber` once at process start.

pub mod events;
pub mod fields;
