//! Last-known-good position storage.
//!
//! One entry per route, holding the most recent successful aggregate. Entries
//! never expire: during upstream outages the stale aggregate stays visible until
//! the next successful tick replaces it.

pub(crate) mod position_cache;
