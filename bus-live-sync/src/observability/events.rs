//! Canonical structured event names used across `bus-live-sync`.

// Poller lifecycle events.
pub const POLLER_START: &str = "poller_start";
pub const POLLER_REUSE: &str = "poller_reuse";
pub const POLLER_STOP: &str = "poller_stop";
pub const POLLER_IDLE_STOP: &str = "poller_idle_stop";
pub const POLLER_EXIT: &str = "poller_exit";

// Tick events.
pub const TICK_START: &str = "tick_start";
pub const TICK_OK: &str = "tick_ok";
pub const TICK_FAILED: &str = "tick_failed";
pub const TICK_PANICKED: &str = "tick_panicked";
pub const TICK_STALE_DISCARDED: &str = "tick_stale_discarded";
pub const ROUTE_RESOLUTION_FAILED: &str = "route_resolution_failed";
pub const VEHICLE_FETCH_FAILED: &str = "vehicle_fetch_failed";
pub const CACHE_UPDATE: &str = "cache_update";

// Subscription lifecycle events.
pub const SUBSCRIBE: &str = "subscribe";
pub const UNSUBSCRIBE: &str = "unsubscribe";
pub const UNSUBSCRIBE_UNKNOWN: &str = "unsubscribe_unknown";
pub const REPLAY_SCHEDULED: &str = "replay_scheduled";
pub const REPLAY_SKIPPED: &str = "replay_skipped";
pub const DELIVERY_STALE_SKIPPED: &str = "delivery_stale_skipped";
pub const LISTENER_PANICKED: &str = "listener_panicked";

// Context lifecycle events.
pub const LIVE_SYNC_CREATED: &str = "live_sync_created";
pub const SHUTDOWN: &str = "shutdown";
