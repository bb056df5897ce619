//! Polling layer.
//!
//! One [`route_poller::RoutePoller`] per route drives the fetch-aggregate-notify
//! cycle on a fixed cadence. [`poller_pool::PollerPool`] guarantees that at most
//! one poller is responsible for a route at any time, and [`tick`] holds the
//! resolve/fetch/aggregate step that each tick performs.

pub(crate) mod poller_pool;
pub(crate) mod route_poller;
pub(crate) mod tick;
