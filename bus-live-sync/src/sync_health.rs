//! Per-route sync-health metadata for poll attempts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RouteSyncHealth {
    pub last_attempt_at: Option<SystemTime>,
    pub last_success_at: Option<SystemTime>,
    pub last_attempt_succeeded: Option<bool>,
    pub consecutive_failures: u32,
    /// Vehicles the last attempt tried to fetch.
    pub last_vehicle_count: usize,
    /// Vehicle fetches of the last attempt that failed.
    pub last_failed_vehicle_count: usize,
}

/// Health records for every polled route, written only by each route's poller.
pub(crate) struct SyncHealthBoard {
    routes: Mutex<HashMap<String, RouteSyncHealth>>,
}

impl SyncHealthBoard {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
        }
    }

    fn routes(&self) -> MutexGuard<'_, HashMap<String, RouteSyncHealth>> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record_success(&self, route_id: &str, vehicles: usize, failed: usize) {
        let now = SystemTime::now();
        let mut routes = self.routes();
        let health = routes.entry(route_id.to_string()).or_default();
        health.last_attempt_at = Some(now);
        health.last_success_at = Some(now);
        health.last_attempt_succeeded = Some(true);
        health.consecutive_failures = 0;
        health.last_vehicle_count = vehicles;
        health.last_failed_vehicle_count = failed;
    }

    pub(crate) fn record_failure(&self, route_id: &str, vehicles: usize, failed: usize) {
        let mut routes = self.routes();
        let health = routes.entry(route_id.to_string()).or_default();
        health.last_attempt_at = Some(SystemTime::now());
        health.last_attempt_succeeded = Some(false);
        health.consecutive_failures = health.consecutive_failures.saturating_add(1);
        health.last_vehicle_count = vehicles;
        health.last_failed_vehicle_count = failed;
    }

    pub(crate) fn get(&self, route_id: &str) -> Option<RouteSyncHealth> {
        self.routes().get(route_id).cloned()
    }
}
