//! Route-keyed pool of running pollers.

use crate::observability::events;
use crate::polling::route_poller::{PollSchedule, RoutePoller};
use crate::registry::subscription_registry::SubscriptionRegistry;
use crate::state::SharedState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const COMPONENT: &str = "poller_pool";

/// Owns at most one running poller per route.
///
/// Lock order is pool, then registry. The registry never calls back into the
/// pool, so checking the subscriber count while holding the pool lock cannot
/// deadlock.
pub(crate) struct PollerPool {
    schedule: PollSchedule,
    pollers: Mutex<HashMap<String, RoutePoller>>,
}

impl PollerPool {
    pub(crate) fn new(schedule: PollSchedule) -> Self {
        Self {
            schedule,
            pollers: Mutex::new(HashMap::new()),
        }
    }

    /// Makes sure a poller is running for `route_id`. Returns `true` when a new
    /// poller was spawned.
    ///
    /// A poller whose task already ended is replaced.
    pub(crate) async fn ensure(&self, route_id: &str, state: &Arc<SharedState>) -> bool {
        let mut pollers = self.pollers.lock().await;

        if let Some(existing) = pollers.get(route_id) {
            if !existing.is_finished() {
                debug!(
                    event = events::POLLER_REUSE,
                    component = COMPONENT,
                    route_id,
                    worker_id = existing.worker_id(),
                    "poller already running"
                );
                return false;
            }
        }

        let poller = RoutePoller::spawn(route_id, state.clone(), self.schedule);
        pollers.insert(route_id.to_string(), poller);
        true
    }

    /// Removes and cancels the route's poller if no subscriber is left.
    pub(crate) async fn release_if_idle(
        &self,
        route_id: &str,
        registry: &SubscriptionRegistry,
    ) -> Option<RoutePoller> {
        let mut pollers = self.pollers.lock().await;
        if !pollers.contains_key(route_id) {
            return None;
        }
        if registry.subscriber_count(route_id) > 0 {
            return None;
        }

        let poller = pollers.remove(route_id)?;
        poller.cancel();
        info!(
            event = events::POLLER_IDLE_STOP,
            component = COMPONENT,
            route_id,
            worker_id = poller.worker_id(),
            "last subscriber left; stopping poller"
        );
        Some(poller)
    }

    /// Removes and cancels the route's poller regardless of subscribers.
    pub(crate) async fn remove(&self, route_id: &str) -> Option<RoutePoller> {
        let poller = self.pollers.lock().await.remove(route_id)?;
        poller.cancel();
        info!(
            event = events::POLLER_STOP,
            component = COMPONENT,
            route_id,
            worker_id = poller.worker_id(),
            "stopping poller"
        );
        Some(poller)
    }

    /// Removes and cancels every poller.
    pub(crate) async fn drain(&self) -> Vec<RoutePoller> {
        let drained: Vec<RoutePoller> = self
            .pollers
            .lock()
            .await
            .drain()
            .map(|(_, poller)| poller)
            .collect();
        for poller in &drained {
            poller.cancel();
        }
        drained
    }

    pub(crate) async fn is_running(&self, route_id: &str) -> bool {
        self.pollers
            .lock()
            .await
            .get(route_id)
            .is_some_and(|poller| !poller.is_finished())
    }

    pub(crate) async fn routes(&self) -> Vec<String> {
        let mut routes: Vec<String> = self.pollers.lock().await.keys().cloned().collect();
        routes.sort();
        routes
    }
}
