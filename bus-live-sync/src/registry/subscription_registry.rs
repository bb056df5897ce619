//! Route -> listener registry with queued, per-listener delivery.

use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::listener::{ErrorSignal, PositionListener};
use crate::observability::{events, fields};
use crate::position::PositionBatch;
use crate::registry::subscription_handle::SubscriptionHandle;

const COMPONENT: &str = "subscription_registry";

enum Delivery {
    Data {
        records: PositionBatch,
        version: u64,
    },
    Error(ErrorSignal),
}

/// One registered listener: its delivery queue plus the flag that retires it.
///
/// Each slot owns a task that drains the queue in order, so a slow listener
/// only delays itself.
#[derive(Clone)]
pub(crate) struct ListenerSlot {
    id: Uuid,
    active: Arc<AtomicBool>,
    queue: UnboundedSender<Delivery>,
}

impl ListenerSlot {
    fn spawn(route_id: &str, id: Uuid, listener: Arc<dyn PositionListener>) -> Self {
        let (queue, pending) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));
        tokio::spawn(drain_deliveries(
            route_id.to_string(),
            id,
            listener,
            active.clone(),
            pending,
        ));
        Self { id, active, queue }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn retire(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Queues one aggregate written to the cache as `version`. Returns whether
    /// it was queued.
    pub(crate) fn enqueue_data(&self, records: PositionBatch, version: u64) -> bool {
        self.enqueue(Delivery::Data { records, version })
    }

    pub(crate) fn enqueue_error(&self, signal: ErrorSignal) -> bool {
        self.enqueue(Delivery::Error(signal))
    }

    fn enqueue(&self, delivery: Delivery) -> bool {
        self.is_active() && self.queue.send(delivery).is_ok()
    }
}

/// Invokes the listener for every queued delivery until the slot is retired or
/// every sender is gone.
///
/// Data older than what the listener already saw is skipped, so a late replay
/// never overwrites a fresher tick.
async fn drain_deliveries(
    route_id: String,
    id: Uuid,
    listener: Arc<dyn PositionListener>,
    active: Arc<AtomicBool>,
    mut pending: UnboundedReceiver<Delivery>,
) {
    let mut delivered_version = 0;

    while let Some(delivery) = pending.recv().await {
        if !active.load(Ordering::Acquire) {
            break;
        }

        let call = match delivery {
            Delivery::Data { records, version } => {
                if version <= delivered_version {
                    debug!(
                        event = events::DELIVERY_STALE_SKIPPED,
                        component = COMPONENT,
                        route_id = route_id.as_str(),
                        subscription_id = %id,
                        version,
                        delivered_version,
                        "listener already has newer positions"
                    );
                    continue;
                }
                delivered_version = version;
                listener.on_data(records)
            }
            Delivery::Error(signal) => listener.on_error(signal),
        };

        if let Err(panic) = AssertUnwindSafe(call).catch_unwind().await {
            warn!(
                event = events::LISTENER_PANICKED,
                component = COMPONENT,
                route_id = route_id.as_str(),
                subscription_id = %id,
                reason = %fields::describe_panic(panic.as_ref()),
                "listener panicked; delivery continues"
            );
        }
    }
}

/// Registry of listeners keyed by route id.
///
/// Every method is synchronous bookkeeping; listeners run on their own tasks.
pub(crate) struct SubscriptionRegistry {
    routes: Mutex<HashMap<String, Vec<ListenerSlot>>>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
        }
    }

    fn routes(&self) -> MutexGuard<'_, HashMap<String, Vec<ListenerSlot>>> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a listener and returns its handle and slot. Must be called
    /// inside a Tokio runtime.
    pub(crate) fn register(
        &self,
        route_id: &str,
        listener: Arc<dyn PositionListener>,
    ) -> (SubscriptionHandle, ListenerSlot) {
        let handle = SubscriptionHandle::mint(route_id);
        let slot = ListenerSlot::spawn(route_id, handle.id(), listener);

        let mut routes = self.routes();
        let slots = routes.entry(route_id.to_string()).or_default();
        slots.push(slot.clone());

        debug!(
            event = events::SUBSCRIBE,
            component = COMPONENT,
            route_id,
            subscription_id = %handle.id(),
            subscribers = slots.len(),
            "listener registered"
        );
        (handle, slot)
    }

    /// Removes exactly the registration behind `handle`. Returns `true` only the
    /// first time.
    pub(crate) fn remove(&self, handle: &SubscriptionHandle) -> bool {
        let mut routes = self.routes();

        let Some(slots) = routes.get_mut(handle.route_id()) else {
            debug!(
                event = events::UNSUBSCRIBE_UNKNOWN,
                component = COMPONENT,
                route_id = handle.route_id(),
                subscription_id = %handle.id(),
                "no listeners registered for route"
            );
            return false;
        };

        let Some(position) = slots.iter().position(|slot| slot.id == handle.id()) else {
            debug!(
                event = events::UNSUBSCRIBE_UNKNOWN,
                component = COMPONENT,
                route_id = handle.route_id(),
                subscription_id = %handle.id(),
                "subscription already removed"
            );
            return false;
        };

        let removed = slots.swap_remove(position);
        removed.retire();
        let remaining = slots.len();
        if remaining == 0 {
            routes.remove(handle.route_id());
        }

        debug!(
            event = events::UNSUBSCRIBE,
            component = COMPONENT,
            route_id = handle.route_id(),
            subscription_id = %handle.id(),
            subscribers = remaining,
            "listener removed"
        );
        true
    }

    pub(crate) fn subscriber_count(&self, route_id: &str) -> usize {
        self.routes().get(route_id).map_or(0, Vec::len)
    }

    /// Queues one aggregate for every listener registered at call time. Returns
    /// the number of listeners it was queued for.
    pub(crate) fn notify_data(
        &self,
        route_id: &str,
        records: &PositionBatch,
        version: u64,
    ) -> usize {
        self.routes().get(route_id).map_or(0, |slots| {
            slots
                .iter()
                .filter(|slot| slot.enqueue_data(records.clone(), version))
                .count()
        })
    }

    pub(crate) fn notify_error(&self, route_id: &str, signal: &ErrorSignal) -> usize {
        self.routes().get(route_id).map_or(0, |slots| {
            slots
                .iter()
                .filter(|slot| slot.enqueue_error(signal.clone()))
                .count()
        })
    }
}
