/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! The [`LiveSync`] context: the public entry point tying cache, registry and
//! pollers together.

use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::position_cache::CachedPositions;
use crate::collaborators::{LocationFetcher, RouteResolver};
use crate::config::{IdlePolicy, LiveSyncConfig};
use crate::error::ConfigError;
use crate::listener::{CallbackListener, ErrorSignal, PositionListener};
use crate::observability::events;
use crate::polling::poller_pool::PollerPool;
use crate::polling::route_poller::PollSchedule;
use crate::position::PositionBatch;
use crate::registry::subscription_handle::SubscriptionHandle;
use crate::registry::subscription_registry::ListenerSlot;
use crate::state::SharedState;
use crate::sync_health::RouteSyncHealth;

const COMPONENT: &str = "live_sync";

/// Keeps per-route vehicle positions fresh and pushes them to subscribers.
///
/// Subscribing to a route starts (or reuses) exactly one poller for it. Every
/// tick resolves the route's vehicles, fetches them concurrently, stores the
/// aggregate as the route's last known good positions and fans it out to the
/// route's listeners. A failed tick leaves the cache untouched and raises an
/// [`ErrorSignal`] instead.
///
/// All state lives in this value; independent instances share nothing. It must
/// be created and used inside a Tokio runtime.
pub struct LiveSync {
    name: String,
    config: LiveSyncConfig,
    state: Arc<SharedState>,
    pollers: PollerPool,
}

impl LiveSync {
    pub fn new(
        name: &str,
        config: LiveSyncConfig,
        resolver: Arc<dyn RouteResolver>,
        fetcher: Arc<dyn LocationFetcher>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let schedule = PollSchedule {
            period: config.poll_interval(),
            discipline: config.tick_discipline,
        };
        info!(
            event = events::LIVE_SYNC_CREATED,
            component = COMPONENT,
            name,
            poll_interval_ms = config.poll_interval_ms,
            tick_discipline = ?config.tick_discipline,
            idle_policy = ?config.idle_policy,
            "live sync ready"
        );

        Ok(Self {
            name: name.to_string(),
            config,
            state: Arc::new(SharedState::new(resolver, fetcher)),
            pollers: PollerPool::new(schedule),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LiveSyncConfig {
        &self.config
    }

    /// Registers `listener` for `route_id` and makes sure the route is polled.
    ///
    /// If the route already has cached positions they are replayed to this
    /// listener only, through its delivery queue, so never before this call
    /// returns control to the runtime.
    pub async fn subscribe(
        &self,
        route_id: &str,
        listener: Arc<dyn PositionListener>,
    ) -> SubscriptionHandle {
        let (handle, slot) = self.state.registry.register(route_id, listener);
        self.queue_replay(route_id, &slot);
        self.pollers.ensure(route_id, &self.state).await;
        handle
    }

    /// [`subscribe`](Self::subscribe) for a plain pair of closures.
    pub async fn subscribe_with<D, E>(
        &self,
        route_id: &str,
        on_data: D,
        on_error: E,
    ) -> SubscriptionHandle
    where
        D: Fn(PositionBatch) + Send + Sync + 'static,
        E: Fn(ErrorSignal) + Send + Sync + 'static,
    {
        self.subscribe(route_id, Arc::new(CallbackListener::new(on_data, on_error)))
            .await
    }

    /// Removes exactly the registration behind `handle`. Calling it again is a
    /// no-op returning `false`.
    ///
    /// Deliveries still queued for the listener are dropped; a call already
    /// running is left to finish.
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let removed = self.state.registry.remove(handle);
        if removed && self.config.idle_policy == IdlePolicy::StopWhenIdle {
            if let Some(poller) = self
                .pollers
                .release_if_idle(handle.route_id(), &self.state.registry)
                .await
            {
                poller.stop().await;
            }
        }
        removed
    }

    /// Last known good positions for `route_id`.
    pub fn cached_positions(&self, route_id: &str) -> Option<PositionBatch> {
        self.state.cache.get(route_id)
    }

    /// Like [`cached_positions`](Self::cached_positions), with the write
    /// version and timestamp.
    pub fn cached_entry(&self, route_id: &str) -> Option<Arc<CachedPositions>> {
        self.state.cache.entry(route_id)
    }

    /// Routes with cached positions, sorted.
    pub fn cached_routes(&self) -> Vec<String> {
        let mut routes = self.state.cache.routes();
        routes.sort();
        routes
    }

    /// Starts polling `route_id` without subscribing. Returns `true` when a new
    /// poller was spawned.
    pub async fn start_polling(&self, route_id: &str) -> bool {
        self.pollers.ensure(route_id, &self.state).await
    }

    /// Stops the route's poller and waits for it to exit. Subscribers stay
    /// registered and keep the cached positions.
    pub async fn stop_polling(&self, route_id: &str) -> bool {
        match self.pollers.remove(route_id).await {
            Some(poller) => {
                poller.stop().await;
                true
            }
            None => false,
        }
    }

    pub async fn is_polling(&self, route_id: &str) -> bool {
        self.pollers.is_running(route_id).await
    }

    /// Routes with a poller, sorted.
    pub async fn polled_routes(&self) -> Vec<String> {
        self.pollers.routes().await
    }

    pub fn subscriber_count(&self, route_id: &str) -> usize {
        self.state.registry.subscriber_count(route_id)
    }

    pub fn sync_health(&self, route_id: &str) -> Option<RouteSyncHealth> {
        self.state.health.get(route_id)
    }

    /// Cancels every poller and waits for all of them to exit.
    pub async fn shutdown(&self) {
        let pollers = self.pollers.drain().await;
        let stopped = pollers.len();
        for poller in pollers {
            poller.stop().await;
        }
        info!(
            event = events::SHUTDOWN,
            component = COMPONENT,
            name = self.name.as_str(),
            stopped,
            "all pollers stopped"
        );
    }

    /// Queues the cached aggregate for a freshly registered slot. The slot is
    /// already visible to ticks, so it receives every newer write as well and
    /// drops this replay if one of those arrives first.
    fn queue_replay(&self, route_id: &str, slot: &ListenerSlot) {
        let Some(entry) = self.state.cache.entry(route_id) else {
            debug!(
                event = events::REPLAY_SKIPPED,
                component = COMPONENT,
                route_id,
                "nothing cached yet"
            );
            return;
        };

        if slot.enqueue_data(entry.records.clone(), entry.version) {
            debug!(
                event = events::REPLAY_SCHEDULED,
                component = COMPONENT,
                route_id,
                version = entry.version,
                "replaying cached positions to new subscriber"
            );
        }
    }
}
