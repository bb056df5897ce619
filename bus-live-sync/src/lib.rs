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

//! # bus-live-sync
//!
//! `bus-live-sync` keeps a per-route cache of live vehicle positions fresh by
//! polling an upstream location feed, and pushes every refresh to the route's
//! subscribers.
//!
//! Usage centers on [`LiveSync`]: hand it a [`RouteResolver`] (route to
//! vehicles) and a [`LocationFetcher`] (vehicle to positions), then subscribe
//! a [`PositionListener`] per route.
//!
//! ```
//! use async_trait::async_trait;
//! use bus_live_sync::{
//!     LiveSync, LiveSyncConfig, LocationFetcher, PositionRecord, RouteResolver, UpstreamError,
//!     VehicleMap,
//! };
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! struct OneBus;
//!
//! #[async_trait]
//! impl RouteResolver for OneBus {
//!     async fn resolve(&self, route_id: &str) -> Result<VehicleMap, UpstreamError> {
//!         Ok(HashMap::from([(route_id.to_string(), vec!["bus-7".to_string()])]))
//!     }
//! }
//!
//! #[async_trait]
//! impl LocationFetcher for OneBus {
//!     async fn fetch(&self, vehicle_id: &str) -> Result<Vec<PositionRecord>, UpstreamError> {
//!         Ok(vec![PositionRecord::new(35.1, 129.0, vehicle_id, "Central", "ST-1")])
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bus = Arc::new(OneBus);
//! let sync = LiveSync::new("quick-start", LiveSyncConfig::default(), bus.clone(), bus).unwrap();
//!
//! let handle = sync
//!     .subscribe_with(
//!         "101",
//!         |records| println!("{} vehicles", records.len()),
//!         |signal| eprintln!("{:?}", signal.message()),
//!     )
//!     .await;
//! assert!(sync.is_polling("101").await);
//!
//! assert!(sync.unsubscribe(&handle).await);
//! assert!(!sync.unsubscribe(&handle).await);
//! sync.shutdown().await;
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Facade: [`LiveSync`] owns everything below; there is no global state
//! - Cache: copy-on-write route to last known good positions
//! - Registry: route to listener slots, identity-based removal, one delivery
//!   queue per slot so listeners never hold up the poller
//! - Polling: one cancellable task per route and the pool that guarantees it
//! - Sync health: per-route bookkeeping of the latest poll outcomes
//!
//! ## Tick disciplines
//!
//! By default a route's next tick starts only after the previous one finished
//! ([`TickDiscipline::WaitForCompletion`]). [`TickDiscipline::FixedInterval`]
//! starts ticks on a strict clock and lets them overlap; an outcome older than
//! the newest settled one is discarded.
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod cache;
pub use cache::position_cache::CachedPositions;

mod collaborators;
pub use collaborators::{LocationFetcher, RouteResolver, VehicleMap};

mod config;
pub use config::{IdlePolicy, LiveSyncConfig, TickDiscipline, DEFAULT_POLL_INTERVAL_MS};

mod error;
pub use error::{ConfigError, TickFailure, UpstreamError};

mod listener;
pub use listener::{CallbackListener, ErrorSignal, PositionListener};

mod live_sync;
pub use live_sync::LiveSync;

#[doc(hidden)]
pub mod observability;
mod polling;

mod position;
pub use position::{PositionBatch, PositionRecord};

mod registry;
pub use registry::subscription_handle::SubscriptionHandle;

mod state;

mod sync_health;
pub use sync_health::RouteSyncHealth;
