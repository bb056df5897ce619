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

use crate::error::TickFailure;
use crate::position::PositionBatch;
use async_trait::async_trait;

/// Error state pushed to listeners.
///
/// [`ErrorSignal::Cleared`] is sent after every successful tick so listeners that
/// track an error flag can reset it; a listener that has never seen a signal has
/// simply never been told anything.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorSignal {
    Cleared,
    Raised(TickFailure),
}

impl ErrorSignal {
    /// Human readable message, `None` when the error state was cleared.
    pub fn message(&self) -> Option<String> {
        match self {
            ErrorSignal::Cleared => None,
            ErrorSignal::Raised(failure) => Some(failure.to_string()),
        }
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, ErrorSignal::Cleared)
    }
}

/// [`PositionListener`] receives the position aggregates and error signals of
/// the route it was subscribed to.
///
/// Each subscription has its own delivery queue drained by its own task, so
/// calls to one subscription arrive one at a time in the order they were
/// queued, while different subscriptions run concurrently. A slow listener
/// delays only itself and the poller never waits for it.
///
/// The replay of cached data right after subscribing goes through the same
/// queue. A subscription never sees an aggregate older than one it already
/// received: if a tick lands before the replay is delivered, the older replay
/// is skipped.
#[async_trait]
pub trait PositionListener: Send + Sync {
    async fn on_data(&self, records: PositionBatch);

    async fn on_error(&self, signal: ErrorSignal);
}

/// Adapts a plain closure pair to [`PositionListener`].
///
/// # Examples
///
/// ```
/// use bus_live_sync::{CallbackListener, ErrorSignal, PositionBatch};
///
/// let _listener = CallbackListener::new(
///     |records: PositionBatch| println!("{} buses", records.len()),
///     |signal: ErrorSignal| {
///         if let Some(message) = signal.message() {
///             eprintln!("{message}");
///         }
///     },
/// );
/// ```
pub struct CallbackListener<D, E> {
    on_data: D,
    on_error: E,
}

impl<D, E> CallbackListener<D, E>
where
    D: Fn(PositionBatch) + Send + Sync,
    E: Fn(ErrorSignal) + Send + Sync,
{
    pub fn new(on_data: D, on_error: E) -> Self {
        Self { on_data, on_error }
    }
}

#[async_trait]
impl<D, E> PositionListener for CallbackListener<D, E>
where
    D: Fn(PositionBatch) + Send + Sync,
    E: Fn(ErrorSignal) + Send + Sync,
{
    async fn on_data(&self, records: PositionBatch) {
        (self.on_data)(records);
    }

    async fn on_error(&self, signal: ErrorSignal) {
        (self.on_error)(signal);
    }
}
