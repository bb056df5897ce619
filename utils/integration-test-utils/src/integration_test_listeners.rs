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

use async_trait::async_trait;
use bus_live_sync::{ErrorSignal, PositionBatch, PositionListener};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Default)]
struct Received {
    data: Vec<PositionBatch>,
    errors: Vec<ErrorSignal>,
}

/// Listener that records everything it is told, with async waits for tests.
#[derive(Default)]
pub struct RecordingListener {
    received: Mutex<Received>,
    changed: Notify,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> Vec<PositionBatch> {
        self.received.lock().unwrap().data.clone()
    }

    pub fn errors(&self) -> Vec<ErrorSignal> {
        self.received.lock().unwrap().errors.clone()
    }

    pub fn data_count(&self) -> usize {
        self.received.lock().unwrap().data.len()
    }

    /// Error signals other than `Cleared`.
    pub fn raised_count(&self) -> usize {
        self.received
            .lock()
            .unwrap()
            .errors
            .iter()
            .filter(|signal| !signal.is_cleared())
            .count()
    }

    pub fn last_data(&self) -> Option<PositionBatch> {
        self.received.lock().unwrap().data.last().cloned()
    }

    pub fn last_error(&self) -> Option<ErrorSignal> {
        self.received.lock().unwrap().errors.last().cloned()
    }

    /// Waits until at least `count` data deliveries arrived. Returns `false` on
    /// timeout.
    pub async fn wait_for_data(&self, count: usize, limit: Duration) -> bool {
        self.wait_until(limit, |received| received.data.len() >= count)
            .await
    }

    /// Waits until at least `count` error signals (of either kind) arrived.
    pub async fn wait_for_errors(&self, count: usize, limit: Duration) -> bool {
        self.wait_until(limit, |received| received.errors.len() >= count)
            .await
    }

    async fn wait_until(&self, limit: Duration, ready: impl Fn(&Received) -> bool) -> bool {
        let waiting = async {
            loop {
                let notified = self.changed.notified();
                if ready(&self.received.lock().unwrap()) {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(limit, waiting).await.is_ok()
    }
}

#[async_trait]
impl PositionListener for RecordingListener {
    async fn on_data(&self, records: PositionBatch) {
        debug!("within recording_listener! records: {}", records.len());
        self.received.lock().unwrap().data.push(records);
        self.changed.notify_waiters();
    }

    async fn on_error(&self, signal: ErrorSignal) {
        debug!("within recording_listener! signal: {signal:?}");
        self.received.lock().unwrap().errors.push(signal);
        self.changed.notify_waiters();
    }
}
