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

//! Per-route periodic task.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::TickDiscipline;
use crate::error::TickFailure;
use crate::listener::ErrorSignal;
use crate::observability::{events, fields};
use crate::polling::tick::{collect_positions, failure_counts, FetchSummary};
use crate::state::SharedState;

const COMPONENT: &str = "route_poller";

/// Cadence settings handed to every poller.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PollSchedule {
    pub(crate) period: Duration,
    pub(crate) discipline: TickDiscipline,
}

/// Handle to one route's running poll loop. Dropping it cancels the loop.
pub(crate) struct RoutePoller {
    worker_id: String,
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl RoutePoller {
    /// Spawns the poll loop on the current Tokio runtime. The first tick runs
    /// immediately.
    pub(crate) fn spawn(route_id: &str, state: Arc<SharedState>, schedule: PollSchedule) -> Self {
        let worker_id = Uuid::new_v4().hyphenated().to_string();
        let cancel = CancellationToken::new();
        let worker = TickWorker {
            route_id: route_id.to_string(),
            worker_id: worker_id.clone(),
            state,
            latest_settled: Arc::new(Mutex::new(0)),
        };

        info!(
            event = events::POLLER_START,
            component = COMPONENT,
            route_id,
            worker_id = worker_id.as_str(),
            period_ms = u64::try_from(schedule.period.as_millis()).unwrap_or(u64::MAX),
            discipline = ?schedule.discipline,
            "starting route poller"
        );

        let join = match schedule.discipline {
            TickDiscipline::WaitForCompletion => {
                tokio::spawn(sequential_loop(worker, schedule.period, cancel.clone()))
            }
            TickDiscipline::FixedInterval => {
                tokio::spawn(overlapping_loop(worker, schedule.period, cancel.clone()))
            }
        };

        Self {
            worker_id,
            cancel,
            join: Some(join),
        }
    }

    pub(crate) fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signals the loop to exit without waiting for it.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancels the loop and waits for it to exit. Ticks in flight are dropped.
    pub(crate) async fn stop(mut self) {
        self.cancel();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                if err.is_panic() {
                    error!(
                        event = events::POLLER_EXIT,
                        component = COMPONENT,
                        worker_id = self.worker_id.as_str(),
                        err = %err,
                        "poll loop panicked"
                    );
                }
            }
        }
    }
}

impl Drop for RoutePoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Finish a tick, wait for the rest of the interval, repeat.
async fn sequential_loop(worker: TickWorker, period: Duration, cancel: CancellationToken) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        tick += 1;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = worker.run_tick(tick) => {}
        }
    }

    worker.log_exit(tick);
}

/// Start a tick every interval; earlier ticks may still be in flight.
async fn overlapping_loop(worker: TickWorker, period: Duration, cancel: CancellationToken) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight = JoinSet::new();
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            _ = interval.tick() => {
                tick += 1;
                let tick_worker = worker.clone();
                in_flight.spawn(async move { tick_worker.run_tick(tick).await });
            }
        }
    }

    in_flight.abort_all();
    worker.log_exit(tick);
}

#[derive(Clone)]
struct TickWorker {
    route_id: String,
    worker_id: String,
    state: Arc<SharedState>,
    /// Newest tick whose outcome has been applied.
    latest_settled: Arc<Mutex<u64>>,
}

impl TickWorker {
    async fn run_tick(&self, tick: u64) {
        let route_id = self.route_id.as_str();
        debug!(
            event = events::TICK_START,
            component = COMPONENT,
            route_id,
            worker_id = self.worker_id.as_str(),
            tick,
            "tick started"
        );

        let collected = AssertUnwindSafe(collect_positions(
            route_id,
            self.state.resolver.as_ref(),
            self.state.fetcher.as_ref(),
        ))
        .catch_unwind()
        .await;

        let outcome = match collected {
            Ok(outcome) => outcome,
            Err(panic) => {
                let detail = fields::describe_panic(panic.as_ref());
                error!(
                    event = events::TICK_PANICKED,
                    component = COMPONENT,
                    route_id,
                    worker_id = self.worker_id.as_str(),
                    tick,
                    reason = detail.as_str(),
                    "tick panicked; polling continues"
                );
                Err(TickFailure::Unexpected {
                    route_id: self.route_id.clone(),
                    detail,
                })
            }
        };

        match outcome {
            Ok(summary) => self.publish(tick, summary),
            Err(failure) => self.report(tick, failure),
        }
    }

    /// Marks `tick` as the newest settled tick and runs `apply` under the same
    /// guard. Returns `false` when a newer tick already settled.
    fn settle(&self, tick: u64, apply: impl FnOnce()) -> bool {
        let mut latest = self
            .latest_settled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *latest >= tick {
            return false;
        }
        *latest = tick;
        apply();
        true
    }

    fn log_stale(&self, tick: u64) {
        debug!(
            event = events::TICK_STALE_DISCARDED,
            component = COMPONENT,
            route_id = self.route_id.as_str(),
            worker_id = self.worker_id.as_str(),
            tick,
            "newer tick already settled; discarding outcome"
        );
    }

    /// Applies a successful tick: cache, health and listener queues change
    /// together under the settle guard, with no await in between.
    fn publish(&self, tick: u64, summary: FetchSummary) {
        let route_id = self.route_id.as_str();
        let state = self.state.as_ref();
        let mut version = 0;
        let mut subscribers = 0;
        let applied = self.settle(tick, || {
            version = state.cache.set(route_id, summary.records.clone());
            state
                .health
                .record_success(route_id, summary.attempted, summary.failed);
            subscribers = state
                .registry
                .notify_data(route_id, &summary.records, version);
            state.registry.notify_error(route_id, &ErrorSignal::Cleared);
        });
        if !applied {
            self.log_stale(tick);
            return;
        }

        info!(
            event = events::TICK_OK,
            component = COMPONENT,
            route_id,
            worker_id = self.worker_id.as_str(),
            tick,
            version,
            records = summary.records.len(),
            vehicles = summary.attempted,
            failed = summary.failed,
            subscribers,
            "tick published positions"
        );
    }

    fn report(&self, tick: u64, failure: TickFailure) {
        let route_id = self.route_id.as_str();
        let state = self.state.as_ref();
        let (attempted, failed) = failure_counts(&failure);
        let applied = self.settle(tick, || {
            state.health.record_failure(route_id, attempted, failed);
            state
                .registry
                .notify_error(route_id, &ErrorSignal::Raised(failure.clone()));
        });
        if !applied {
            self.log_stale(tick);
            return;
        }

        warn!(
            event = events::TICK_FAILED,
            component = COMPONENT,
            route_id,
            worker_id = self.worker_id.as_str(),
            tick,
            err = %failure,
            "tick failed; keeping cached positions"
        );
    }

    fn log_exit(&self, ticks: u64) {
        debug!(
            event = events::POLLER_EXIT,
            component = COMPONENT,
            route_id = self.route_id.as_str(),
            worker_id = self.worker_id.as_str(),
            ticks,
            reason = fields::REASON_CANCELLED,
            "poll loop exited"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{PollSchedule, RoutePoller};
    use crate::collaborators::{LocationFetcher, RouteResolver, VehicleMap};
    use crate::config::TickDiscipline;
    use crate::error::UpstreamError;
    use crate::listener::{ErrorSignal, PositionListener};
    use crate::position::{PositionBatch, PositionRecord};
    use crate::state::SharedState;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct OneVehicle;

    #[async_trait]
    impl RouteResolver for OneVehicle {
        async fn resolve(&self, route_id: &str) -> Result<VehicleMap, UpstreamError> {
            Ok(HashMap::from([(route_id.to_string(), vec!["v1".to_string()])]))
        }
    }

    /// Each call sleeps, then reports the call number as the latitude.
    struct SlowCounter {
        calls: AtomicUsize,
        delays: Vec<Duration>,
    }

    #[async_trait]
    impl LocationFetcher for SlowCounter {
        async fn fetch(&self, vehicle_id: &str) -> Result<Vec<PositionRecord>, UpstreamError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delays.get(call).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            Ok(vec![PositionRecord::new(
                call as f64,
                0.0,
                vehicle_id,
                "Stop",
                "S-1",
            )])
        }
    }

    struct PanickingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LocationFetcher for PanickingFetcher {
        async fn fetch(&self, _vehicle_id: &str) -> Result<Vec<PositionRecord>, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("fetcher bug");
        }
    }

    /// Sleeps a minute on every call.
    struct StalledListener;

    #[async_trait]
    impl PositionListener for StalledListener {
        async fn on_data(&self, _records: PositionBatch) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }

        async fn on_error(&self, _signal: ErrorSignal) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }

    #[derive(Default)]
    struct CountingListener {
        data: AtomicUsize,
        cleared: AtomicUsize,
    }

    #[async_trait]
    impl PositionListener for CountingListener {
        async fn on_data(&self, _records: PositionBatch) {
            self.data.fetch_add(1, Ordering::SeqCst);
        }

        async fn on_error(&self, signal: ErrorSignal) {
            if signal.is_cleared() {
                self.cleared.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn state_with(fetcher: Arc<dyn LocationFetcher>) -> Arc<SharedState> {
        Arc::new(SharedState::new(Arc::new(OneVehicle), fetcher))
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_fires_immediately() {
        let fetcher = Arc::new(SlowCounter {
            calls: AtomicUsize::new(0),
            delays: Vec::new(),
        });
        let state = state_with(fetcher.clone());
        let poller = RoutePoller::spawn(
            "101",
            state.clone(),
            PollSchedule {
                period: Duration::from_secs(10),
                discipline: TickDiscipline::WaitForCompletion,
            },
        );

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(state.cache.get("101").is_some());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_further_ticks() {
        let fetcher = Arc::new(SlowCounter {
            calls: AtomicUsize::new(0),
            delays: Vec::new(),
        });
        let poller = RoutePoller::spawn(
            "101",
            state_with(fetcher.clone()),
            PollSchedule {
                period: Duration::from_secs(1),
                discipline: TickDiscipline::WaitForCompletion,
            },
        );

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!poller.is_finished());
        poller.stop().await;
        let calls_at_stop = fetcher.calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), calls_at_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_loop() {
        let fetcher = Arc::new(SlowCounter {
            calls: AtomicUsize::new(0),
            delays: Vec::new(),
        });
        let poller = RoutePoller::spawn(
            "101",
            state_with(fetcher.clone()),
            PollSchedule {
                period: Duration::from_secs(1),
                discipline: TickDiscipline::WaitForCompletion,
            },
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(poller);
        let calls_at_drop = fetcher.calls.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), calls_at_drop);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_ticks_never_overlap() {
        // The first fetch outlives two intervals.
        let fetcher = Arc::new(SlowCounter {
            calls: AtomicUsize::new(0),
            delays: vec![Duration::from_secs(25)],
        });
        let poller = RoutePoller::spawn(
            "101",
            state_with(fetcher.clone()),
            PollSchedule {
                period: Duration::from_secs(10),
                discipline: TickDiscipline::WaitForCompletion,
            },
        );

        tokio::time::sleep(Duration::from_secs(24)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_ticks_discard_stale_outcomes() {
        // Tick 1 is slow and settles after tick 2; its outcome must not win.
        let fetcher = Arc::new(SlowCounter {
            calls: AtomicUsize::new(0),
            delays: vec![Duration::from_secs(15), Duration::from_secs(1)],
        });
        let state = state_with(fetcher.clone());
        let poller = RoutePoller::spawn(
            "101",
            state.clone(),
            PollSchedule {
                period: Duration::from_secs(10),
                discipline: TickDiscipline::FixedInterval,
            },
        );

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.cache.get("101").unwrap()[0].latitude, 1.0);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(state.cache.get("101").unwrap()[0].latitude, 1.0);

        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_tick_does_not_end_the_loop() {
        let fetcher = Arc::new(PanickingFetcher {
            calls: AtomicUsize::new(0),
        });
        let state = state_with(fetcher.clone());
        let poller = RoutePoller::spawn(
            "101",
            state.clone(),
            PollSchedule {
                period: Duration::from_secs(1),
                discipline: TickDiscipline::WaitForCompletion,
            },
        );

        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert!(!poller.is_finished());
        let health = state.health.get("101").unwrap();
        assert_eq!(health.consecutive_failures, 3);
        assert!(state.cache.get("101").is_none());

        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_listener_does_not_delay_the_next_tick() {
        let fetcher = Arc::new(SlowCounter {
            calls: AtomicUsize::new(0),
            delays: Vec::new(),
        });
        let state = state_with(fetcher.clone());
        let counting = Arc::new(CountingListener::default());
        state.registry.register("101", Arc::new(StalledListener));
        state.registry.register("101", counting.clone());

        let poller = RoutePoller::spawn(
            "101",
            state.clone(),
            PollSchedule {
                period: Duration::from_secs(10),
                discipline: TickDiscipline::WaitForCompletion,
            },
        );

        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        assert_eq!(counting.data.load(Ordering::SeqCst), 3);
        assert_eq!(counting.cleared.load(Ordering::SeqCst), 3);

        poller.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_after_a_tick_keeps_cache_health_and_deliveries_together() {
        let fetcher = Arc::new(SlowCounter {
            calls: AtomicUsize::new(0),
            delays: Vec::new(),
        });
        let state = state_with(fetcher.clone());
        let counting = Arc::new(CountingListener::default());
        state.registry.register("101", Arc::new(StalledListener));
        state.registry.register("101", counting.clone());

        let poller = RoutePoller::spawn(
            "101",
            state.clone(),
            PollSchedule {
                period: Duration::from_secs(10),
                discipline: TickDiscipline::WaitForCompletion,
            },
        );
        // Let the first tick settle, then stop while one listener is still busy.
        tokio::time::sleep(Duration::from_millis(1)).await;
        poller.stop().await;

        assert!(state.cache.get("101").is_some());
        let health = state.health.get("101").expect("success recorded");
        assert_eq!(health.last_attempt_succeeded, Some(true));
        assert_eq!(health.consecutive_failures, 0);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(counting.data.load(Ordering::SeqCst), 1);
        assert_eq!(counting.cleared.load(Ordering::SeqCst), 1);
    }
}
