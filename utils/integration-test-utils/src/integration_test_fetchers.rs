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
use bus_live_sync::{LocationFetcher, PositionRecord, UpstreamError};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// What one fetch of one vehicle does.
#[derive(Clone, Debug)]
pub enum FetchStep {
    Records(Vec<PositionRecord>),
    Fail(UpstreamError),
    /// Sleeps on the Tokio clock, then performs the inner step.
    Delayed(Duration, Box<FetchStep>),
    Panic(&'static str),
}

impl FetchStep {
    pub fn delayed(delay: Duration, then: FetchStep) -> Self {
        FetchStep::Delayed(delay, Box::new(then))
    }

    pub fn unavailable() -> Self {
        FetchStep::Fail(UpstreamError::Unavailable("vehicle feed timed out".to_string()))
    }
}

#[derive(Default)]
struct VehicleScript {
    queued: VecDeque<FetchStep>,
    fallback: Option<FetchStep>,
    calls: usize,
}

/// Fetcher whose per-vehicle behaviour is scripted by the test.
///
/// Queued steps are consumed one per call; once the queue is empty the
/// vehicle's persistent step applies. Vehicles with neither fail with
/// [`UpstreamError::NotFound`].
#[derive(Default)]
pub struct ScriptedLocationFetcher {
    scripts: Mutex<HashMap<String, VehicleScript>>,
}

impl ScriptedLocationFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the step used for every call once the queue is drained.
    pub fn set(&self, vehicle_id: &str, step: FetchStep) {
        self.scripts
            .lock()
            .unwrap()
            .entry(vehicle_id.to_string())
            .or_default()
            .fallback = Some(step);
    }

    /// Queues a step for the next call only.
    pub fn push(&self, vehicle_id: &str, step: FetchStep) {
        self.scripts
            .lock()
            .unwrap()
            .entry(vehicle_id.to_string())
            .or_default()
            .queued
            .push_back(step);
    }

    pub fn calls(&self, vehicle_id: &str) -> usize {
        self.scripts
            .lock()
            .unwrap()
            .get(vehicle_id)
            .map_or(0, |script| script.calls)
    }

    pub fn total_calls(&self) -> usize {
        self.scripts
            .lock()
            .unwrap()
            .values()
            .map(|script| script.calls)
            .sum()
    }

    fn next_step(&self, vehicle_id: &str) -> Option<FetchStep> {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts.entry(vehicle_id.to_string()).or_default();
        script.calls += 1;
        script
            .queued
            .pop_front()
            .or_else(|| script.fallback.clone())
    }
}

#[async_trait]
impl LocationFetcher for ScriptedLocationFetcher {
    async fn fetch(&self, vehicle_id: &str) -> Result<Vec<PositionRecord>, UpstreamError> {
        let mut step = self
            .next_step(vehicle_id)
            .ok_or_else(|| UpstreamError::NotFound(format!("vehicle {vehicle_id}")))?;

        loop {
            debug!("ScriptedLocationFetcher: {vehicle_id} -> {step:?}");
            match step {
                FetchStep::Records(records) => return Ok(records),
                FetchStep::Fail(err) => return Err(err),
                FetchStep::Delayed(delay, then) => {
                    tokio::time::sleep(delay).await;
                    step = *then;
                }
                FetchStep::Panic(message) => panic!("{message}"),
            }
        }
    }
}
