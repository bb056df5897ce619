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

//! Poller configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Poll cadence used when a configuration does not set one.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

/// How consecutive ticks of one route relate to each other.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TickDiscipline {
    /// Finish a tick, wait for whatever is left of the interval, repeat.
    /// Ticks of one route never overlap.
    #[default]
    WaitForCompletion,
    /// Start a tick every interval regardless of whether the previous one
    /// settled. Outcomes older than the newest settled tick are discarded.
    FixedInterval,
}

/// What happens to a route's poller when its last listener unsubscribes.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum IdlePolicy {
    /// Keep polling and refreshing the cache until stopped explicitly.
    #[default]
    KeepPolling,
    /// Cancel the poller with the last unsubscribe; the next subscribe restarts it.
    StopWhenIdle,
}

#[derive(Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LiveSyncConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub tick_discipline: TickDiscipline,
    #[serde(default)]
    pub idle_policy: IdlePolicy,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for LiveSyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            tick_discipline: TickDiscipline::default(),
            idle_policy: IdlePolicy::default(),
        }
    }
}

impl LiveSyncConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(poll_interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_tick_discipline(mut self, tick_discipline: TickDiscipline) -> Self {
        self.tick_discipline = tick_discipline;
        self
    }

    pub fn with_idle_policy(mut self, idle_policy: IdlePolicy) -> Self {
        self.idle_policy = idle_policy;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}
