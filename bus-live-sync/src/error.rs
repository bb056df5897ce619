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

//! Error types shared by collaborators, pollers and configuration.

use thiserror::Error;

/// Failure reported by an upstream collaborator (route resolver or location fetcher).
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum UpstreamError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// Why a single tick did not produce fresh positions for its route.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TickFailure {
    /// The route could not be mapped to at least one vehicle.
    #[error("no vehicle ids found for route {route_id}: {reason}")]
    Resolution { route_id: String, reason: String },
    /// Every vehicle fetch failed or returned zero records.
    #[error("no bus position data returned for route {route_id} ({failed} of {attempted} vehicle fetches failed)")]
    NoPositions {
        route_id: String,
        attempted: usize,
        failed: usize,
    },
    /// A tick panicked; the polling loop survived it.
    #[error("unexpected error while polling route {route_id}: {detail}")]
    Unexpected { route_id: String, detail: String },
}

impl TickFailure {
    pub fn route_id(&self) -> &str {
        match self {
            TickFailure::Resolution { route_id, .. }
            | TickFailure::NoPositions { route_id, .. }
            | TickFailure::Unexpected { route_id, .. } => route_id,
        }
    }
}

/// Rejected [`LiveSyncConfig`](crate::LiveSyncConfig) values.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}
