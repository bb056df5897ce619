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

//! Resolve, fetch and aggregate step of a single tick.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::collaborators::{LocationFetcher, RouteResolver};
use crate::error::TickFailure;
use crate::observability::{events, fields};
use crate::position::PositionBatch;

const COMPONENT: &str = "tick";

/// Aggregate of one tick in which at least one record arrived.
#[derive(Debug)]
pub(crate) struct FetchSummary {
    pub(crate) records: PositionBatch,
    pub(crate) attempted: usize,
    pub(crate) failed: usize,
}

/// Vehicle counts carried by a failure, for health bookkeeping.
pub(crate) fn failure_counts(failure: &TickFailure) -> (usize, usize) {
    match failure {
        TickFailure::NoPositions {
            attempted, failed, ..
        } => (*attempted, *failed),
        TickFailure::Resolution { .. } | TickFailure::Unexpected { .. } => (0, 0),
    }
}

/// Resolves the route's vehicles, fetches all of them concurrently and
/// concatenates whatever succeeded.
///
/// Individual vehicle failures are logged and absorbed. The tick fails only when
/// the route cannot be resolved to at least one vehicle or when the aggregate
/// ends up empty.
pub(crate) async fn collect_positions(
    route_id: &str,
    resolver: &dyn RouteResolver,
    fetcher: &dyn LocationFetcher,
) -> Result<FetchSummary, TickFailure> {
    let vehicle_map = resolver.resolve(route_id).await.map_err(|err| {
        warn!(
            event = events::ROUTE_RESOLUTION_FAILED,
            component = COMPONENT,
            route_id,
            err = %err,
            "route resolver failed"
        );
        TickFailure::Resolution {
            route_id: route_id.to_string(),
            reason: err.to_string(),
        }
    })?;

    let vehicle_ids = match vehicle_map.get(route_id) {
        Some(vehicle_ids) if !vehicle_ids.is_empty() => vehicle_ids,
        _ => {
            warn!(
                event = events::ROUTE_RESOLUTION_FAILED,
                component = COMPONENT,
                route_id,
                reason = fields::REASON_NO_VEHICLES,
                "route resolved to no vehicles"
            );
            return Err(TickFailure::Resolution {
                route_id: route_id.to_string(),
                reason: fields::REASON_NO_VEHICLES.to_string(),
            });
        }
    };

    debug!(
        component = COMPONENT,
        route_id,
        vehicles = %fields::format_vehicle_ids(vehicle_ids),
        "fetching vehicle positions"
    );

    // join_all polls every fetch before any of them is awaited to completion.
    let results = join_all(
        vehicle_ids
            .iter()
            .map(|vehicle_id| fetcher.fetch(vehicle_id.as_str())),
    )
    .await;

    let attempted = vehicle_ids.len();
    let mut failed = 0;
    let mut records = Vec::new();
    for (vehicle_id, result) in vehicle_ids.iter().zip(results) {
        match result {
            Ok(mut vehicle_records) => records.append(&mut vehicle_records),
            Err(err) => {
                failed += 1;
                warn!(
                    event = events::VEHICLE_FETCH_FAILED,
                    component = COMPONENT,
                    route_id,
                    vehicle_id = vehicle_id.as_str(),
                    err = %err,
                    "vehicle fetch failed"
                );
            }
        }
    }

    if records.is_empty() {
        return Err(TickFailure::NoPositions {
            route_id: route_id.to_string(),
            attempted,
            failed,
        });
    }

    Ok(FetchSummary {
        records: records.into(),
        attempted,
        failed,
    })
}
