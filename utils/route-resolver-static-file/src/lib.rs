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
use bus_live_sync::{RouteResolver, UpstreamError, VehicleMap};
use serde_json::Value;
use std::fs::{self, canonicalize};
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Resolves routes from a JSON file mapping route ids to vehicle id arrays.
///
/// The file is read on first use; once it parsed successfully the mapping is
/// kept for the lifetime of the resolver. A failed read is retried on the next
/// call.
pub struct RouteResolverStaticFile {
    static_file: String,
    mapping: OnceCell<VehicleMap>,
}

impl RouteResolverStaticFile {
    pub fn new(static_file: String) -> Self {
        RouteResolverStaticFile {
            static_file,
            mapping: OnceCell::new(),
        }
    }

    fn load(&self) -> Result<VehicleMap, UpstreamError> {
        let route_json_file = PathBuf::from(self.static_file.clone());
        debug!("route_json_file: {route_json_file:?}");

        let route_json_file = canonicalize(route_json_file).map_err(|e| {
            UpstreamError::NotFound(format!("static route file {}: {e}", self.static_file))
        })?;

        let data = fs::read_to_string(route_json_file)
            .map_err(|e| UpstreamError::Unavailable(format!("unable to read file: {e}")))?;

        let res: Value = serde_json::from_str(&data)
            .map_err(|e| UpstreamError::Malformed(format!("unable to parse JSON: {e}")))?;

        let Some(obj) = res.as_object() else {
            return Err(UpstreamError::Malformed(
                "expected an object of route id to vehicle ids".to_string(),
            ));
        };

        let mut mapping = VehicleMap::new();
        for (route_id, value) in obj {
            let Some(array) = value.as_array() else {
                warn!("Skipping route '{route_id}': value is not an array");
                continue;
            };

            let mut vehicles = Vec::with_capacity(array.len());
            for vehicle in array {
                match vehicle.as_str() {
                    Some(vehicle_id) => vehicles.push(vehicle_id.to_string()),
                    None => warn!("Unable to parse vehicle '{vehicle}' of route '{route_id}'"),
                }
            }
            mapping.insert(route_id.clone(), vehicles);
        }

        debug!("Finished reading routes: {} entries", mapping.len());
        Ok(mapping)
    }
}

#[async_trait]
impl RouteResolver for RouteResolverStaticFile {
    async fn resolve(&self, route_id: &str) -> Result<VehicleMap, UpstreamError> {
        debug!("resolve for route: {route_id}");
        let mapping = self.mapping.get_or_try_init(|| async { self.load() }).await?;
        Ok(mapping.clone())
    }
}
