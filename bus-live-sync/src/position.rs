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

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One observation of one vehicle at one moment.
///
/// Deserialization accepts both the crate's own field names and the field names
/// used by the upstream vehicle-location feed (`gpslati`, `gpslong`, `vehicleno`,
/// `nodenm`, `nodeid`).
///
/// # Examples
///
/// ```
/// use bus_live_sync::PositionRecord;
///
/// let from_feed: PositionRecord = serde_json::from_str(
///     r#"{"gpslati": 36.35, "gpslong": 127.38, "vehicleno": "V-1", "nodenm": "City Hall", "nodeid": "N-7"}"#,
/// )
/// .unwrap();
///
/// assert_eq!(
///     from_feed,
///     PositionRecord::new(36.35, 127.38, "V-1", "City Hall", "N-7")
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    #[serde(alias = "gpslati")]
    pub latitude: f64,
    #[serde(alias = "gpslong")]
    pub longitude: f64,
    #[serde(alias = "vehicleno")]
    pub vehicle_id: String,
    #[serde(alias = "nodenm")]
    pub stop_name: String,
    #[serde(alias = "nodeid")]
    pub stop_id: String,
}

impl PositionRecord {
    pub fn new(
        latitude: f64,
        longitude: f64,
        vehicle_id: &str,
        stop_name: &str,
        stop_id: &str,
    ) -> Self {
        Self {
            latitude,
            longitude,
            vehicle_id: vehicle_id.to_string(),
            stop_name: stop_name.to_string(),
            stop_id: stop_id.to_string(),
        }
    }
}

/// Immutable aggregate shared between the cache and every listener of a route.
pub type PositionBatch = Arc<[PositionRecord]>;
