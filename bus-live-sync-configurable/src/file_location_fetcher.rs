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
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Serves vehicle positions from `<directory>/<vehicle id>.json`, each file a
/// JSON array of feed records. Files are re-read on every fetch so they can be
/// edited while the process runs.
pub struct FileLocationFetcher {
    directory: PathBuf,
}

impl FileLocationFetcher {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl LocationFetcher for FileLocationFetcher {
    async fn fetch(&self, vehicle_id: &str) -> Result<Vec<PositionRecord>, UpstreamError> {
        let path = self.directory.join(format!("{vehicle_id}.json"));
        debug!("reading vehicle feed file: {path:?}");

        let data = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => UpstreamError::NotFound(format!("vehicle {vehicle_id}")),
                _ => UpstreamError::Unavailable(format!("unable to read {path:?}: {e}")),
            })?;

        serde_json::from_str(&data)
            .map_err(|e| UpstreamError::Malformed(format!("vehicle {vehicle_id}: {e}")))
    }
}
