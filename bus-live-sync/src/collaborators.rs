//! Seams to the external collaborators the poller depends on.

use crate::error::UpstreamError;
use crate::position::PositionRecord;
use async_trait::async_trait;
use std::collections::HashMap;

/// Route id to the vehicle ids currently operating it.
pub type VehicleMap = HashMap<String, Vec<String>>;

/// Resolves route ids to vehicle ids.
///
/// Implementations are free to cache the mapping; the poller calls
/// [`RouteResolver::resolve`] once per tick and looks its own route up in the
/// returned map. A missing entry and an empty list are both treated as a
/// resolution failure.
#[async_trait]
pub trait RouteResolver: Send + Sync {
    async fn resolve(&self, route_id: &str) -> Result<VehicleMap, UpstreamError>;
}

/// Fetches the current position records for one vehicle.
///
/// Timeouts are the implementation's business; the poller waits for every
/// fetch it issued to settle.
#[async_trait]
pub trait LocationFetcher: Send + Sync {
    async fn fetch(&self, vehicle_id: &str) -> Result<Vec<PositionRecord>, UpstreamError>;
}
