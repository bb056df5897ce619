use async_trait::async_trait;
use bus_live_sync::{ErrorSignal, PositionBatch, PositionListener};
use tracing::{info, warn};

/// Writes every delivery of one route to the log.
pub struct LoggingListener {
    route_id: String,
}

impl LoggingListener {
    pub fn new(route_id: &str) -> Self {
        Self {
            route_id: route_id.to_string(),
        }
    }
}

#[async_trait]
impl PositionListener for LoggingListener {
    async fn on_data(&self, records: PositionBatch) {
        info!(
            route_id = self.route_id.as_str(),
            records = records.len(),
            "positions updated"
        );
        for record in records.iter() {
            info!(
                route_id = self.route_id.as_str(),
                vehicle_id = record.vehicle_id.as_str(),
                latitude = record.latitude,
                longitude = record.longitude,
                stop = record.stop_name.as_str(),
                "vehicle position"
            );
        }
    }

    async fn on_error(&self, signal: ErrorSignal) {
        match signal {
            ErrorSignal::Cleared => {}
            ErrorSignal::Raised(failure) => {
                warn!(route_id = self.route_id.as_str(), err = %failure, "route sync failed")
            }
        }
    }
}
