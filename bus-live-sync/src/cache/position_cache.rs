//! Copy-on-write route -> positions map with lock-free reads.

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

use crate::observability::events;
use crate::position::PositionBatch;

const COMPONENT: &str = "position_cache";

/// One cached aggregate and when it was written.
#[derive(Clone, Debug)]
pub struct CachedPositions {
    pub records: PositionBatch,
    /// Cache-wide write counter; larger means written later.
    pub version: u64,
    pub updated_at: SystemTime,
}

type CacheMap = HashMap<String, Arc<CachedPositions>>;

pub(crate) struct PositionCache {
    snapshot: ArcSwap<CacheMap>,
    next_version: AtomicU64,
}

impl PositionCache {
    pub(crate) fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
            next_version: AtomicU64::new(1),
        }
    }

    /// Latest successful aggregate for the route, if any tick ever succeeded.
    pub(crate) fn get(&self, route_id: &str) -> Option<PositionBatch> {
        self.snapshot
            .load()
            .get(route_id)
            .map(|entry| entry.records.clone())
    }

    pub(crate) fn entry(&self, route_id: &str) -> Option<Arc<CachedPositions>> {
        self.snapshot.load().get(route_id).cloned()
    }

    /// Overwrites the route's entry unconditionally. Returns the new version.
    pub(crate) fn set(&self, route_id: &str, records: PositionBatch) -> u64 {
        let version = self.next_version.fetch_add(1, Ordering::Relaxed);
        let record_count = records.len();
        let entry = Arc::new(CachedPositions {
            records,
            version,
            updated_at: SystemTime::now(),
        });

        self.snapshot.rcu(|current| {
            let mut next = CacheMap::clone(current);
            next.insert(route_id.to_string(), entry.clone());
            next
        });

        debug!(
            event = events::CACHE_UPDATE,
            component = COMPONENT,
            route_id,
            records = record_count,
            version,
            "cache entry replaced"
        );
        version
    }

    pub(crate) fn routes(&self) -> Vec<String> {
        self.snapshot.load().keys().cloned().collect()
    }
}
