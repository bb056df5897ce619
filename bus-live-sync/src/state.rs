//! Process-wide synchronization state owned by one [`LiveSync`](crate::LiveSync).

use std::sync::Arc;

use crate::cache::position_cache::PositionCache;
use crate::collaborators::{LocationFetcher, RouteResolver};
use crate::registry::subscription_registry::SubscriptionRegistry;
use crate::sync_health::SyncHealthBoard;

/// Everything a route poller reads from or writes to.
pub(crate) struct SharedState {
    pub(crate) cache: PositionCache,
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) health: SyncHealthBoard,
    pub(crate) resolver: Arc<dyn RouteResolver>,
    pub(crate) fetcher: Arc<dyn LocationFetcher>,
}

impl SharedState {
    pub(crate) fn new(resolver: Arc<dyn RouteResolver>, fetcher: Arc<dyn LocationFetcher>) -> Self {
        Self {
            cache: PositionCache::new(),
            registry: SubscriptionRegistry::new(),
            health: SyncHealthBoard::new(),
            resolver,
            fetcher,
        }
    }
}
