use bus_live_sync::{LiveSync, LiveSyncConfig, PositionListener, SubscriptionHandle};
use integration_test_utils::{RecordingListener, ScriptedLocationFetcher, StaticRouteResolver};
use std::sync::Arc;
use std::time::Duration;

/// Poll period used by every scenario.
pub(crate) const PERIOD: Duration = Duration::from_secs(10);

/// Upper bound for waiting on a delivery that should happen within the current
/// tick. Shorter than [`PERIOD`] so paused time never skips into the next tick.
pub(crate) const WITHIN_TICK: Duration = Duration::from_secs(1);

pub(crate) struct Harness {
    pub(crate) sync: LiveSync,
    #[allow(dead_code)]
    pub(crate) resolver: Arc<StaticRouteResolver>,
    pub(crate) fetcher: Arc<ScriptedLocationFetcher>,
}

pub(crate) fn config() -> LiveSyncConfig {
    LiveSyncConfig::default().with_poll_interval(PERIOD)
}

pub(crate) fn make_harness<'a>(
    name: &str,
    config: LiveSyncConfig,
    routes: impl IntoIterator<Item = (&'a str, Vec<&'a str>)>,
) -> Harness {
    integration_test_utils::init_logging();

    let resolver = Arc::new(StaticRouteResolver::new(routes));
    let fetcher = Arc::new(ScriptedLocationFetcher::new());
    let sync = LiveSync::new(name, config, resolver.clone(), fetcher.clone())
        .expect("live sync creation should succeed");

    Harness {
        sync,
        resolver,
        fetcher,
    }
}

pub(crate) async fn subscribe_recorder(
    sync: &LiveSync,
    route_id: &str,
) -> (Arc<RecordingListener>, SubscriptionHandle) {
    let listener = Arc::new(RecordingListener::new());
    let handle = sync
        .subscribe(route_id, listener.clone() as Arc<dyn PositionListener>)
        .await;
    (listener, handle)
}

#[allow(dead_code)]
pub(crate) fn vehicle_ids(batch: &[bus_live_sync::PositionRecord]) -> Vec<String> {
    let mut ids: Vec<String> = batch.iter().map(|record| record.vehicle_id.clone()).collect();
    ids.sort();
    ids
}
