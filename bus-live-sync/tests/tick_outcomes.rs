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

mod support;

use bus_live_sync::{ErrorSignal, LiveSync, TickFailure};
use integration_test_utils::{
    position, positions_for, FailingRouteResolver, FetchStep, ScriptedLocationFetcher,
};
use std::sync::Arc;
use support::{config, make_harness, subscribe_recorder, vehicle_ids, PERIOD, WITHIN_TICK};

#[tokio::test(start_paused = true)]
async fn partial_vehicle_failure_still_publishes_the_rest() {
    let harness = make_harness("partial-failure", config(), [("101", vec!["v1", "v2"])]);
    harness
        .fetcher
        .set("v1", FetchStep::Records(positions_for("v1", 1, 2)));
    harness.fetcher.set("v2", FetchStep::unavailable());

    let (listener, _handle) = subscribe_recorder(&harness.sync, "101").await;

    assert!(listener.wait_for_data(1, WITHIN_TICK).await);
    assert!(listener.wait_for_errors(1, WITHIN_TICK).await);

    let batch = listener.last_data().expect("one batch delivered");
    assert_eq!(batch.len(), 2);
    assert_eq!(vehicle_ids(&batch), vec!["v1", "v1"]);
    assert_eq!(listener.errors(), vec![ErrorSignal::Cleared]);
    assert_eq!(harness.fetcher.calls("v2"), 1);

    let cached = harness.sync.cached_positions("101").expect("cache populated");
    assert_eq!(&cached[..], &batch[..]);

    let health = harness.sync.sync_health("101").expect("health recorded");
    assert_eq!(health.last_attempt_succeeded, Some(true));
    assert_eq!(health.last_vehicle_count, 2);
    assert_eq!(health.last_failed_vehicle_count, 1);

    harness.sync.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn route_without_vehicles_raises_a_resolution_error() {
    let harness = make_harness("empty-route", config(), [("202", vec![])]);

    let (listener, _handle) = subscribe_recorder(&harness.sync, "202").await;

    assert!(listener.wait_for_errors(1, WITHIN_TICK).await);
    let Some(ErrorSignal::Raised(failure)) = listener.last_error() else {
        panic!("expected a raised error");
    };
    assert!(matches!(failure, TickFailure::Resolution { ref route_id, .. } if route_id == "202"));
    assert!(failure
        .to_string()
        .starts_with("no vehicle ids found for route 202"));

    assert_eq!(listener.data_count(), 0);
    assert!(harness.sync.cached_positions("202").is_none());
    assert_eq!(harness.fetcher.total_calls(), 0);

    harness.sync.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn route_missing_from_mapping_raises_a_resolution_error() {
    let harness = make_harness("unknown-route", config(), [("101", vec!["v1"])]);

    let (listener, _handle) = subscribe_recorder(&harness.sync, "999").await;

    assert!(listener.wait_for_errors(1, WITHIN_TICK).await);
    assert!(matches!(
        listener.last_error(),
        Some(ErrorSignal::Raised(TickFailure::Resolution { .. }))
    ));

    harness.sync.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn resolver_outage_raises_resolution_errors_and_polling_continues() {
    integration_test_utils::init_logging();
    let fetcher = Arc::new(ScriptedLocationFetcher::new());
    let sync = LiveSync::new(
        "resolver-outage",
        config(),
        Arc::new(FailingRouteResolver),
        fetcher.clone(),
    )
    .expect("live sync creation should succeed");

    let (listener, _handle) = subscribe_recorder(&sync, "101").await;
    assert!(listener.wait_for_errors(1, WITHIN_TICK).await);
    assert_eq!(sync.sync_health("101").map(|h| h.consecutive_failures), Some(1));

    tokio::time::sleep(PERIOD).await;
    assert!(listener.wait_for_errors(2, WITHIN_TICK).await);

    for signal in listener.errors() {
        let ErrorSignal::Raised(failure) = signal else {
            panic!("a resolver outage never clears the error");
        };
        assert!(
            matches!(failure, TickFailure::Resolution { ref route_id, ref reason }
                if route_id == "101" && reason.contains("route lookup is down"))
        );
    }
    assert_eq!(listener.data_count(), 0);
    assert!(sync.cached_positions("101").is_none());
    assert!(sync.is_polling("101").await);
    assert_eq!(fetcher.total_calls(), 0);

    let health = sync.sync_health("101").expect("health recorded");
    assert_eq!(health.consecutive_failures, 2);
    assert_eq!(health.last_attempt_succeeded, Some(false));
    assert!(health.last_success_at.is_none());

    sync.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn total_failure_keeps_last_known_good_positions() {
    let harness = make_harness("total-failure", config(), [("101", vec!["v1", "v2"])]);
    harness
        .fetcher
        .push("v1", FetchStep::Records(vec![position("v1", 1)]));
    harness.fetcher.push("v2", FetchStep::Records(vec![]));
    harness.fetcher.set("v1", FetchStep::unavailable());
    harness.fetcher.set("v2", FetchStep::unavailable());

    let (listener, _handle) = subscribe_recorder(&harness.sync, "101").await;
    assert!(listener.wait_for_data(1, WITHIN_TICK).await);
    let good = harness.sync.cached_entry("101").expect("first tick cached");

    tokio::time::sleep(PERIOD).await;
    assert!(listener.wait_for_errors(2, WITHIN_TICK).await);

    let Some(ErrorSignal::Raised(failure)) = listener.last_error() else {
        panic!("expected a raised error");
    };
    assert_eq!(
        failure,
        TickFailure::NoPositions {
            route_id: "101".to_string(),
            attempted: 2,
            failed: 2,
        }
    );
    assert_eq!(listener.data_count(), 1);

    let still_cached = harness.sync.cached_entry("101").expect("cache kept");
    assert_eq!(still_cached.version, good.version);
    assert_eq!(&still_cached.records[..], &[position("v1", 1)]);

    let health = harness.sync.sync_health("101").expect("health recorded");
    assert_eq!(health.consecutive_failures, 1);
    assert!(health.last_success_at.is_some());

    // Recovery clears the error and replaces the cache.
    harness
        .fetcher
        .set("v2", FetchStep::Records(vec![position("v2", 7)]));
    tokio::time::sleep(PERIOD).await;
    assert!(listener.wait_for_data(2, WITHIN_TICK).await);
    assert!(listener.wait_for_errors(3, WITHIN_TICK).await);

    assert_eq!(listener.last_error(), Some(ErrorSignal::Cleared));
    assert_eq!(
        &harness.sync.cached_positions("101").expect("cache updated")[..],
        &[position("v2", 7)]
    );
    assert_eq!(
        harness.sync.sync_health("101").map(|h| h.consecutive_failures),
        Some(0)
    );

    harness.sync.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn records_that_are_all_empty_fail_the_tick() {
    let harness = make_harness("all-empty", config(), [("101", vec!["v1", "v2"])]);
    harness.fetcher.set("v1", FetchStep::Records(vec![]));
    harness.fetcher.set("v2", FetchStep::Records(vec![]));

    let (listener, _handle) = subscribe_recorder(&harness.sync, "101").await;

    assert!(listener.wait_for_errors(1, WITHIN_TICK).await);
    assert!(matches!(
        listener.last_error(),
        Some(ErrorSignal::Raised(TickFailure::NoPositions { failed: 0, attempted: 2, .. }))
    ));
    assert!(harness.sync.cached_positions("101").is_none());

    harness.sync.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn panicking_fetcher_is_reported_and_polling_continues() {
    let harness = make_harness("panicking-fetcher", config(), [("101", vec!["v1"])]);
    harness.fetcher.push("v1", FetchStep::Panic("feed client bug"));
    harness
        .fetcher
        .set("v1", FetchStep::Records(vec![position("v1", 2)]));

    let (listener, _handle) = subscribe_recorder(&harness.sync, "101").await;

    assert!(listener.wait_for_errors(1, WITHIN_TICK).await);
    let Some(ErrorSignal::Raised(failure)) = listener.last_error() else {
        panic!("expected a raised error");
    };
    assert_eq!(
        failure,
        TickFailure::Unexpected {
            route_id: "101".to_string(),
            detail: "feed client bug".to_string(),
        }
    );

    tokio::time::sleep(PERIOD).await;
    assert!(listener.wait_for_data(1, WITHIN_TICK).await);
    assert!(harness.sync.is_polling("101").await);

    harness.sync.shutdown().await;
}
