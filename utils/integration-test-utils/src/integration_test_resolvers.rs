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
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Resolver backed by an in-memory mapping that tests may swap at any time.
pub struct StaticRouteResolver {
    mapping: Mutex<VehicleMap>,
    calls: AtomicUsize,
}

impl StaticRouteResolver {
    pub fn new<'a>(routes: impl IntoIterator<Item = (&'a str, Vec<&'a str>)>) -> Self {
        Self {
            mapping: Mutex::new(Self::to_mapping(routes)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replace<'a>(&self, routes: impl IntoIterator<Item = (&'a str, Vec<&'a str>)>) {
        *self.mapping.lock().unwrap() = Self::to_mapping(routes);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn to_mapping<'a>(routes: impl IntoIterator<Item = (&'a str, Vec<&'a str>)>) -> VehicleMap {
        routes
            .into_iter()
            .map(|(route_id, vehicles)| {
                (
                    route_id.to_string(),
                    vehicles.into_iter().map(str::to_string).collect(),
                )
            })
            .collect()
    }
}

#[async_trait]
impl RouteResolver for StaticRouteResolver {
    async fn resolve(&self, route_id: &str) -> Result<VehicleMap, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        debug!("StaticRouteResolver: resolve {route_id}");
        Ok(self.mapping.lock().unwrap().clone())
    }
}

/// Resolver that always fails with [`UpstreamError::Unavailable`].
pub struct FailingRouteResolver;

#[async_trait]
impl RouteResolver for FailingRouteResolver {
    async fn resolve(&self, _route_id: &str) -> Result<VehicleMap, UpstreamError> {
        Err(UpstreamError::Unavailable("route lookup is down".to_string()))
    }
}
