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

mod integration_test_fetchers;
pub use integration_test_fetchers::{FetchStep, ScriptedLocationFetcher};
mod integration_test_listeners;
pub use integration_test_listeners::RecordingListener;
mod integration_test_positions;
pub use integration_test_positions::{position, positions_for};
mod integration_test_resolvers;
pub use integration_test_resolvers::{FailingRouteResolver, StaticRouteResolver};
mod integration_test_utils;
pub use integration_test_utils::init_logging;
