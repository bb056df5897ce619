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

//! Shared field values and value-format helpers.

use std::any::Any;

pub const NONE: &str = "none";
pub const REASON_NO_VEHICLES: &str = "route has no vehicles";
pub const REASON_CANCELLED: &str = "cancelled";
pub const UNKNOWN_PANIC: &str = "unknown error while polling";

/// Joins vehicle ids for a single log field.
pub fn format_vehicle_ids(vehicle_ids: &[String]) -> String {
    if vehicle_ids.is_empty() {
        return NONE.to_string();
    }
    vehicle_ids.join(",")
}

/// Extracts a readable message from a caught panic payload.
pub fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        UNKNOWN_PANIC.to_string()
    }
}
