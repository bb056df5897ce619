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

use bus_live_sync::PositionRecord;

/// A record whose coordinates are derived from `vehicle_id` and `seq`, so two
/// records differ whenever either input differs.
pub fn position(vehicle_id: &str, seq: u32) -> PositionRecord {
    PositionRecord::new(
        36.0 + f64::from(seq) * 0.001,
        127.0 + f64::from(seq) * 0.001,
        vehicle_id,
        &format!("Stop {seq}"),
        &format!("ST-{seq}"),
    )
}

/// `count` records for `vehicle_id`, numbered from `first_seq`.
pub fn positions_for(vehicle_id: &str, first_seq: u32, count: u32) -> Vec<PositionRecord> {
    (first_seq..first_seq + count)
        .map(|seq| position(vehicle_id, seq))
        .collect()
}
