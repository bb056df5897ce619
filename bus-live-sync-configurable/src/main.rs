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

mod config;
mod file_location_fetcher;
mod logging_listener;

use crate::config::Config;
use crate::file_location_fetcher::FileLocationFetcher;
use crate::logging_listener::LoggingListener;
use bus_live_sync::LiveSync;
use clap::Parser;
use route_resolver_static_file::RouteResolverStaticFile;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command()]
struct LiveSyncArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    info!("Started bus-live-sync-configurable");

    let args = LiveSyncArgs::parse();
    let config = Config::load(&args.config)
        .map_err(|e| format!("Unable to load config file {}: {e}", args.config))?;

    let resolver = Arc::new(RouteResolverStaticFile::new(
        config.route_resolver.file_path.clone(),
    ));
    let fetcher = Arc::new(FileLocationFetcher::new(&config.location_feed.directory));

    let live_sync = LiveSync::new("bus-live-sync", config.live_sync.clone(), resolver, fetcher)?;

    let mut handles = Vec::with_capacity(config.routes.len());
    for route_id in &config.routes {
        let listener = Arc::new(LoggingListener::new(route_id));
        handles.push(live_sync.subscribe(route_id, listener).await);
        info!("Subscribed to route {route_id}");
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    for handle in &handles {
        live_sync.unsubscribe(handle).await;
    }
    live_sync.shutdown().await;

    Ok(())
}
