// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power Plant bridge daemon.
//!
//! Loads the YAML configuration, connects to the broker, and mirrors the
//! amplifier's zones until Ctrl+C or SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use powerplant_bridge::{Bridge, BridgeConfig};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Bridges a PS Audio Power Plant to MQTT.
#[derive(Parser, Debug)]
#[command(name = "powerplant-bridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE", default_value = "config.yml", env = "POWER_PLANT_CONFIG")]
    config: PathBuf,

    /// Log filter used when `RUST_LOG` is not set (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "POWER_PLANT_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> powerplant_bridge::Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Power Plant bridge starting");

    let config = BridgeConfig::load(&args.config)?;
    let cancel = CancellationToken::new();
    let bridge = Bridge::connect(config, cancel.clone()).await?;

    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        cancel.cancel();
    });

    bridge.run().await
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
