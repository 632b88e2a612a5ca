// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bridge runtime.
//!
//! A [`Bridge`] wires three pieces around one shared, immutable
//! [`BridgeContext`]:
//!
//! - [`CommandHandler`] applies inbound commands to the device
//! - [`StatePublisher`] mirrors zone states on a fixed interval
//! - [`MqttTransport`] carries both over MQTT
//!
//! # Examples
//!
//! ```no_run
//! use std::path::Path;
//! use powerplant_bridge::{Bridge, BridgeConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> powerplant_bridge::Result<()> {
//! let config = BridgeConfig::load(Path::new("config.yml"))?;
//! let cancel = CancellationToken::new();
//!
//! let bridge = Bridge::connect(config, cancel.clone()).await?;
//! tokio::spawn(async move {
//!     let _ = tokio::signal::ctrl_c().await;
//!     cancel.cancel();
//! });
//! bridge.run().await
//! # }
//! ```

mod command_handler;
mod state_publisher;

pub use command_handler::{CommandHandler, CommandOutcome};
pub use state_publisher::{StatePublisher, TickReport};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::device::DeviceClient;
use crate::error::DeviceError;
use crate::protocol::{MqttTransport, MqttTransportBuilder, TopicScheme};

/// Immutable state shared by every bridge component.
#[derive(Debug)]
pub struct BridgeContext {
    config: BridgeConfig,
    device: DeviceClient,
    topics: TopicScheme,
}

impl BridgeContext {
    /// Builds the context from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: BridgeConfig) -> Result<Self, DeviceError> {
        let device = DeviceClient::new(&config.device)?;
        let topics = TopicScheme::new(config.device.name.clone());
        Ok(Self {
            config,
            device,
            topics,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns the device client.
    #[must_use]
    pub fn device(&self) -> &DeviceClient {
        &self.device
    }

    /// Returns the device's topic scheme.
    #[must_use]
    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }
}

/// A connected bridge, ready to run.
#[derive(Debug)]
pub struct Bridge {
    context: Arc<BridgeContext>,
    transport: MqttTransport,
    publisher: StatePublisher<MqttTransport>,
    cancel: CancellationToken,
}

impl Bridge {
    /// Validates `config`, then connects to the broker.
    ///
    /// Commands are handled as soon as this returns; states are published
    /// once [`run`](Self::run) is awaited.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid, the HTTP client cannot
    /// be created, or the broker connection fails.
    pub async fn connect(config: BridgeConfig, cancel: CancellationToken) -> crate::Result<Self> {
        config.validate()?;

        let context = Arc::new(BridgeContext::new(config)?);
        let handler = Arc::new(CommandHandler::new(Arc::clone(&context)));

        let transport = MqttTransportBuilder::from_settings(&context.config().mqtt)
            .build(context.topics().clone(), handler)
            .await?;

        tracing::info!(
            device = %context.topics().device_name(),
            base_url = %context.device().base_url(),
            zones = context.device().zone_count(),
            "Bridge connected"
        );

        let publisher = StatePublisher::new(Arc::clone(&context), transport.clone());
        Ok(Self {
            context,
            transport,
            publisher,
            cancel,
        })
    }

    /// Returns the shared context.
    #[must_use]
    pub fn context(&self) -> &BridgeContext {
        &self.context
    }

    /// Returns the MQTT transport.
    #[must_use]
    pub fn transport(&self) -> &MqttTransport {
        &self.transport
    }

    /// Publishes states until the cancellation token fires, then
    /// disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Steady-state failures are logged, not returned. The disconnect
    /// result is logged as well, so this currently always succeeds.
    pub async fn run(self) -> crate::Result<()> {
        self.publisher.run(self.cancel.clone()).await;

        if let Err(e) = self.transport.disconnect().await {
            tracing::warn!(error = %e, "Failed to disconnect cleanly");
        }
        tracing::info!(device = %self.context.topics().device_name(), "Bridge stopped");
        Ok(())
    }
}
