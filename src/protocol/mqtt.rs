// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT connection for one amplifier bridge.
//!
//! The transport subscribes to the device's command filter, hands every
//! decoded command to a [`CommandSink`], and publishes zone states. Inbound
//! messages are acknowledged manually once the sink has finished with them.
//! The session is clean, so unacknowledged commands are not redelivered
//! after a reconnect.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use powerplant_bridge::protocol::{CommandSink, MqttTransport, StateSink, TopicScheme};
//! use powerplant_bridge::types::{PowerState, ZoneCommand, ZoneId};
//!
//! struct Print;
//!
//! impl CommandSink for Print {
//!     async fn handle_command(&self, command: ZoneCommand) {
//!         println!("{command}");
//!     }
//! }
//!
//! # async fn example() -> powerplant_bridge::Result<()> {
//! let transport = MqttTransport::builder()
//!     .host("192.168.1.50")
//!     .credentials("user", "password")
//!     .build(TopicScheme::new("amp"), Arc::new(Print))
//!     .await?;
//!
//! transport.publish_state(ZoneId::new(1), PowerState::On).await?;
//! transport.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, Publish, QoS};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::{CommandSink, StateSink, TopicScheme};
use crate::config::MqttSettings;
use crate::error::TransportError;
use crate::types::{PowerState, ZoneId};

/// Pause between reconnection attempts after an event loop error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the request channel between client and event loop.
const REQUEST_CAPACITY: usize = 32;

/// Configuration for an MQTT connection.
#[derive(Debug, Clone)]
struct TransportConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    keep_alive: Duration,
    connection_timeout: Duration,
    retain: bool,
    client_id: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: MqttSettings::DEFAULT_PORT,
            credentials: None,
            keep_alive: MqttSettings::DEFAULT_KEEP_ALIVE,
            connection_timeout: MqttSettings::DEFAULT_CONNECTION_TIMEOUT,
            retain: false,
            client_id: None,
        }
    }
}

/// A live MQTT session bound to one device's topics.
///
/// Cheaply cloneable; clones share the same connection.
#[derive(Clone)]
pub struct MqttTransport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    client: AsyncClient,
    topics: TopicScheme,
    config: TransportConfig,
    client_id: String,
    connected: AtomicBool,
    shutdown: CancellationToken,
}

impl MqttTransport {
    /// Creates a new builder for configuring an MQTT connection.
    #[must_use]
    pub fn builder() -> MqttTransportBuilder {
        MqttTransportBuilder::default()
    }

    /// Returns whether the broker session is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the topic scheme this transport serves.
    #[must_use]
    pub fn topics(&self) -> &TopicScheme {
        &self.inner.topics
    }

    /// Returns the MQTT client id used for the session.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Returns whether state notifications are published with the retain flag.
    #[must_use]
    pub fn retains_state(&self) -> bool {
        self.inner.config.retain
    }

    /// Disconnects from the broker and stops the event loop.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), TransportError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        let result = self.inner.client.disconnect().await;
        self.inner.connected.store(false, Ordering::Release);
        self.inner.shutdown.cancel();
        result.map_err(TransportError::from)
    }
}

impl StateSink for MqttTransport {
    async fn publish_state(&self, zone: ZoneId, state: PowerState) -> Result<(), TransportError> {
        let topic = self.inner.topics.state_topic(zone);
        tracing::debug!(topic = %topic, state = %state, "Publishing zone state");
        self.inner
            .client
            .publish(topic, QoS::AtLeastOnce, self.inner.config.retain, state.as_str())
            .await
            .map_err(TransportError::from)
    }
}

impl std::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttTransport")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("client_id", &self.inner.client_id)
            .field("device", &self.inner.topics.device_name())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Builder for an MQTT connection.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use powerplant_bridge::protocol::MqttTransport;
///
/// let builder = MqttTransport::builder()
///     .host("broker.local")
///     .port(8883)
///     .keep_alive(Duration::from_secs(60))
///     .retain(true);
/// # drop(builder);
/// ```
#[derive(Debug, Default)]
pub struct MqttTransportBuilder {
    config: TransportConfig,
}

impl MqttTransportBuilder {
    /// Creates a builder from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &MqttSettings) -> Self {
        let mut builder = Self::default()
            .host(settings.host.clone())
            .port(settings.port)
            .keep_alive(settings.keep_alive)
            .connection_timeout(settings.connection_timeout)
            .retain(settings.retain);
        if let Some((username, password)) = settings.credentials() {
            builder = builder.credentials(username, password);
        }
        builder
    }

    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets how long [`build`](Self::build) waits for the broker (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Sets the retain flag on state notifications (default: off).
    #[must_use]
    pub fn retain(mut self, retain: bool) -> Self {
        self.config.retain = retain;
        self
    }

    /// Overrides the generated client id.
    #[must_use]
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    /// Connects to the broker and starts dispatching commands to `handler`.
    ///
    /// The command filter is subscribed on every (re)connection.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - The event loop stops before the broker accepts the session
    /// - No acknowledgement arrives within the connection timeout
    pub async fn build<H: CommandSink>(
        self,
        topics: TopicScheme,
        handler: Arc<H>,
    ) -> Result<MqttTransport, TransportError> {
        if self.config.host.is_empty() {
            return Err(TransportError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let client_id = self
            .config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("ps-pp-{}", uuid::Uuid::new_v4()));

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);
        mqtt_options.set_manual_acks(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, REQUEST_CAPACITY);

        let transport = MqttTransport {
            inner: Arc::new(TransportInner {
                client,
                topics,
                config: self.config.clone(),
                client_id,
                connected: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
            }),
        };

        let (connack_tx, connack_rx) = oneshot::channel();

        tokio::spawn(handle_events(
            event_loop,
            transport.clone(),
            handler,
            Some(connack_tx),
        ));

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    client_id = %transport.client_id(),
                    filter = %transport.topics().command_filter(),
                    "Connected to MQTT broker"
                );
                Ok(transport)
            }
            Ok(Err(_)) => {
                transport.inner.shutdown.cancel();
                Err(TransportError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ))
            }
            Err(_) => {
                transport.inner.shutdown.cancel();
                Err(TransportError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )))
            }
        }
    }
}

/// Drives the MQTT event loop until the transport shuts down.
async fn handle_events<H: CommandSink>(
    mut event_loop: EventLoop,
    transport: MqttTransport,
    handler: Arc<H>,
    mut connack_tx: Option<oneshot::Sender<()>>,
) {
    let shutdown = transport.inner.shutdown.clone();

    loop {
        let event = tokio::select! {
            biased;
            event = event_loop.poll() => event,
            () = shutdown.cancelled() => break,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT session established");
                transport.inner.connected.store(true, Ordering::Release);
                subscribe_commands(&transport);
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tokio::spawn(dispatch(transport.clone(), Arc::clone(&handler), publish));
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker closed the session");
                transport.inner.connected.store(false, Ordering::Release);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                transport.inner.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT event loop error");
                transport.inner.connected.store(false, Ordering::Release);
                tokio::select! {
                    () = tokio::time::sleep(RECONNECT_DELAY) => {}
                    () = shutdown.cancelled() => break,
                }
            }
        }
    }

    tracing::debug!("MQTT event loop stopped");
}

/// Queues the command filter subscription without waiting on the event loop.
fn subscribe_commands(transport: &MqttTransport) {
    let filter = transport.inner.topics.command_filter();
    match transport
        .inner
        .client
        .try_subscribe(&filter, QoS::AtLeastOnce)
    {
        Ok(()) => tracing::debug!(filter = %filter, "Subscribing to zone commands"),
        Err(e) => tracing::error!(filter = %filter, error = %e, "Failed to subscribe to zone commands"),
    }
}

/// Decodes and handles one inbound message, then acknowledges it.
async fn dispatch<H: CommandSink>(transport: MqttTransport, handler: Arc<H>, publish: Publish) {
    match transport
        .inner
        .topics
        .decode_command(&publish.topic, &publish.payload)
    {
        Some(command) => {
            tracing::debug!(topic = %publish.topic, %command, "MQTT command received");
            handler.handle_command(command).await;
        }
        None => {
            tracing::warn!(topic = %publish.topic, "Ignoring message on unrecognised topic");
        }
    }

    if let Err(e) = transport.inner.client.ack(&publish).await {
        tracing::warn!(topic = %publish.topic, error = %e, "Failed to acknowledge message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ZoneCommand;

    struct Discard;

    impl CommandSink for Discard {
        async fn handle_command(&self, _command: ZoneCommand) {}
    }

    #[test]
    fn builder_default_values() {
        let builder = MqttTransportBuilder::default();
        assert_eq!(builder.config.port, 1883);
        assert!(builder.config.host.is_empty());
        assert!(builder.config.credentials.is_none());
        assert_eq!(builder.config.keep_alive, Duration::from_secs(30));
        assert_eq!(builder.config.connection_timeout, Duration::from_secs(10));
        assert!(!builder.config.retain);
        assert!(builder.config.client_id.is_none());
    }

    #[test]
    fn builder_chain() {
        let builder = MqttTransportBuilder::default()
            .host("broker.local")
            .port(8883)
            .credentials("admin", "secret")
            .keep_alive(Duration::from_secs(45))
            .connection_timeout(Duration::from_secs(15))
            .retain(true)
            .client_id("fixed");

        assert_eq!(builder.config.host, "broker.local");
        assert_eq!(builder.config.port, 8883);
        assert_eq!(
            builder.config.credentials,
            Some(("admin".to_string(), "secret".to_string()))
        );
        assert_eq!(builder.config.keep_alive, Duration::from_secs(45));
        assert_eq!(builder.config.connection_timeout, Duration::from_secs(15));
        assert!(builder.config.retain);
        assert_eq!(builder.config.client_id.as_deref(), Some("fixed"));
    }

    #[test]
    fn builder_from_settings() {
        let mut settings = MqttSettings::new("mosquitto").with_port(1884);
        settings.retain = true;
        settings.keep_alive = Duration::from_secs(5);

        let builder = MqttTransportBuilder::from_settings(&settings);
        assert_eq!(builder.config.host, "mosquitto");
        assert_eq!(builder.config.port, 1884);
        assert_eq!(builder.config.keep_alive, Duration::from_secs(5));
        assert!(builder.config.retain);
        assert!(builder.config.credentials.is_none());

        let settings = settings.with_credentials("user", "pass");
        let builder = MqttTransportBuilder::from_settings(&settings);
        assert_eq!(
            builder.config.credentials,
            Some(("user".to_string(), "pass".to_string()))
        );
    }

    #[tokio::test]
    async fn builder_missing_host_fails() {
        let result = MqttTransportBuilder::default()
            .build(TopicScheme::new("amp"), Arc::new(Discard))
            .await;
        assert!(matches!(result, Err(TransportError::InvalidAddress(_))));
    }
}
