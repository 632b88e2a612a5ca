// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the MQTT transport using mockforge-mqtt.

use std::sync::Arc;
use std::time::Duration;

use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use parking_lot::Mutex;
use powerplant_bridge::{
    Bridge, BridgeConfig, CommandSink, DeviceSettings, Error, MqttSettings, MqttTransport,
    PowerState, StateSink, TopicScheme, TransportError, ZoneCommand, ZoneId,
};
use rumqttc::{AsyncClient, MqttOptions, QoS};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind before clients connect
    sleep(Duration::from_millis(500)).await;
}

struct Discard;

impl CommandSink for Discard {
    async fn handle_command(&self, _command: ZoneCommand) {}
}

/// Collects every command the transport dispatches.
#[derive(Default)]
struct RecordingHandler {
    commands: Mutex<Vec<ZoneCommand>>,
}

impl RecordingHandler {
    fn commands(&self) -> Vec<ZoneCommand> {
        let mut commands = self.commands.lock().clone();
        commands.sort_by_key(|command| command.zone);
        commands
    }
}

impl CommandSink for RecordingHandler {
    async fn handle_command(&self, command: ZoneCommand) {
        self.commands.lock().push(command);
    }
}

/// Connects a second client that only publishes.
async fn connect_publisher(port: u16) -> AsyncClient {
    let options = MqttOptions::new("test-publisher", "127.0.0.1", port);
    let (client, mut event_loop) = AsyncClient::new(options, 10);
    tokio::spawn(async move { while event_loop.poll().await.is_ok() {} });
    client
}

// ============================================================================
// Transport
// ============================================================================

mod transport {
    use super::*;

    #[tokio::test]
    async fn connect_and_disconnect() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .build(TopicScheme::new("amp"), Arc::new(Discard))
            .await
            .unwrap();

        assert!(transport.is_connected());
        assert!(transport.client_id().starts_with("ps-pp-"));
        assert_eq!(transport.topics().device_name(), "amp");

        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn client_ids_are_unique() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let first = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .build(TopicScheme::new("amp"), Arc::new(Discard))
            .await
            .unwrap();
        let second = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .build(TopicScheme::new("amp"), Arc::new(Discard))
            .await
            .unwrap();

        assert_ne!(first.client_id(), second.client_id());
    }

    #[tokio::test]
    async fn publish_state_while_connected() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let transport = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .retain(true)
            .build(TopicScheme::new("amp"), Arc::new(Discard))
            .await
            .unwrap();

        assert!(transport.retains_state());
        transport
            .publish_state(ZoneId::new(1), PowerState::On)
            .await
            .unwrap();
        transport
            .publish_state(ZoneId::MAIN, PowerState::Off)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn inbound_commands_reach_the_handler() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let handler = Arc::new(RecordingHandler::default());
        let transport = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .build(TopicScheme::new("amp"), Arc::clone(&handler))
            .await
            .unwrap();

        // The command subscription is issued on ConnAck; let the SubAck land
        sleep(Duration::from_millis(300)).await;

        let publisher = connect_publisher(port).await;
        for (topic, payload) in [
            ("ps-audio/power-plant/amp/zones/2/power/set", "on"),
            ("ps-audio/power-plant/amp/zones/abc/power/set", "off"),
            ("ps-audio/power-plant/amp/zones/3/power/set", "OFF"),
        ] {
            publisher
                .publish(topic, QoS::AtLeastOnce, false, payload)
                .await
                .unwrap();
        }

        let expected = vec![
            ZoneCommand::new(ZoneId::new(2), PowerState::On),
            ZoneCommand::new(ZoneId::new(3), PowerState::Off),
        ];
        for _ in 0..50 {
            if handler.commands().len() >= expected.len() {
                break;
            }
            sleep(Duration::from_millis(50)).await;
        }
        sleep(Duration::from_millis(200)).await;

        assert_eq!(handler.commands(), expected);
        assert!(transport.is_connected());
    }

    #[tokio::test]
    async fn unreachable_broker_times_out() {
        let port = get_test_port();

        let result = MqttTransport::builder()
            .host("127.0.0.1")
            .port(port)
            .connection_timeout(Duration::from_millis(500))
            .build(TopicScheme::new("amp"), Arc::new(Discard))
            .await;

        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    }
}

// ============================================================================
// Bridge
// ============================================================================

mod bridge {
    use super::*;

    #[tokio::test]
    async fn runs_until_cancelled() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let device = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status.xml"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<response><power>1</power><zone1>0</zone1></response>"),
            )
            .mount(&device)
            .await;

        let config = BridgeConfig::new(
            DeviceSettings::new("amp", device.uri(), 1)
                .with_poll_interval(Duration::from_millis(50)),
            MqttSettings::new("127.0.0.1").with_port(port),
        );
        let cancel = CancellationToken::new();
        let bridge = Bridge::connect(config, cancel.clone()).await.unwrap();
        let transport = bridge.transport().clone();

        let task = tokio::spawn(bridge.run());
        sleep(Duration::from_millis(200)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("bridge did not stop")
            .unwrap()
            .unwrap();

        assert!(!transport.is_connected());
        let requests = device.received_requests().await.unwrap_or_default();
        assert!(!requests.is_empty());
    }

    #[tokio::test]
    async fn invalid_config_fails_before_connecting() {
        let config = BridgeConfig::new(
            DeviceSettings::new("amp/1", "127.0.0.1", 1),
            MqttSettings::new("127.0.0.1").with_port(get_test_port()),
        );

        let err = Bridge::connect(config, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn broker_failure_is_fatal_at_startup() {
        let mut mqtt = MqttSettings::new("127.0.0.1").with_port(get_test_port());
        mqtt.connection_timeout = Duration::from_millis(500);
        let config = BridgeConfig::new(DeviceSettings::new("amp", "127.0.0.1", 1), mqtt);

        let err = Bridge::connect(config, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::ConnectionFailed(_))
        ));
    }
}
