// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT topic layout for one amplifier.
//!
//! ```text
//! ps-audio/power-plant/<name>/zones/<id>/power/set    inbound command
//! ps-audio/power-plant/<name>/zones/<id>/power/state  outbound state
//! ```

use crate::types::{PowerState, ZoneCommand, ZoneId};

/// Fixed leading segments of every topic.
pub const NAMESPACE: &str = "ps-audio/power-plant";

const ZONES_SEGMENT: &str = "zones";
const POWER_SEGMENT: &str = "power";
const SET_ACTION: &str = "set";
const STATE_ACTION: &str = "state";

/// Builds and parses the topics of one device.
///
/// # Examples
///
/// ```
/// use powerplant_bridge::protocol::TopicScheme;
/// use powerplant_bridge::types::{PowerState, ZoneId};
///
/// let topics = TopicScheme::new("living-room");
/// assert_eq!(
///     topics.command_filter(),
///     "ps-audio/power-plant/living-room/zones/+/power/set"
/// );
/// assert_eq!(
///     topics.state_topic(ZoneId::new(2)),
///     "ps-audio/power-plant/living-room/zones/2/power/state"
/// );
///
/// let command = topics
///     .decode_command("ps-audio/power-plant/living-room/zones/2/power/set", b"on")
///     .unwrap();
/// assert_eq!(command.zone, ZoneId::new(2));
/// assert_eq!(command.desired, PowerState::On);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    device_name: String,
}

impl TopicScheme {
    /// Creates the topic scheme for a device name.
    #[must_use]
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
        }
    }

    /// Returns the device name segment.
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Subscription filter matching every zone's command topic.
    #[must_use]
    pub fn command_filter(&self) -> String {
        format!(
            "{NAMESPACE}/{}/{ZONES_SEGMENT}/+/{POWER_SEGMENT}/{SET_ACTION}",
            self.device_name
        )
    }

    /// Topic a zone's state is published to.
    #[must_use]
    pub fn state_topic(&self, zone: ZoneId) -> String {
        format!(
            "{NAMESPACE}/{}/{ZONES_SEGMENT}/{zone}/{POWER_SEGMENT}/{STATE_ACTION}",
            self.device_name
        )
    }

    /// Extracts the zone id from a command topic of this device.
    ///
    /// Returns `None` for topics of other devices, other actions, or a zone
    /// segment that is not a non-negative integer.
    #[must_use]
    pub fn parse_command_topic(&self, topic: &str) -> Option<ZoneId> {
        let parsed = ParsedTopic::parse(topic)?;
        if parsed.device != self.device_name || parsed.action != SET_ACTION {
            return None;
        }
        parsed.zone.parse().ok()
    }

    /// Decodes an inbound message into a command.
    ///
    /// The payload `off` (any case) means off; anything else means on.
    #[must_use]
    pub fn decode_command(&self, topic: &str, payload: &[u8]) -> Option<ZoneCommand> {
        let zone = self.parse_command_topic(topic)?;
        let desired = PowerState::from_payload(&String::from_utf8_lossy(payload));
        Some(ZoneCommand::new(zone, desired))
    }
}

/// Parsed zone topic components.
#[derive(Debug)]
struct ParsedTopic<'a> {
    /// The device name (segment 2).
    device: &'a str,
    /// The zone id (segment 4).
    zone: &'a str,
    /// `set` or `state` (segment 6).
    action: &'a str,
}

impl<'a> ParsedTopic<'a> {
    /// Expected format: `ps-audio/power-plant/<device>/zones/<zone>/power/<action>`
    fn parse(topic: &'a str) -> Option<Self> {
        let parts: Vec<&str> = topic.split('/').collect();
        match parts[..] {
            ["ps-audio", "power-plant", device, ZONES_SEGMENT, zone, POWER_SEGMENT, action] => {
                Some(Self {
                    device,
                    zone,
                    action,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET_TOPIC: &str = "ps-audio/power-plant/amp/zones/3/power/set";

    #[test]
    fn namespace_matches_parsed_prefix() {
        assert!(TopicScheme::new("amp").command_filter().starts_with(NAMESPACE));
    }

    #[test]
    fn parse_topic_valid() {
        let parsed = ParsedTopic::parse(SET_TOPIC).unwrap();
        assert_eq!(parsed.device, "amp");
        assert_eq!(parsed.zone, "3");
        assert_eq!(parsed.action, "set");
    }

    #[test]
    fn parse_topic_invalid() {
        assert!(ParsedTopic::parse("ps-audio/power-plant/amp").is_none());
        assert!(ParsedTopic::parse("other/power-plant/amp/zones/1/power/set").is_none());
        assert!(ParsedTopic::parse("ps-audio/power-plant/amp/zones/1/power/set/extra").is_none());
    }

    #[test]
    fn command_topic_zone_id() {
        let topics = TopicScheme::new("amp");
        assert_eq!(topics.parse_command_topic(SET_TOPIC), Some(ZoneId::new(3)));
        assert_eq!(
            topics.parse_command_topic("ps-audio/power-plant/amp/zones/0/power/set"),
            Some(ZoneId::MAIN)
        );
    }

    #[test]
    fn command_topic_rejects_other_devices_and_actions() {
        let topics = TopicScheme::new("amp");
        assert!(
            topics
                .parse_command_topic("ps-audio/power-plant/other/zones/3/power/set")
                .is_none()
        );
        assert!(
            topics
                .parse_command_topic("ps-audio/power-plant/amp/zones/3/power/state")
                .is_none()
        );
    }

    #[test]
    fn command_topic_rejects_bad_zone_segment() {
        let topics = TopicScheme::new("amp");
        assert!(
            topics
                .parse_command_topic("ps-audio/power-plant/amp/zones/two/power/set")
                .is_none()
        );
        assert!(
            topics
                .parse_command_topic("ps-audio/power-plant/amp/zones/-1/power/set")
                .is_none()
        );
    }

    #[test]
    fn decode_mixed_case_payloads() {
        let topics = TopicScheme::new("amp");
        let off = topics.decode_command(SET_TOPIC, b"Off").unwrap();
        assert_eq!(off, ZoneCommand::new(ZoneId::new(3), PowerState::Off));

        let on = topics.decode_command(SET_TOPIC, b"oN").unwrap();
        assert_eq!(on.desired, PowerState::On);

        let garbage = topics.decode_command(SET_TOPIC, &[0xff, 0xfe]).unwrap();
        assert_eq!(garbage.desired, PowerState::On);
    }

    #[test]
    fn state_topic_round_trips_through_namespace() {
        let topics = TopicScheme::new("amp");
        let topic = topics.state_topic(ZoneId::new(3));
        assert_eq!(topic, "ps-audio/power-plant/amp/zones/3/power/state");
        assert!(topics.parse_command_topic(&topic).is_none());
    }
}
