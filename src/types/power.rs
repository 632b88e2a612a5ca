// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power-related types for amplifier zones.
//!
//! [`PowerState`] is what a command asks for and what gets published.
//! [`ZoneState`] is what the device reports, which may also be unknown.

use std::fmt;

/// A definite power level, as requested by a command or published to MQTT.
///
/// # Examples
///
/// ```
/// use powerplant_bridge::types::PowerState;
///
/// assert_eq!(PowerState::On.as_str(), "ON");
/// assert_eq!(PowerState::from_payload("Off"), PowerState::Off);
/// assert_eq!(PowerState::from_payload("anything"), PowerState::On);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// Power is off.
    Off,
    /// Power is on.
    On,
}

impl PowerState {
    /// Returns the MQTT payload representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }

    /// Decodes an inbound command payload.
    ///
    /// Only the exact text `off` (any case) switches a zone off; every other
    /// payload, including an empty or padded one, means on.
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        if payload.eq_ignore_ascii_case("off") {
            Self::Off
        } else {
            Self::On
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power state of a zone as reported by the device.
///
/// `Unknown` is a regular value: the device answered, but the field for
/// this zone could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneState {
    /// Zone is on.
    On,
    /// Zone is off.
    Off,
    /// The device reported a value that could not be interpreted.
    Unknown,
}

impl ZoneState {
    /// Maps the raw integer the device reports.
    ///
    /// `1` is on, negative values are unknown, everything else is off.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        if raw == 1 {
            Self::On
        } else if raw < 0 {
            Self::Unknown
        } else {
            Self::Off
        }
    }

    /// Parses the text content of a status element.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        text.trim()
            .parse::<i64>()
            .map_or(Self::Unknown, Self::from_raw)
    }

    /// Returns the definite power state, or `None` when unknown.
    #[must_use]
    pub const fn power(&self) -> Option<PowerState> {
        match self {
            Self::On => Some(PowerState::On),
            Self::Off => Some(PowerState::Off),
            Self::Unknown => None,
        }
    }

    /// Returns `true` if the device value could not be read.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<PowerState> for ZoneState {
    fn from(state: PowerState) -> Self {
        match state {
            PowerState::On => Self::On,
            PowerState::Off => Self::Off,
        }
    }
}

impl fmt::Display for ZoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("ON"),
            Self::Off => f.write_str("OFF"),
            Self::Unknown => f.write_str("UNKNOWN"),
        }
    }
}
