// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Only [`ConfigError`] and the connect variants of [`TransportError`] are
//! fatal, and only at startup. [`DeviceError`] and [`ConsistencyError`] are
//! reported and the affected tick or command is dropped.

use thiserror::Error;

use crate::types::ZoneId;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The MQTT transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Talking to the amplifier failed.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// A command does not fit the state reported by the device.
    #[error("consistency error: {0}")]
    Consistency(#[from] ConsistencyError),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file that failed to load.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected layout.
    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A field holds a value the bridge cannot work with.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// The offending field, in `Section.Key` form.
        field: String,
        /// Why the value was rejected.
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Errors related to the MQTT transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The MQTT client rejected a request.
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connecting to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid broker address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to the amplifier's HTTP interface.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The HTTP request could not be built, sent, or its body read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The device answered with a non-2xx status.
    #[error("HTTP {code} - {reason}")]
    Status {
        /// Numeric HTTP status code.
        code: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// The device rejected the configured credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The status document is not well-formed XML.
    #[error("malformed status document: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Errors raised when a command cannot be reconciled with device state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    /// The command addresses a zone the device did not report.
    #[error("zone {zone} is not in the device status ({available} zones reported)")]
    ZoneOutOfRange {
        /// Zone addressed by the command.
        zone: ZoneId,
        /// Number of zones in the fetched list.
        available: usize,
    },

    /// The device reported an unparseable value for the zone.
    #[error("zone {zone} state is unknown")]
    UnknownState {
        /// Zone addressed by the command.
        zone: ZoneId,
    },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
