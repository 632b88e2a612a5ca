// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pub/sub transport between the bridge and the outside world.
//!
//! The bridge core only sees two seams:
//!
//! - [`CommandSink`]: receives one decoded [`ZoneCommand`] per inbound message
//! - [`StateSink`]: accepts one zone state notification at a time
//!
//! [`MqttTransport`] implements the MQTT side of both: it dispatches inbound
//! command messages to a `CommandSink` and is itself a `StateSink`.

mod mqtt;
mod topics;

pub use mqtt::{MqttTransport, MqttTransportBuilder};
pub use topics::{NAMESPACE, TopicScheme};

use std::future::Future;
use std::sync::Arc;

use crate::error::TransportError;
use crate::types::{PowerState, ZoneCommand, ZoneId};

/// Receiver of decoded inbound commands.
///
/// The transport calls [`handle_command`](CommandSink::handle_command) once
/// per delivered message, possibly concurrently, and acknowledges the
/// message after the returned future completes. Failures are the sink's to
/// report; nothing is returned to the transport.
pub trait CommandSink: Send + Sync + 'static {
    /// Handles one command.
    fn handle_command(&self, command: ZoneCommand) -> impl Future<Output = ()> + Send;
}

/// Destination for zone state notifications.
pub trait StateSink: Send + Sync {
    /// Publishes the state of one zone.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the notification cannot be queued.
    fn publish_state(
        &self,
        zone: ZoneId,
        state: PowerState,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl<S: StateSink> StateSink for Arc<S> {
    fn publish_state(
        &self,
        zone: ZoneId,
        state: PowerState,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).publish_state(zone, state)
    }
}
