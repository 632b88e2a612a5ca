// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use super::BridgeContext;
use crate::error::{ConsistencyError, Error};
use crate::protocol::CommandSink;
use crate::types::ZoneCommand;

/// What a successfully handled command did to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The zone was already in the requested state; nothing was sent.
    Unchanged,
    /// A toggle pulse was sent to the zone.
    Toggled,
}

/// Applies remote power commands to the amplifier.
///
/// Zone toggling is edge-triggered, so every command reads the current
/// state first and only pulses the zone when it differs from the request.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    context: Arc<BridgeContext>,
}

impl CommandHandler {
    /// Creates a handler over the shared context.
    #[must_use]
    pub fn new(context: Arc<BridgeContext>) -> Self {
        Self { context }
    }

    /// Brings one zone to the requested state.
    ///
    /// # Errors
    ///
    /// - [`ConsistencyError::ZoneOutOfRange`] if the device did not report the zone
    /// - [`ConsistencyError::UnknownState`] if the zone's value is unreadable
    /// - [`DeviceError`](crate::DeviceError) if reading or toggling fails
    pub async fn handle(&self, command: ZoneCommand) -> crate::Result<CommandOutcome> {
        let device = self.context.device();
        let zones = device.fetch_zones().await?;

        let zone = zones
            .get(command.zone)
            .ok_or(ConsistencyError::ZoneOutOfRange {
                zone: command.zone,
                available: zones.len(),
            })?;

        let current = zone
            .state
            .power()
            .ok_or(ConsistencyError::UnknownState { zone: command.zone })?;

        if current == command.desired {
            tracing::debug!(zone = %command.zone, state = %current, "Zone already in requested state");
            return Ok(CommandOutcome::Unchanged);
        }

        device.set_zone_power(command.zone, command.desired).await?;
        tracing::info!(
            zone = %command.zone,
            from = %current,
            to = %command.desired,
            "Zone toggled"
        );
        Ok(CommandOutcome::Toggled)
    }
}

impl CommandSink for CommandHandler {
    async fn handle_command(&self, command: ZoneCommand) {
        match self.handle(command).await {
            Ok(outcome) => {
                tracing::debug!(%command, ?outcome, "Command handled");
            }
            Err(Error::Consistency(e)) => {
                tracing::warn!(%command, error = %e, "Dropping command");
            }
            Err(e) => {
                tracing::error!(%command, error = %e, "Command failed");
            }
        }
    }
}
