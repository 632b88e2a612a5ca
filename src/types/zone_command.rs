// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use super::{PowerState, ZoneId};

/// A remote request to bring a zone to a power state.
///
/// Decoded from one inbound message and consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneCommand {
    /// Target zone.
    pub zone: ZoneId,
    /// Requested state.
    pub desired: PowerState,
}

impl ZoneCommand {
    /// Creates a command.
    #[must_use]
    pub const fn new(zone: ZoneId, desired: PowerState) -> Self {
        Self { zone, desired }
    }
}

impl fmt::Display for ZoneCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone {} -> {}", self.zone, self.desired)
    }
}
