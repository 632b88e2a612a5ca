// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use crate::types::{ZoneId, ZoneState};

/// A zone whose state differs between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneChange {
    /// The zone that changed.
    pub id: ZoneId,
    /// State in the earlier snapshot, `None` if the zone was absent.
    pub previous: Option<ZoneState>,
    /// State in the newer snapshot.
    pub current: ZoneState,
}

impl ZoneChange {
    /// Returns `true` if the zone moved between two definite states.
    #[must_use]
    pub fn is_transition(&self) -> bool {
        matches!(self.previous, Some(previous) if !previous.is_unknown())
            && !self.current.is_unknown()
    }
}

impl fmt::Display for ZoneChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.previous {
            Some(previous) => write!(f, "zone {}: {previous} -> {}", self.id, self.current),
            None => write!(f, "zone {}: {}", self.id, self.current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_requires_two_known_states() {
        let change = ZoneChange {
            id: ZoneId::new(1),
            previous: Some(ZoneState::Off),
            current: ZoneState::On,
        };
        assert!(change.is_transition());

        let appeared = ZoneChange {
            previous: None,
            ..change
        };
        assert!(!appeared.is_transition());

        let lost = ZoneChange {
            current: ZoneState::Unknown,
            ..change
        };
        assert!(!lost.is_transition());
    }

    #[test]
    fn display() {
        let change = ZoneChange {
            id: ZoneId::new(2),
            previous: Some(ZoneState::Off),
            current: ZoneState::On,
        };
        assert_eq!(change.to_string(), "zone 2: OFF -> ON");
    }
}
