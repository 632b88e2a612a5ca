// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone snapshot built from a single device query.

use crate::types::{ZoneId, ZoneState};

use super::ZoneChange;

/// A single zone as reported by one device query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Zone {
    /// Positional id (0 = main power).
    pub id: ZoneId,
    /// Reported state.
    pub state: ZoneState,
}

impl Zone {
    /// Creates a zone.
    #[must_use]
    pub const fn new(id: ZoneId, state: ZoneState) -> Self {
        Self { id, state }
    }
}

/// Ordered zones from one status read.
///
/// The main power entry, when the device reports one, comes first with id 0.
/// Per-zone entries follow with ids 1, 2, ... in device order. A list is
/// never updated in place; every poll builds a new one.
///
/// # Examples
///
/// ```
/// use powerplant_bridge::state::ZoneList;
/// use powerplant_bridge::types::{ZoneId, ZoneState};
///
/// let list = ZoneList::from_states(Some(ZoneState::On), [ZoneState::Off, ZoneState::Unknown]);
/// assert_eq!(list.len(), 3);
/// assert_eq!(list.state(ZoneId::new(1)), Some(ZoneState::Off));
/// assert_eq!(list.state(ZoneId::new(5)), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneList {
    zones: Vec<Zone>,
}

impl ZoneList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from an optional main power state and per-zone states.
    ///
    /// Ids are assigned by position: 0 for main power, then 1 upwards.
    pub fn from_states(
        main_power: Option<ZoneState>,
        zones: impl IntoIterator<Item = ZoneState>,
    ) -> Self {
        let main = main_power.map(|state| Zone::new(ZoneId::MAIN, state));
        let numbered = zones
            .into_iter()
            .zip(1u32..)
            .map(|(state, id)| Zone::new(ZoneId::new(id), state));

        Self {
            zones: main.into_iter().chain(numbered).collect(),
        }
    }

    /// Returns the zone with the given id.
    #[must_use]
    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    /// Returns the state of the zone with the given id.
    #[must_use]
    pub fn state(&self, id: ZoneId) -> Option<ZoneState> {
        self.get(id).map(|zone| zone.state)
    }

    /// Returns `true` if the device reported a main power value.
    #[must_use]
    pub fn has_main_power(&self) -> bool {
        self.zones.first().is_some_and(|zone| zone.id.is_main())
    }

    /// Number of entries, main power included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns `true` if the device reported nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Iterates zones in position order.
    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    /// Returns the zones as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Zone] {
        &self.zones
    }

    /// Lists zones whose state differs from `previous`.
    ///
    /// Zones missing from `previous` are reported with `previous: None`.
    #[must_use]
    pub fn changes_since(&self, previous: &ZoneList) -> Vec<ZoneChange> {
        self.zones
            .iter()
            .filter_map(|zone| {
                let before = previous.state(zone.id);
                (before != Some(zone.state)).then_some(ZoneChange {
                    id: zone.id,
                    previous: before,
                    current: zone.state,
                })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ZoneList {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}
