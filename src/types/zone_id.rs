// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::str::FromStr;

/// Positional identifier of an amplifier zone.
///
/// Id 0 is the device-wide main power; ids from 1 upwards are the zones
/// in the order the device lists them.
///
/// # Examples
///
/// ```
/// use powerplant_bridge::types::ZoneId;
///
/// let zone: ZoneId = "3".parse().unwrap();
/// assert_eq!(zone.value(), 3);
/// assert!(ZoneId::MAIN.is_main());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ZoneId(u32);

impl ZoneId {
    /// The device-wide main power pseudo-zone.
    pub const MAIN: Self = Self(0);

    /// Creates a zone id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric id.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Returns `true` for the device-wide pseudo-zone.
    #[must_use]
    pub const fn is_main(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ZoneId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}
