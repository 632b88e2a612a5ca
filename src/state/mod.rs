// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone state model.
//!
//! A [`ZoneList`] is the normalized result of one device status read. Lists
//! are compared by value; [`ZoneChange`] describes a zone that differs
//! between two of them.
//!
//! # Examples
//!
//! ```
//! use powerplant_bridge::state::ZoneList;
//! use powerplant_bridge::types::ZoneState;
//!
//! let before = ZoneList::from_states(Some(ZoneState::On), [ZoneState::Off]);
//! let after = ZoneList::from_states(Some(ZoneState::On), [ZoneState::On]);
//!
//! let changes = after.changes_since(&before);
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].current, ZoneState::On);
//! ```

mod zone_change;
mod zone_list;

pub use zone_change::ZoneChange;
pub use zone_list::{Zone, ZoneList};
