// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the device client, the bridge, and the transport.
//!
//! # Types
//!
//! - [`PowerState`] - On/Off as commanded or published
//! - [`ZoneState`] - On/Off/Unknown as reported by the device
//! - [`ZoneId`] - Positional zone identifier (0 = main power)
//! - [`ZoneCommand`] - Decoded remote power request

mod power;
mod zone_command;
mod zone_id;

pub use power::{PowerState, ZoneState};
pub use zone_command::ZoneCommand;
pub use zone_id::ZoneId;
