// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Amplifier HTTP interface.
//!
//! The device exposes two endpoints:
//!
//! - `GET /status.xml` returns the main power and per-zone values
//! - `GET /zones.cgi?zone=<id>` toggles one zone
//!
//! [`DeviceClient`] wraps both; [`parse_status`] turns the status document
//! into a [`ZoneList`](crate::state::ZoneList).

mod client;
mod status_parser;

pub use client::DeviceClient;
pub use status_parser::parse_status;
