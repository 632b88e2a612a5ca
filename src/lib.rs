// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `powerplant_bridge` - Bridges a PS Audio Power Plant to MQTT.
//!
//! The amplifier exposes its zone outputs over a small HTTP interface
//! (`/status.xml` for reading, `/zones.cgi?zone=<id>` for toggling). This
//! crate mirrors those zones to an MQTT broker and applies remote power
//! commands back to the device.
//!
//! # Topics
//!
//! ```text
//! ps-audio/power-plant/<name>/zones/<id>/power/set    "ON" / "OFF" (any case)
//! ps-audio/power-plant/<name>/zones/<id>/power/state  "ON" / "OFF"
//! ```
//!
//! Zone `0` is the device-wide main power; zones `1..` are the outputs.
//!
//! # Quick Start
//!
//! ```no_run
//! use powerplant_bridge::{Bridge, BridgeConfig, DeviceSettings, MqttSettings};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> powerplant_bridge::Result<()> {
//!     let config = BridgeConfig::new(
//!         DeviceSettings::new("living-room", "192.168.1.20", 6),
//!         MqttSettings::new("192.168.1.50"),
//!     );
//!
//!     let bridge = Bridge::connect(config, CancellationToken::new()).await?;
//!     bridge.run().await
//! }
//! ```
//!
//! # Reading the device directly
//!
//! ```no_run
//! use powerplant_bridge::{DeviceClient, DeviceSettings};
//!
//! # async fn example() -> powerplant_bridge::Result<()> {
//! let device = DeviceClient::new(&DeviceSettings::new("amp", "192.168.1.20", 3))?;
//! for zone in &device.fetch_zones().await? {
//!     println!("zone {}: {}", zone.id, zone.state);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod state;
pub mod types;

pub use bridge::{Bridge, BridgeContext, CommandHandler, CommandOutcome, StatePublisher, TickReport};
pub use config::{BridgeConfig, DeviceSettings, MqttSettings};
pub use device::DeviceClient;
pub use error::{ConfigError, ConsistencyError, DeviceError, Error, Result, TransportError};
pub use protocol::{CommandSink, MqttTransport, MqttTransportBuilder, StateSink, TopicScheme};
pub use state::{Zone, ZoneChange, ZoneList};
pub use types::{PowerState, ZoneCommand, ZoneId, ZoneState};
