// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the amplifier.

use reqwest::{Client, Response, StatusCode};

use crate::config::DeviceSettings;
use crate::error::DeviceError;
use crate::state::ZoneList;
use crate::types::{PowerState, ZoneId};

use super::parse_status;

/// HTTP authentication credentials.
#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: String,
}

/// Client for the amplifier's HTTP interface.
///
/// Holds no device state: every call is an independent request, so the
/// client can be shared freely between the command handler and the state
/// publisher.
///
/// # Examples
///
/// ```no_run
/// use powerplant_bridge::config::DeviceSettings;
/// use powerplant_bridge::device::DeviceClient;
///
/// # async fn example() -> Result<(), powerplant_bridge::DeviceError> {
/// let settings = DeviceSettings::new("amp", "192.168.1.20", 6);
/// let client = DeviceClient::new(&settings)?;
///
/// for zone in &client.fetch_zones().await? {
///     println!("zone {} is {}", zone.id, zone.state);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeviceClient {
    base_url: String,
    client: Client,
    credentials: Option<Credentials>,
    zone_count: usize,
}

impl DeviceClient {
    /// Path of the status document.
    pub const STATUS_PATH: &'static str = "/status.xml";
    /// Path of the zone toggle endpoint.
    pub const ZONES_PATH: &'static str = "/zones.cgi";

    /// Creates a client from device settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(settings: &DeviceSettings) -> Result<Self, DeviceError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;

        let credentials = settings
            .credentials()
            .map(|(username, password)| Credentials {
                username: username.to_string(),
                password: password.to_string(),
            });

        Ok(Self {
            base_url: settings.base_url(),
            client,
            credentials,
            zone_count: settings.zones,
        })
    }

    /// Returns the base URL of the device.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured number of zones.
    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.zone_count
    }

    /// Reads the status document and returns the current zones.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the request fails, the device answers with a
    /// non-2xx status, or the document is not well-formed XML. Unreadable
    /// zone values do not fail the call; they come back as unknown.
    pub async fn fetch_zones(&self) -> Result<ZoneList, DeviceError> {
        let response = self.get(&self.status_url()).await?;
        let body = response.text().await?;

        let zones = parse_status(&body, self.zone_count)?;

        tracing::debug!(
            zones = zones.len(),
            main_power = zones.has_main_power(),
            "Fetched device status"
        );
        Ok(zones)
    }

    /// Sends a toggle pulse to a zone.
    ///
    /// The device has no level-set endpoint, so `desired` is only used for
    /// logging. Callers must check the current state first.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the request fails or the device answers with
    /// a non-2xx status.
    pub async fn set_zone_power(&self, zone: ZoneId, desired: PowerState) -> Result<(), DeviceError> {
        tracing::debug!(zone = %zone, desired = %desired, "Sending zone toggle");
        self.get(&self.zone_url(zone)).await?;
        Ok(())
    }

    fn status_url(&self) -> String {
        format!("{}{}", self.base_url, Self::STATUS_PATH)
    }

    fn zone_url(&self, zone: ZoneId) -> String {
        format!("{}{}?zone={zone}", self.base_url, Self::ZONES_PATH)
    }

    async fn get(&self, url: &str) -> Result<Response, DeviceError> {
        tracing::trace!(url = %url, "Sending HTTP request");

        let mut request = self.client.get(url);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(DeviceError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            return Err(DeviceError::Status {
                code: response.status().as_u16(),
                reason: response
                    .status()
                    .canonical_reason()
                    .unwrap_or("Unknown")
                    .to_string(),
            });
        }

        Ok(response)
    }
}
