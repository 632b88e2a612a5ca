// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::BridgeContext;
use crate::error::DeviceError;
use crate::protocol::StateSink;
use crate::state::ZoneList;

/// Counts from one publish tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Zones whose state was published.
    pub published: usize,
    /// Zones skipped because their state is unknown.
    pub skipped: usize,
    /// Zones whose publish was rejected by the sink.
    pub failed: usize,
}

/// Periodically mirrors the device's zone states to a [`StateSink`].
///
/// Every tick republishes the full state. The last snapshot is kept only
/// to log transitions.
pub struct StatePublisher<S> {
    context: Arc<BridgeContext>,
    sink: S,
    last: Mutex<ZoneList>,
}

impl<S: StateSink> StatePublisher<S> {
    /// Creates a publisher writing to `sink`.
    #[must_use]
    pub fn new(context: Arc<BridgeContext>, sink: S) -> Self {
        Self {
            context,
            sink,
            last: Mutex::new(ZoneList::new()),
        }
    }

    /// Returns the sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the snapshot taken by the last successful tick.
    #[must_use]
    pub fn last_snapshot(&self) -> ZoneList {
        self.last.lock().clone()
    }

    /// Fetches the zones once and publishes every known state.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the fetch fails; nothing is published then.
    /// Individual publish failures are counted in the report instead.
    pub async fn publish_tick(&self) -> Result<TickReport, DeviceError> {
        let zones = self.context.device().fetch_zones().await?;
        let mut report = TickReport::default();

        for zone in &zones {
            let Some(state) = zone.state.power() else {
                report.skipped += 1;
                continue;
            };
            match self.sink.publish_state(zone.id, state).await {
                Ok(()) => report.published += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(zone = %zone.id, state = %state, error = %e, "Failed to publish zone state");
                }
            }
        }

        let previous = std::mem::replace(&mut *self.last.lock(), zones.clone());
        for change in zones.changes_since(&previous) {
            if change.is_transition() {
                tracing::info!(zone = %change.id, "{change}");
            } else {
                tracing::debug!(zone = %change.id, "{change}");
            }
        }

        Ok(report)
    }

    /// Runs ticks on the configured interval until `cancel` fires.
    ///
    /// The first tick runs immediately. A tick that overruns delays the
    /// next one instead of bursting.
    pub async fn run(&self, cancel: CancellationToken) {
        let period = self.context.config().device.poll_interval;
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval = ?period, "State publisher started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.publish_tick().await {
                Ok(report) => tracing::trace!(?report, "Tick complete"),
                Err(e) => tracing::error!(error = %e, "Failed to fetch zone states"),
            }
        }

        tracing::info!("State publisher stopped");
    }
}

impl<S> std::fmt::Debug for StatePublisher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePublisher")
            .field("device", &self.context.topics().device_name())
            .field("zones", &self.last.lock().len())
            .finish_non_exhaustive()
    }
}
