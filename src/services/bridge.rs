//! Livoltek Bridge Background Service.
//! This service bridges the Livoltek cloud and Home Assistant: it polls the site
//! through the coordinator and publishes every changed sensor state.

use async_lock::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, watch};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::coordinator::{self, Coordinator, Snapshot};
use super::sensors::{self, SensorKey};
use crate::integration::homeassistant;

pub struct LivoltekBridgeBackgroundService {
    coordinator: Mutex<Coordinator>,
    snapshots: watch::Receiver<Option<Arc<Snapshot>>>,
    homeassistant: Arc<homeassistant::Client>,
    site_id: String,
    poll_interval: Duration,
    refresh_requested: Notify,
}

impl LivoltekBridgeBackgroundService {
    /// Creates a new instance of `LivoltekBridgeBackgroundService`.
    pub fn new(
        coordinator: Coordinator,
        homeassistant: Arc<homeassistant::Client>,
        poll_interval: Duration,
    ) -> Self {
        LivoltekBridgeBackgroundService {
            snapshots: coordinator.subscribe(),
            site_id: coordinator.settings().site_id.clone(),
            coordinator: Mutex::new(coordinator),
            homeassistant,
            poll_interval,
            refresh_requested: Notify::new(),
        }
    }

    /// Run the background service until `shutdown` is cancelled.
    /// Returns an error as soon as polling has stopped for good.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), anyhow::Error> {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            result = self.check_site() => {
                if let Err(e) = result {
                    log::warn!("Startup site check failed: {e}");
                }
            }
        }

        let publishing = shutdown.child_token();
        let (polling, ()) = tokio::join!(
            async {
                let result = self.poll_task(shutdown).await;
                publishing.cancel();
                result
            },
            self.publish_task(publishing.clone())
        );
        Ok(polling?)
    }

    /// Latest snapshot committed by the coordinator.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshots.borrow().clone()
    }

    /// Run a refresh cycle now. Waits for an in-flight cycle to finish first.
    pub async fn refresh_now(&self) -> coordinator::Result<Arc<Snapshot>> {
        self.coordinator.lock().await.refresh().await
    }

    /// Ask the poll task for a refresh without waiting for the next tick.
    pub fn request_refresh(&self) {
        self.refresh_requested.notify_one();
    }

    /// Check that the configured site belongs to the user.
    pub async fn check_site(&self) -> coordinator::Result<bool> {
        let sites = self.coordinator.lock().await.list_sites().await?;
        let found = sites.iter().any(|site| site.id == self.site_id);
        if found {
            log::info!("Site {} found, polling every {:?}", self.site_id, self.poll_interval);
        } else {
            log::warn!(
                "Site {} not found among the {} site(s) of the user",
                self.site_id,
                sites.len()
            );
        }
        Ok(found)
    }

    /// Publish the sensors of `snapshot` whose value differs from `published`.
    /// Returns the number of sensors updated in Home Assistant.
    pub async fn sync_sensors(
        &self,
        snapshot: &Snapshot,
        published: &mut HashMap<SensorKey, Option<f64>>,
    ) -> Result<usize, anyhow::Error> {
        let mut updated = 0;
        let mut failed = 0;

        for value in sensors::sensor_values(snapshot) {
            if published.get(&value.key()) == Some(&value.value) {
                continue;
            }
            let sensor = value.to_sensor(&self.site_id);
            match self.homeassistant.set_sensor(&sensor).await {
                Ok(()) => {
                    log::debug!("Updated {} in Home Assistant: {:?}", sensor.entity_id, sensor.value);
                    published.insert(value.key(), value.value);
                    updated += 1;
                }
                Err(e) => {
                    log::error!("Failed to update {} in Home Assistant: {e}", sensor.entity_id);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            anyhow::bail!("{failed} sensor(s) not updated in Home Assistant");
        }
        Ok(updated)
    }

    /// Shutdown the service and forget the session.
    pub async fn shutdown(&self) {
        self.coordinator.lock().await.clear_token();
    }

    /// Refresh on every tick or requested refresh until shutdown.
    /// Polling stops for good when the credential is rejected.
    async fn poll_task(&self, shutdown: CancellationToken) -> coordinator::Result<()> {
        let mut interval = interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = interval.tick() => {}
                _ = self.refresh_requested.notified() => {}
            }

            let result = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                result = self.refresh_now() => result,
            };

            match result {
                Ok(snapshot) => log::debug!("Snapshot of {} committed", snapshot.fetched_at),
                Err(e) if e.is_authentication_error() => {
                    log::error!("{e}; polling stopped");
                    return Err(e);
                }
                Err(e) => log::error!("Error refreshing Livoltek data: {e}"),
            }
        }
    }

    /// Publish each new snapshot until shutdown.
    async fn publish_task(&self, shutdown: CancellationToken) {
        let mut snapshots = self.snapshots.clone();
        let mut published = HashMap::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            let snapshot = snapshots.borrow_and_update().clone();
            if let Some(snapshot) = snapshot {
                if let Err(e) = self.sync_sensors(&snapshot, &mut published).await {
                    log::error!("Error publishing sensors: {e}");
                }
            }
        }
    }
}
