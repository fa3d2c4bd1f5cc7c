//! Update Coordinator.
//! Runs one refresh cycle against the Livoltek API at a time and exposes the
//! latest complete snapshot of the site. Observers follow the snapshot through
//! a watch channel.
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::sync::Arc;
use std::time::Duration;
use strum_macros::Display;
use tokio::sync::watch;

use super::registry::{DeviceEntry, DeviceRegistry};
use crate::integration::livoltek::schemas::{
    DailyRecord, DeviceSummary, GridRecord, PowerFlow, Site, SiteSummary, SolarRecord,
};
use crate::integration::livoltek::{self, Client, ClientFactory, Credential};

/// Everything the coordinator needs to poll one site.
#[derive(Debug, Clone)]
pub struct LivoltekSettings {
    pub credential: Credential,
    pub user_token: String,
    pub site_id: String,
    /// Upper bound for fetching the details of one device.
    pub device_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CoordinatorState {
    Idle,
    Refreshing,
    Ready,
}

/// Result of one successful refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub site: Site,
    pub devices: Vec<DeviceSummary>,
    pub power_flow: PowerFlow,
    pub todays_grid: Option<GridRecord>,
    pub todays_solar: Option<SolarRecord>,
    pub fetched_at: DateTime<Local>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Authentication failed for account {account_id}: {source}")]
    AuthenticationFailed {
        account_id: String,
        source: livoltek::Error,
    },
    #[error("Update failed on {call} for site {site_id}: {source}")]
    UpdateFailed {
        call: &'static str,
        site_id: String,
        source: livoltek::Error,
    },
}

impl Error {
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Error::AuthenticationFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub struct Coordinator {
    factory: Arc<ClientFactory>,
    settings: LivoltekSettings,
    token: Option<String>,
    registry: DeviceRegistry,
    state: CoordinatorState,
    snapshot: watch::Sender<Option<Arc<Snapshot>>>,
}

impl Coordinator {
    /// Creates a new instance of `Coordinator`.
    pub fn new(factory: Arc<ClientFactory>, settings: LivoltekSettings) -> Self {
        let (snapshot, _) = watch::channel(None);
        Coordinator {
            factory,
            settings,
            token: None,
            registry: DeviceRegistry::new(),
            state: CoordinatorState::Idle,
            snapshot,
        }
    }

    /// Receiver notified on every committed snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot.subscribe()
    }

    /// Latest committed snapshot, `None` before the first successful cycle.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.borrow().clone()
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn settings(&self) -> &LivoltekSettings {
        &self.settings
    }

    /// Session token cached from the last login.
    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn device_registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Forget the session token; the next cycle logs in again.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Run one refresh cycle.
    /// On success the new snapshot replaces the previous one and is returned.
    /// On failure the previous snapshot stays visible.
    pub async fn refresh(&mut self) -> Result<Arc<Snapshot>> {
        self.state = CoordinatorState::Refreshing;
        log::debug!("Refreshing site {}", self.settings.site_id);

        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.snapshot.send_replace(Some(Arc::clone(&snapshot)));
                self.state = CoordinatorState::Ready;
                log::debug!("Site {} refreshed", self.settings.site_id);
                Ok(snapshot)
            }
            Err(e) => {
                self.state = CoordinatorState::Idle;
                Err(e)
            }
        }
    }

    /// List the sites the configured user has access to.
    pub async fn list_sites(&mut self) -> Result<Vec<SiteSummary>> {
        let client = self.client().await?;
        let user_token = self.settings.user_token.clone();
        client
            .list_sites(&user_token)
            .await
            .map_err(|e| self.update_failed("user sites", e))
    }

    async fn fetch_snapshot(&mut self) -> Result<Snapshot> {
        let client = self.client().await?;
        let user_token = self.settings.user_token.clone();
        let site_id = self.settings.site_id.clone();

        let site = client
            .get_site(&user_token, &site_id)
            .await
            .map_err(|e| self.update_failed("site overview", e))?;

        let devices = client
            .get_device_list(&user_token, &site_id)
            .await
            .map_err(|e| self.update_failed("device list", e))?;
        self.register_devices(&client, &devices).await;

        let power_flow = client
            .get_current_power_flow(&user_token, &site_id)
            .await
            .map_err(|e| self.update_failed("current power flow", e))?;

        let today = Local::now().date_naive();

        let grid = client
            .get_recent_grid(&user_token, &site_id)
            .await
            .map_err(|e| self.update_failed("recent grid energy", e))?;

        let solar = client
            .get_recent_solar(&user_token, &site_id)
            .await
            .map_err(|e| self.update_failed("recent solar energy", e))?;

        Ok(Snapshot {
            site,
            devices,
            power_flow,
            todays_grid: select_today(grid, today),
            todays_solar: select_today(solar, today),
            fetched_at: Local::now(),
        })
    }

    /// Get a client, reusing the cached token while it is valid.
    async fn client(&mut self) -> Result<Client> {
        let result = self
            .factory
            .get_client(&self.settings.credential, self.token.as_deref())
            .await;

        match result {
            Ok((client, token)) => {
                self.token = Some(token);
                Ok(client)
            }
            Err(source) => {
                self.token = None;
                if source.is_authentication_error() {
                    Err(Error::AuthenticationFailed {
                        account_id: self.settings.credential.account_id.clone(),
                        source,
                    })
                } else {
                    Err(self.update_failed("login", source))
                }
            }
        }
    }

    /// Register the devices not known yet. A device whose details fail or
    /// time out is skipped and retried on the next cycle.
    async fn register_devices(&mut self, client: &Client, devices: &[DeviceSummary]) {
        for device in devices {
            let serial = &device.inverter_sn;
            if self.registry.contains(serial) {
                continue;
            }

            let details = tokio::time::timeout(
                self.settings.device_timeout,
                client.get_device_details(
                    &self.settings.user_token,
                    &self.settings.site_id,
                    serial,
                ),
            )
            .await;

            match details {
                Ok(Ok(details)) => {
                    let entry = DeviceEntry::from(details);
                    log::info!(
                        "Registered device {} ({})",
                        entry.serial_number,
                        entry.model.as_deref().unwrap_or("unknown model")
                    );
                    self.registry.upsert(entry);
                }
                Ok(Err(e)) => log::warn!("Skipping device {serial}: {e}"),
                Err(_) => log::warn!(
                    "Skipping device {serial}: no details within {:?}",
                    self.settings.device_timeout
                ),
            }
        }
    }

    fn update_failed(&mut self, call: &'static str, source: livoltek::Error) -> Error {
        if matches!(source, livoltek::Error::Unauthorized) {
            log::warn!("Session token rejected, logging in again on the next cycle");
            self.token = None;
        }
        Error::UpdateFailed {
            call,
            site_id: self.settings.site_id.clone(),
            source,
        }
    }
}

/// The record stamped on `today` (local time), wherever it is in `records`.
pub fn select_today<T: DailyRecord>(records: Vec<T>, today: NaiveDate) -> Option<T> {
    records.into_iter().find(|record| {
        Local
            .timestamp_millis_opt(record.timestamp_millis())
            .single()
            .is_some_and(|time| time.date_naive() == today)
    })
}
