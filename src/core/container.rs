//! Dependency injection container for livoltek-bridge.

use std::sync::Arc;

use super::config::Config;
use crate::integration::{homeassistant, livoltek};
use crate::services::{self, Coordinator};

/// Container for application dependencies.
pub struct Container {
    config: Arc<Config>,
    livoltek: Arc<livoltek::ClientFactory>,
    homeassistant: Arc<homeassistant::Client>,
    bridge_service: Arc<services::LivoltekBridgeBackgroundService>,
}

impl Container {
    /// Creates a new instance of the dependency injection container.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let config = Arc::new(config);

        let http = Arc::new(livoltek::HttpClient::new(
            config.livoltek_request_timeout.into(),
        )?);
        let mut factory = livoltek::ClientFactory::new(http);
        if let Some(url) = &config.livoltek_url {
            factory = factory.with_endpoint(url.clone());
        }
        let livoltek = Arc::new(factory);

        let homeassistant = Arc::new(homeassistant::Client::new(
            config.homeassistant_url.clone(),
            config.homeassistant_token.clone(),
            config.livoltek_request_timeout.into(),
        )?);

        let coordinator = Coordinator::new(Arc::clone(&livoltek), config.livoltek_settings());
        let bridge_service = Arc::new(services::LivoltekBridgeBackgroundService::new(
            coordinator,
            Arc::clone(&homeassistant),
            config.livoltek_poll_interval.into(),
        ));

        Ok(Self {
            config,
            livoltek,
            homeassistant,
            bridge_service,
        })
    }

    /// Returns a reference to the application config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a reference to the bridge service.
    pub fn bridge_service(&self) -> Arc<services::LivoltekBridgeBackgroundService> {
        Arc::clone(&self.bridge_service)
    }

    /// Returns a reference to the Livoltek client factory.
    pub fn livoltek_factory(&self) -> Arc<livoltek::ClientFactory> {
        Arc::clone(&self.livoltek)
    }

    /// Returns a reference to the HomeAssistant client.
    pub fn homeassistant_client(&self) -> Arc<homeassistant::Client> {
        Arc::clone(&self.homeassistant)
    }

    /// Shutdown the container and clean up resources.
    pub async fn shutdown(&self) {
        self.bridge_service.shutdown().await;
    }
}
