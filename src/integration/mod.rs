//! Integrations with external HTTP APIs.
pub mod homeassistant;
pub mod livoltek;
