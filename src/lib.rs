#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! livoltek-bridge - Polls the Livoltek cloud and publishes the site's
//! telemetry as Home Assistant sensors.
pub mod core;
pub mod integration;
pub mod server;
pub mod services;
