//! Livoltek Integration Module
//! The integration is done via the Livoltek cloud HTTP JSON API.
pub mod auth;
mod client;
mod endpoint;
mod error;
mod factory;
mod http_client;
pub mod schemas;
pub mod token;

pub use client::Client;
pub use error::{Error, Result};
pub use factory::{ClientFactory, Credential, EMEA_ENDPOINT, GLOBAL_ENDPOINT, Region};
pub use http_client::HttpClient;
