//! Core of the application: configuration and dependency injection.
pub mod config;
pub mod container;
