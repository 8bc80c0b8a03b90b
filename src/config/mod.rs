//! Configuration for lexportal.
//!
//! Settings from the TOML file are the base layer. Environment variables
//! override them, and the result is validated into a [`PortalConfig`].

pub(crate) mod helpers;
mod portal;

pub use portal::{ApiConfig, AssistantConfig, PortalConfig, StorageConfig};
