//! Configuration module for the Mirador connector.
//!
//! This module contains the per-instance datasource settings.

pub mod settings;

pub use settings::{
    InstanceSettings, PluginSettings, SecretSettings, SettingsError, DEFAULT_TIMEOUT,
};
