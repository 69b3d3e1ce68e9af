//! Configuration management for the calldata tracker.
//!
//! This module provides configuration loading from both base configuration file
//! and environment variables. Environment variables override the base configuration
//! and use the prefix `MULTIPROXY_`.

use core::time::Duration;

use std::{collections::HashMap, path::PathBuf};

use config::{ConfigError, Environment, File, FileFormat};
use multiproxy_calldata_domain::Address;
use serde::Deserialize;

/// Loads the tracker configuration from base config and environment variables.
///
/// Environment variables use double underscores `__` to denote nested keys.
/// For example, `MULTIPROXY_TRACKER__POLL_INTERVAL` corresponds to `tracker.poll_interval`.
/// `MULTIPROXY_TRACKER__ADDRESSES` takes a comma separated list.
///
/// # Errors
///
/// If the configuration could not be loaded or parsed
pub fn get_configuration() -> Result<Config, ConfigError> {
    config::Config::builder()
        .add_source(File::from_str(include_str!("base_config.ron"), FileFormat::Ron))
        .add_source(
            Environment::with_prefix(Config::CONFIG_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("tracker.addresses")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// Root configuration structure containing all tracker settings.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Polling configuration
    pub tracker: TrackerConfig,

    /// Recorded chain configuration
    pub snapshot: SnapshotConfig,

    /// Local signer configuration
    pub signer: SignerConfig,
}

/// Polling settings.
#[derive(Debug, Deserialize)]
pub struct TrackerConfig {
    /// Time between two polls (e.g. "6s")
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Stop after this many polls; poll until interrupted if unset
    pub max_cycles: Option<u64>,

    /// The watched accounts, hex encoded; every recorded extrinsic if empty
    pub addresses: Vec<Address>,
}

/// Recorded chain settings.
#[derive(Debug, Deserialize)]
pub struct SnapshotConfig {
    /// Path to the JSON chain snapshot, re-read on every poll
    pub path: PathBuf,
}

/// Local signer settings.
#[derive(Debug, Deserialize)]
pub struct SignerConfig {
    /// Addresses the local signer holds keys for, mapped to the wallet source holding each key
    pub local_addresses: HashMap<Address, String>,
}

impl Config {
    const CONFIG_ENV_PREFIX: &str = "MULTIPROXY";
}
