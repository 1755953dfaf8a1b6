//! Application service: configuration use-cases.

use crate::application::ports::ConfigStore;
use crate::domain::config::{A0Config, apply_config_value};
use anyhow::Result;

/// Validate and persist one setting. Returns the updated configuration.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or the file cannot be
/// read or written. Nothing is written on a validation error.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<A0Config> {
    let mut config = store.load()?;
    apply_config_value(&mut config, key, value)?;
    store.save(&config)?;
    Ok(config)
}
