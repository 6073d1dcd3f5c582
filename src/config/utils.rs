//! Loading and access helpers for the global configuration.

use super::schemas::Config;
use crate::paths;
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::RwLock;

/// Global configuration instance, the single source of truth after startup.
static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Load configuration from the default location and initialize the global
/// instance. A missing file falls back to defaults (simulated mode), so a
/// fresh install runs without touching real funds.
pub fn load_config() -> Result<(), String> {
    load_config_from_path(&paths::get_config_path().to_string_lossy())
}

/// Load configuration from a specific TOML file path.
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        eprintln!("Config file '{}' not found, using default values", path);
        Config::default()
    };

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(())
}

/// Execute a closure with read access to the configuration.
///
/// The recommended way to read config values:
/// `with_config(|cfg| cfg.dca.rsi_period)`.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    let config_lock = CONFIG
        .get()
        .expect("Config not initialized. Call load_config() first.");

    let config = config_lock
        .read()
        .expect("Failed to acquire config read lock");

    f(&config)
}

/// Clone the entire configuration. Useful for holding values across await
/// points; prefer `with_config` for simple reads.
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}
