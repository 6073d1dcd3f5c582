//! Centralized path resolution.
//!
//! All file and directory locations are resolved here so the bot behaves
//! the same regardless of working directory. Data lives under the platform
//! application-data directory:
//! - macOS: `~/Library/Application Support/dcabot/`
//! - Windows: `%LOCALAPPDATA%\dcabot\`
//! - Linux: `$XDG_DATA_HOME/dcabot/` (fallback `~/.local/share/dcabot/`)
//!
//! Layout:
//! ```text
//! dcabot/
//! ├── data/
//! │   ├── config.toml
//! │   └── trades.json
//! └── logs/
//!     └── dcabot.log
//! ```

use once_cell::sync::Lazy;
use std::path::PathBuf;

static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

fn resolve_base_directory() -> PathBuf {
    const APP_DIR: &str = "dcabot";

    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

pub fn get_data_directory() -> PathBuf {
    BASE_DIRECTORY.join("data")
}

pub fn get_logs_directory() -> PathBuf {
    BASE_DIRECTORY.join("logs")
}

/// Main configuration file path
pub fn get_config_path() -> PathBuf {
    get_data_directory().join("config.toml")
}

/// Durable trade ledger path
pub fn get_ledger_path() -> PathBuf {
    get_data_directory().join("trades.json")
}

/// Log file path
pub fn get_log_path() -> PathBuf {
    get_logs_directory().join("dcabot.log")
}

/// Create every directory the bot writes into.
///
/// Must run before logger initialization (the logger needs the logs
/// directory to exist).
pub fn ensure_all_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_data_directory())?;
    std::fs::create_dir_all(get_logs_directory())?;
    Ok(())
}
