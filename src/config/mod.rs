// Configuration system: TOML schema with embedded defaults, a global
// read-locked instance, and startup validation.

mod macros;
mod schemas;
mod utils;

pub use schemas::{AllocationRule, AssetWeight, Config, DcaConfig, ExchangeConfig, NotificationsConfig};
pub use utils::{
    get_config_clone, is_config_initialized, load_config, load_config_from_path, with_config,
};
