pub mod loader;
pub mod schema;

pub use loader::{
    load_config, load_config_from_file, resolve_api_key, ConfigFormat, ResolvedConfig,
};
pub use schema::{DataModeSetting, PharmosConfig, ProviderSettings, WorkerSettings};
