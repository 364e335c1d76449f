//! Configuration loading, env substitution, and deployment overrides.
//!
//! Config files: `pixbot.toml`, `pixbot.yaml`, or `pixbot.json`
//! Searched in `./` then `~/.config/pixbot/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{
        PixbotConfig, QueueConfig, ResultsConfig, ServerConfig, StorageConfig, TelegramConfig,
    },
};
