// Configuration management module
// This module handles TOML configuration management and settings

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    ChatConfig, Config, ConfigError, EmbeddingConfig, RetrievalConfig, ServerConfig,
    parse_endpoint,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
