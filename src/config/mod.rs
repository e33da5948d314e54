// Configuration management module
// TOML settings plus the interactive editor and credential prompt

pub mod interactive;
pub mod settings;


pub use interactive::{prompt_api_key, run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, DocumentLocation, DocumentsConfig, RetrievalConfig, ServiceConfig,
};

/// Resolve the application directory, honouring an explicit override
#[inline]
pub fn resolve_config_dir(
    override_dir: Option<std::path::PathBuf>,
) -> Result<std::path::PathBuf, ConfigError> {
    override_dir.map_or_else(Config::default_dir, Ok)
}
