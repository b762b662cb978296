//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;

use super::env::apply_env_overrides;
use super::sources::{config_root_dir, read_config_text_with_sources};
use super::Config;

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

pub(super) fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<Config, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root)?;
    debug!(?source, "config source resolved");
    let mut config: Config = toml::from_str(&config_text)?;
    apply_env_overrides(&mut config, &env_lookup)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base_url = config.gateway.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Invalid(format!(
            "gateway.base_url `{base_url}` must start with http:// or https://"
        )));
    }
    if config.gateway.refresh_endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "gateway.refresh_endpoint must not be empty".to_string(),
        ));
    }
    if config.session.logout_event_name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "session.logout_event_name must not be empty".to_string(),
        ));
    }
    if config.session.default_token_ttl_secs <= config.session.renewal_margin_secs {
        return Err(ConfigError::Invalid(format!(
            "session.default_token_ttl_secs ({}) must exceed session.renewal_margin_secs ({})",
            config.session.default_token_ttl_secs, config.session.renewal_margin_secs
        )));
    }
    Ok(())
}
