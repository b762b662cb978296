//! Environment overrides.
//!
//! `KUVASZ_*` variables win over every file source.

use crate::error::ConfigError;

use super::Config;

pub(super) fn apply_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_empty(env_lookup, "KUVASZ_BASE_URL") {
        config.gateway.base_url = url;
    }
    if let Some(endpoint) = non_empty(env_lookup, "KUVASZ_REFRESH_ENDPOINT") {
        config.gateway.refresh_endpoint = endpoint;
    }
    if let Some(name) = non_empty(env_lookup, "KUVASZ_LOGOUT_EVENT") {
        config.session.logout_event_name = name;
    }
    if let Some(username) = non_empty(env_lookup, "KUVASZ_USERNAME") {
        config.login.username = username;
    }
    if let Some(timeout) = non_empty(env_lookup, "KUVASZ_HTTP_TIMEOUT_SECS") {
        let parsed = timeout.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid KUVASZ_HTTP_TIMEOUT_SECS value `{timeout}`: expected positive integer seconds"
            ))
        })?;
        // Clamp to at least 1 second to avoid "no-timeout" accidental behavior.
        config.gateway.http_timeout_secs = parsed.max(1);
    }
    Ok(())
}

fn non_empty<FEnv>(env_lookup: &FEnv, name: &str) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
