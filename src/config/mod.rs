//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`KUVASZ_BASE_URL`, `KUVASZ_REFRESH_ENDPOINT`,
//!    `KUVASZ_LOGOUT_EVENT`, `KUVASZ_HTTP_TIMEOUT_SECS`, `KUVASZ_USERNAME`)
//! 2. TOML file specified via --config CLI flag
//! 3. ./kuvasz-session.toml in the current directory
//! 4. $XDG_CONFIG_HOME/kuvasz-session/config.toml
//!    (or ~/.config/kuvasz-session/config.toml)
//! 5. Built-in defaults

mod defaults;
mod env;
mod init;
mod loader;
mod sources;
mod types;

pub use init::initialize_default_config;
pub use loader::load_config;
pub use sources::{config_root_dir, default_global_config_path};
pub use types::{Config, ConfigInitResult, GatewayConfig, LoginConfig, SessionConfig};
