//! Default configuration constants.

/// Embedded default config template written by `kuvasz-session init`.
pub(super) const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/kuvasz-session.toml");
/// Local config file name looked up in the working directory.
pub(super) const LOCAL_CONFIG_FILE: &str = "kuvasz-session.toml";
/// Directory and file name under the per-user config root.
pub(super) const GLOBAL_CONFIG_DIR: &str = "kuvasz-session";
pub(super) const GLOBAL_CONFIG_FILE: &str = "config.toml";
/// Default kuvasz-streamer API base URL.
pub(super) const DEFAULT_BASE_URL: &str = "http://localhost:8000";
/// Default timeout for gateway and API requests.
pub(super) const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// The backend only knows this user.
pub(super) const DEFAULT_USERNAME: &str = "admin";
