//! Compile-time build metadata exposed to the CLI.

/// Semver package version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("KUVASZ_BUILD_GIT_HASH");

/// Build timestamp captured at compile time.
pub const BUILD_TIMESTAMP: &str = env!("KUVASZ_BUILD_TIMESTAMP");

/// Help trailer block that surfaces build metadata in `kuvasz-session --help`.
pub const HELP_BUILD_METADATA: &str = concat!(
    "Build metadata:\n  commit: ",
    env!("KUVASZ_BUILD_GIT_HASH"),
    "\n  built: ",
    env!("KUVASZ_BUILD_TIMESTAMP")
);

/// One-line metadata logged when a long-running command starts.
pub fn startup_metadata_line() -> String {
    format!("v{VERSION} ({GIT_COMMIT}, built {BUILD_TIMESTAMP})")
}
