//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};
use kuvasz_session::api::Resource;
use kuvasz_session::build_info::HELP_BUILD_METADATA;

/// Session-aware command line client for the kuvasz-streamer console API.
#[derive(Debug, Parser)]
#[command(name = "kuvasz-session", version, after_help = HELP_BUILD_METADATA)]
pub struct Args {
    /// Path to config file (default: ./kuvasz-session.toml or
    /// ~/.config/kuvasz-session/config.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Override API base URL.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Override login username.
    #[arg(short = 'u', long = "username")]
    pub username: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write the default config to ~/.config/kuvasz-session/config.toml.
    Init {
        /// Replace an existing file (a timestamped backup is kept).
        #[arg(long)]
        force: bool,
    },

    /// Log in and keep the session renewed until Ctrl-C, then log out.
    Watch,

    /// List records of a resource (db, url, tbl or map).
    List {
        resource: Resource,

        /// One-based page number.
        #[arg(long, default_value_t = 1)]
        page: u64,

        #[arg(long = "per-page", default_value_t = 25)]
        per_page: u64,

        /// Field to sort by.
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending instead of ascending.
        #[arg(long, requires = "sort")]
        desc: bool,

        /// Filter as FIELD=VALUE. Repeatable.
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },

    /// Show one record.
    Get { resource: Resource, id: i64 },

    /// Delete one record.
    Delete { resource: Resource, id: i64 },

    /// Create the destination table for a mapped source table.
    CreateTable { map_id: i64 },

    /// Create the destination table and start replicating into it.
    CloneTable { map_id: i64 },

    /// Re-read source schemas into the table map.
    RefreshMaps,

    /// Restart replication for every source URL.
    RestartAll,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got `{raw}`")),
    }
}
