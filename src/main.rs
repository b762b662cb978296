//! CLI entry point for kuvasz-session.

mod cli;

use clap::Parser;
use kuvasz_session::api::{ApiClient, ListParams, SortOrder};
use kuvasz_session::auth::{AuthProvider, Credentials, HttpAuthGateway};
use kuvasz_session::broadcast::SharedStorage;
use kuvasz_session::build_info::startup_metadata_line;
use kuvasz_session::config::{initialize_default_config, load_config, Config, ConfigInitResult};
use kuvasz_session::session::{SessionManager, SessionState};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::Command;

/// How often `watch` checks whether the session is still alive.
const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() {
    init_logging();
    let args = cli::Args::parse();

    if let Command::Init { force } = args.command {
        match initialize_default_config(force) {
            Ok(result) => print_init_result(&result),
            Err(e) => {
                eprintln!("error: failed to initialize config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    // Apply CLI overrides.
    if let Some(url) = &args.base_url {
        config.gateway.base_url = url.clone();
    }
    if let Some(username) = &args.username {
        config.login.username = username.clone();
    }

    if let Err(msg) = run(&config, args.command).await {
        eprintln!("error: {msg}");
        std::process::exit(1);
    }
}

/// Log filter comes from `KUVASZ_LOG`, defaulting to `info`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("KUVASZ_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_init_result(result: &ConfigInitResult) {
    match result {
        ConfigInitResult::Created { path } => println!("wrote {}", path.display()),
        ConfigInitResult::AlreadyInitialized { path } => {
            println!("{} already exists (use --force to overwrite)", path.display())
        }
        ConfigInitResult::Overwritten { path, backup_path } => println!(
            "wrote {} (previous file saved as {})",
            path.display(),
            backup_path.display()
        ),
    }
}

async fn run(config: &Config, command: Command) -> Result<(), String> {
    info!(
        build = %startup_metadata_line(),
        base_url = %config.gateway.base_url,
        "kuvasz-session starting"
    );
    let gateway = Arc::new(HttpAuthGateway::new(
        &config.gateway.base_url,
        config.http_timeout(),
    ));
    // One process is one tab; the storage still carries its logout key.
    let storage = SharedStorage::new();
    let session = SessionManager::new(
        gateway.clone(),
        Arc::new(storage.attach()),
        config.session_settings(),
    );
    let auth = AuthProvider::new(
        gateway.clone(),
        session.clone(),
        config.gateway.refresh_endpoint.clone(),
    );
    let api = ApiClient::with_client(gateway.http().clone(), gateway.base_url(), session.clone());

    let credentials = Credentials::new(config.login.username.clone(), read_password()?);
    auth.login(&credentials)
        .await
        .map_err(|e| format!("login failed: {e}"))?;

    let result = match command {
        Command::Watch => watch(&auth).await,
        other => execute(&api, other).await,
    };

    auth.logout().await;
    session.shutdown();
    result
}

fn read_password() -> Result<String, String> {
    if let Ok(password) = std::env::var("KUVASZ_PASSWORD") {
        if !password.is_empty() {
            return Ok(password);
        }
    }
    rpassword::prompt_password("Password: ").map_err(|e| format!("failed to read password: {e}"))
}

async fn watch(auth: &AuthProvider) -> Result<(), String> {
    info!("watching session");
    if let Ok(Some(role)) = auth.permissions().await {
        info!(%role, "session established");
    }
    let mut ticker = tokio::time::interval(WATCH_POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, logging out");
                return Ok(());
            }
            _ = ticker.tick() => {
                if auth.session().state() == SessionState::LoggedOut {
                    warn!("session ended");
                    return Err("session ended; log in again".to_string());
                }
            }
        }
    }
}

async fn execute(api: &ApiClient, command: Command) -> Result<(), String> {
    let output = match command {
        Command::List {
            resource,
            page,
            per_page,
            sort,
            desc,
            filters,
        } => {
            let mut params = ListParams::page(page, per_page);
            if let Some(field) = sort {
                let order = if desc { SortOrder::Desc } else { SortOrder::Asc };
                params = params.sorted_by(field, order);
            }
            for (field, value) in filters {
                params = params.filtered(field, filter_value(&value));
            }
            let listed = api.list(resource, &params).await.map_err(|e| e.to_string())?;
            eprintln!("{} of {} {resource} records", listed.items.len(), listed.total);
            Value::Array(listed.items)
        }
        Command::Get { resource, id } => api.get_one(resource, id).await.map_err(|e| e.to_string())?,
        Command::Delete { resource, id } => {
            api.delete(resource, id).await.map_err(|e| e.to_string())?
        }
        Command::CreateTable { map_id } => {
            api.create_table(map_id).await.map_err(|e| e.to_string())?
        }
        Command::CloneTable { map_id } => {
            api.clone_table(map_id).await.map_err(|e| e.to_string())?
        }
        Command::RefreshMaps => api.refresh_maps().await.map_err(|e| e.to_string())?,
        Command::RestartAll => api.restart_all().await.map_err(|e| e.to_string())?,
        Command::Init { .. } | Command::Watch => return Ok(()),
    };
    if !output.is_null() {
        let text = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
        println!("{text}");
    }
    Ok(())
}

/// Numbers and booleans filter as JSON values; anything else as a string.
fn filter_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}
