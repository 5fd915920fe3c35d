use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use mensa::api::mock::sample_menu;
use mensa::api::ApiClient;
use mensa::app::{App, AppEvent};
use mensa::config::Config;
use mensa::menu::{categories_from_payload, categories_from_records};
use mensa::preferences::PreferenceManager;
use mensa::storage::{Database, DatabaseError};
use mensa::ui;

/// Get the config directory path (~/.config/mensa/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("mensa");
    Ok(config_dir)
}

/// Send tracing output to a log file in the config directory.
///
/// The TUI owns stdout, so logs cannot go to the terminal. If the log file
/// cannot be opened, no subscriber is installed and logging is silent.
fn init_tracing(config_dir: &Path) {
    let log_path = config_dir.join("mensa.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(e) => {
            eprintln!(
                "Warning: could not open log file {}: {}",
                log_path.display(),
                e
            );
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mensa", about = "Terminal companion for the cafeteria service")]
struct Args {
    /// Reset the local database (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Skip the network and browse the cached menu only
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    init_tracing(&config_dir);

    // Restrict the directory to the owner; it holds the meal history.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = config_dir.join("config.toml");
    let db_path = config_dir.join("cafeteria.db");

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Handle --reset-db flag
    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    // Open database
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of mensa appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    // Merge config defaults with stored preferences
    let pm = match PreferenceManager::load(&config, &db).await {
        Ok(pm) => pm,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load stored preferences, using config defaults");
            PreferenceManager::from_config(&config)
        }
    };

    // Build the HTTP client unless we are offline
    let offline = args.offline || pm.offline();
    let client = if offline {
        tracing::info!("Running offline, network disabled");
        None
    } else {
        match ApiClient::new(
            &config.server_url,
            Duration::from_secs(pm.request_timeout_secs()),
        ) {
            Ok(client) => Some(client),
            Err(e) => {
                eprintln!("Error: invalid server URL '{}': {}", config.server_url, e);
                eprintln!("Fix server_url in {} and try again.", config_path.display());
                std::process::exit(1);
            }
        }
    };

    // Create app state
    let mut app = App::new(db.clone(), client, pm.nutrition_profile(), pm.theme_variant());

    // Show the cached menu immediately; the fresh one arrives in the background
    let cached = db.all_foods().await.context("Failed to read cached menu")?;
    if !cached.is_empty() {
        tracing::info!(items = cached.len(), "Loaded cached menu");
        app.set_menu(categories_from_records(&cached));
    } else if offline {
        // Nothing cached to browse offline; fall back to the built-in sample menu
        tracing::info!("Offline with an empty cache, loading the sample menu");
        app.set_menu(categories_from_payload(&sample_menu(), &config.server_url));
    }

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    // Run the TUI
    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
