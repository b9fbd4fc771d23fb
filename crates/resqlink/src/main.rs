//! `resqlink` - run and inspect the relief coordination service.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use resqlink::cli::{Cli, Command, ConfigCommand, ServeCommand};
use resqlink::{init_logging, router, AppState, Config, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    match cli.command {
        Command::Serve(cmd) => serve(cli.config, cmd).await,
        Command::Status(cmd) => handle_status(&Config::load_from(cli.config)?, cmd.json),
        Command::Config(cmd) => handle_config(cli.config, cmd),
    }
}

async fn serve(config_path: Option<PathBuf>, cmd: ServeCommand) -> Result<()> {
    let mut config = Config::load_from(config_path)?;
    if let Some(bind) = cmd.bind {
        config.server.bind_address = bind;
        config.validate()?;
    }
    if config.uses_development_secret() {
        warn!("Signing tokens with the development secret; set RESQLINK_AUTH__JWT_SECRET");
    }

    let database = config.database_path();
    let storage = Storage::open(&database)?;
    info!(path = %database.display(), "Opened database");

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;
    info!(address = %listener.local_addr()?, "ResQLink API listening");

    axum::serve(listener, router(AppState::new(storage, config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let database = config.database_path();
    let stats = Storage::open(&database)?.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": database,
            "documents": stats.documents,
            "total_documents": stats.total_documents,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("resqlink status");
        println!("---------------");
        println!("Database:      {}", database.display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Documents:     {}", stats.total_documents);
        for (collection, count) in &stats.documents {
            println!("  {collection:<20} {count}");
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind_address);
                println!("  Max body bytes:     {}", config.server.max_body_bytes);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Auth]");
                println!(
                    "  JWT secret:         {}",
                    if config.uses_development_secret() {
                        "development default"
                    } else {
                        "custom"
                    }
                );
                println!("  Token TTL (hours):  {}", config.auth.token_ttl_hours);
                println!();
                println!("[Inventory]");
                println!(
                    "  Default threshold:  {}",
                    config.inventory.default_minimum_threshold
                );
                println!(
                    "  Expiring soon days: {}",
                    config.inventory.expiring_soon_days
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
