//! CellFi - SMS Stablecoin Wallet Service
//!
//! This is the main entry point. Architecture:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌────────────┐    ┌──────────┐
//! │   SMS    │───▶│ Webhook  │───▶│ Dispatcher │───▶│  Wallet  │
//! │ Gateway  │    │  (axum)  │    │ (workflow) │    │ Provider │
//! └──────────┘    └──────────┘    └─────┬──────┘    └──────────┘
//!       ▲                               │
//!       │         ┌──────────┐    ┌─────▼──────┐
//!       └─────────│  Notify  │◀───│ PostgreSQL │
//!                 │ (fan-out)│    │  (state)   │
//!                 └──────────┘    └────────────┘
//! ```
//!
//! Dispatcher responsibilities:
//! - One reply per inbound message, notifications for everyone else
//! - Single-use codes consumed by compare-and-set
//! - Transfers move through the custodial wallet provider

use std::sync::Arc;

use cellfi::clients::{HttpNameRegistry, HttpSmsSender, HttpWalletProvider};
use cellfi::config::AppConfig;
use cellfi::db::Database;
use cellfi::logging::init_logging;
use cellfi::store::PgStore;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() {
    let env = get_env();
    let app_config = AppConfig::load(&env);
    let _log_guard = init_logging(&app_config);

    tracing::info!("Starting CellFi in {} mode", env);
    println!("=== CellFi: SMS Stablecoin Wallet ({}) ===", env!("GIT_HASH"));

    let port = get_port_override().unwrap_or(app_config.server.port);

    // Connect PostgreSQL and bootstrap schema
    let db = match Database::connect(&app_config.database).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            eprintln!("❌ FATAL: Failed to connect to PostgreSQL: {}", e);
            eprintln!("   Hint: check database.url in config/{}.yaml", env);
            std::process::exit(1);
        }
    };
    let store = Arc::new(PgStore::new(db.pool().clone()));
    if let Err(e) = store.init_schema().await {
        eprintln!("❌ FATAL: Failed to initialize schema: {}", e);
        std::process::exit(1);
    }
    println!("✅ PostgreSQL connected and schema initialized");

    // Collaborator HTTP clients
    let wallet = match HttpWalletProvider::new(app_config.wallet.clone()) {
        Ok(w) => Arc::new(w),
        Err(e) => {
            eprintln!("❌ FATAL: Failed to create wallet client: {}", e);
            std::process::exit(1);
        }
    };
    let names = match HttpNameRegistry::new(app_config.names.clone()) {
        Ok(n) => Arc::new(n),
        Err(e) => {
            eprintln!("❌ FATAL: Failed to create name registry client: {}", e);
            std::process::exit(1);
        }
    };
    let sms = match HttpSmsSender::new(app_config.sms.clone()) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("❌ FATAL: Failed to create SMS client: {}", e);
            std::process::exit(1);
        }
    };

    cellfi::gateway::run_server(
        port,
        store,
        wallet,
        names,
        sms,
        Some(db),
        Arc::new(app_config),
    )
    .await;
}
