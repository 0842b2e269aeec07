//! HTTP Gateway
//!
//! One inbound surface: the SMS gateway POSTs every received message to
//! `/sms-webhook`, and everything else the service does flows from there.
//! Health and Swagger round it out; the `mock-api` feature adds a dev-only
//! injection endpoint.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use crossbeam_queue::ArrayQueue;
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa_swagger_ui::SwaggerUi;

use crate::clients::{NameRegistry, SmsSender, WalletProvider};
use crate::config::AppConfig;
use crate::db::Database;
use crate::dispatch::Dispatcher;
use crate::notify::NotifyService;
use crate::store::Store;
use state::AppState;

/// Start HTTP Gateway server
pub async fn run_server(
    port: u16,
    store: Arc<dyn Store>,
    wallet: Arc<dyn WalletProvider>,
    names: Arc<dyn NameRegistry>,
    sms: Arc<dyn SmsSender>,
    db: Option<Arc<Database>>,
    config: Arc<AppConfig>,
) {
    // Dispatcher owns the workflow rules
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        wallet.clone(),
        names.clone(),
        config.workflow.clone(),
    ));

    // Start notification fan-out service
    let notify_queue = Arc::new(ArrayQueue::new(config.workflow.notify_queue_size));
    let notify_service = NotifyService::new(sms.clone(), notify_queue.clone());
    tokio::spawn(async move {
        notify_service.run().await;
    });
    println!("📨 Notification fan-out service started");

    // Create shared state
    let state = Arc::new(AppState::new(
        store,
        wallet,
        names,
        sms,
        dispatcher,
        notify_queue,
        db,
        config,
    ));

    // Build complete router
    let app = Router::new()
        .route("/sms-webhook", post(handlers::sms_webhook))
        .route("/api/v1/health", get(handlers::health_check));

    // [SECURITY] Mock API route - only compiled when 'mock-api' feature is enabled.
    // Production builds MUST be compiled with `--no-default-features` to exclude this.
    #[cfg(feature = "mock-api")]
    let app = app.route("/api/v1/mock/sms", post(handlers::mock_sms));

    let app = app
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::api_spec()));

    // Bind address
    let addr = format!("0.0.0.0:{}", port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("❌ FATAL: Failed to bind to {}: {}", addr, e);
            eprintln!(
                "   Hint: Port {} may already be in use. Check with: lsof -i :{}",
                port, port
            );
            std::process::exit(1);
        }
    };

    println!("🚀 Gateway listening on http://{}", addr);
    println!("📖 API Docs: http://{}/docs", addr);
    println!("📱 SMS webhook: POST http://{}/sms-webhook", addr);

    // Start server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("❌ FATAL: Server error: {}", e);
        std::process::exit(1);
    }
}
