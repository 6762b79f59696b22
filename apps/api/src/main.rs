use std::sync::Arc;
use std::time::Duration;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use conversation_cell::{DialogueController, DialogueSettings, SessionStore, TypingPacer};
use hospital_gateway_cell::HttpHospitalGateway;
use intent_cell::IntentClassifier;
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting booking assistant API server");

    // Load configuration
    let config = AppConfig::from_env();

    // Wire the dialogue engine
    let controller = DialogueController::new(
        Arc::new(HttpHospitalGateway::new(&config)),
        Arc::new(IntentClassifier::new(&config)),
        DialogueSettings::from_config(&config),
    );
    let store = Arc::new(SessionStore::new(Arc::new(controller), TypingPacer::from_config(&config)));
    if config.session_idle_ttl_secs > 0 {
        store.spawn_idle_sweeper(Duration::from_secs(config.session_idle_ttl_secs));
        info!("Idle chat sessions expire after {}s", config.session_idle_ttl_secs);
    }

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(store)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
