use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod analysis;
mod config;
mod dispatch;
mod error;
mod fal_client;
mod fetcher;
mod gemini_client;
mod generation;
mod handlers;
mod middleware;
mod types;

/// Shared state: configured provider clients plus the source fetcher.
/// Clients are Options so the server still starts with partial
/// configuration; the affected endpoint reports the gap per request.
pub struct AppState {
    pub config: config::Config,
    pub fetcher: fetcher::SourceFetcher,
    pub gemini_client: Option<gemini_client::GeminiClient>,
    pub fal_client: Option<fal_client::FalClient>,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let config = config::Config::from_env();

    let gemini_client = match config.gemini_api_key.clone() {
        Some(api_key) => {
            tracing::info!(
                "Initializing Gemini client (default model: {})...",
                config.default_model
            );
            Some(gemini_client::GeminiClient::new(api_key))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not found. Video analysis will be disabled.");
            None
        }
    };

    let fal_client = match config.fal_api_key.clone() {
        Some(api_key) => {
            tracing::info!("Initializing fal.ai client (Veo reference-to-video)...");
            Some(fal_client::FalClient::new(api_key))
        }
        None => {
            tracing::warn!("FAL_KEY not found. Video generation will be disabled.");
            None
        }
    };

    let fetcher = fetcher::SourceFetcher::new(config.ytdlp_bin.clone());
    let port = config.port;

    let shared_state = Arc::new(AppState {
        config,
        fetcher,
        gemini_client,
        fal_client,
    });

    let app = Router::new()
        .merge(handlers::analyze::analyze_routes())
        .merge(handlers::generate::generate_routes())
        .route("/api/status", axum::routing::get(api_status))
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state.clone()));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,video_analyzer=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,video_analyzer=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("🎬 Video Analyzer starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        }
    );

    let gemini_configured = std::env::var("GEMINI_API_KEY").is_ok();
    let fal_configured = std::env::var("FAL_KEY").is_ok();
    tracing::info!(
        "Configuration - Gemini: {}, fal.ai: {}",
        if gemini_configured { "✅" } else { "❌" },
        if fal_configured { "✅" } else { "❌" }
    );

    Ok(())
}

// API Status endpoint
async fn api_status(
    Extension(state): Extension<Arc<AppState>>,
) -> axum::response::Json<serde_json::Value> {
    use serde_json::json;

    let gemini_status = if state.gemini_client.is_some() {
        "configured"
    } else {
        "not_configured"
    };
    let fal_status = if state.fal_client.is_some() {
        "configured"
    } else {
        "not_configured"
    };

    axum::response::Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "gemini_analysis": gemini_status,
            "fal_generation": fal_status
        },
        "default_model": state.config.default_model,
        "endpoints": {
            "analyze": "/analyze",
            "generate": "/generate",
            "status": "/api/status"
        }
    }))
}
