use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::{require_basic_auth, Authenticator, StaticCredential};
use crate::handlers::available::{index_status, registry_status};
use crate::handlers::documents::store;
use crate::handlers::indices::new_index;
use crate::handlers::search::search;
use crate::handlers::{dispatch, favicon, AppState};
use multiindex::{IndexRegistry, MultiindexError};

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8888";
pub const DEFAULT_MAX_BODY_MB: usize = 10;

/// Server settings, read from `MULTIINDEX_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind_addr: String,
    /// `user:password` for HTTP Basic auth.
    pub credentials: String,
    pub max_body_mb: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let credentials = non_empty("MULTIINDEX_CREDENTIALS")
            .ok_or("MULTIINDEX_CREDENTIALS is required (user:password)")?;
        if StaticCredential::from_pair(&credentials).is_none() {
            return Err("MULTIINDEX_CREDENTIALS must have the form user:password".to_string());
        }

        let max_body_mb = match non_empty("MULTIINDEX_MAX_BODY_MB") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|mb| *mb > 0)
                .ok_or_else(|| format!("MULTIINDEX_MAX_BODY_MB must be a positive integer, got {:?}", raw))?,
            None => DEFAULT_MAX_BODY_MB,
        };

        Ok(ServerConfig {
            data_dir: PathBuf::from(
                non_empty("MULTIINDEX_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            bind_addr: non_empty("MULTIINDEX_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            credentials,
            max_body_mb,
        })
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb * 1024 * 1024
    }
}

/// Build the full application: every request goes through tracing, panic
/// recovery, the body limit and authentication before reaching a handler.
/// Paths or methods outside the table land in [`dispatch`].
pub fn build_router(
    state: Arc<AppState>,
    authenticator: Arc<dyn Authenticator>,
    max_body_bytes: usize,
) -> Router {
    Router::new()
        .route("/available", get(registry_status).fallback(dispatch))
        .route("/available/", get(registry_status).fallback(dispatch))
        .route("/available/index", get(index_status).fallback(dispatch))
        .route("/available/index/", get(index_status).fallback(dispatch))
        .route("/search", get(search).fallback(dispatch))
        .route("/search/", get(search).fallback(dispatch))
        .route("/favicon.ico", get(favicon).fallback(dispatch))
        .route("/store", post(store).fallback(dispatch))
        .route("/store/", post(store).fallback(dispatch))
        .route("/newindex", post(new_index).fallback(dispatch))
        .route("/newindex/", post(new_index).fallback(dispatch))
        .fallback(dispatch)
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            authenticator,
            require_basic_auth,
        ))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    MultiindexError::Internal(format!("handler panicked: {}", detail)).into_response()
}

pub async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let startup_start = std::time::Instant::now();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let credential = StaticCredential::from_pair(&config.credentials)
        .ok_or("MULTIINDEX_CREDENTIALS must have the form user:password")?;

    let registry = IndexRegistry::open(&config.data_dir)?;
    let tenants = registry.tenant_names();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        tenants = tenants.len(),
        "storage ready"
    );

    let state = Arc::new(AppState::new(registry));
    let app = build_router(state, Arc::new(credential), config.max_body_bytes());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    print_startup_banner(
        &local_addr.to_string(),
        &config,
        startup_start.elapsed().as_millis(),
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

fn print_startup_banner(bind_addr: &str, config: &ServerConfig, startup_ms: u128) {
    use colored::Colorize;

    let url = format!("http://{}", bind_addr);
    let version = format!("v{}", env!("CARGO_PKG_VERSION"));
    let timing = format!("ready in {}ms", startup_ms);
    let data_dir = config.data_dir.display().to_string();

    println!();
    println!(
        "  {} {}  {}",
        "Multiindex".bold().bright_green(),
        version.as_str().dimmed(),
        timing.as_str().dimmed()
    );
    println!();
    println!("  {}  Local:  {}", "➜".green(), url.as_str().cyan());
    println!("  {}  Data:   {}", "➜".green(), data_dir.as_str().cyan());
    println!(
        "  {}  Auth:   {} (HTTP Basic)",
        "➜".green(),
        "Enabled".green().bold()
    );
    println!();
}
