mod html;
mod routes;
mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use device_map::config::DEFAULT_API_ROOT;
use device_map::Config;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config {
        api_root: std::env::var("API_ROOT").unwrap_or_else(|_| DEFAULT_API_ROOT.to_string()),
        ..Config::default()
    };

    let store = match std::env::var("DEVICES_FILE") {
        Ok(path) => store::DeviceStore::load(Path::new(&path)).await?,
        Err(_) => store::DeviceStore::default(),
    };
    tracing::info!("Loaded {} devices", store.len());

    // Only a path-style API root can be served from here.
    let api_path = config
        .api_root
        .starts_with('/')
        .then(|| config.api_root.clone());
    if api_path.is_none() {
        tracing::info!("Device API served externally at {}", config.api_root);
    }

    let viewer_dir = std::env::var("VIEWER_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("crates/device-map-viewer/dist"));

    let state = AppState {
        store: Arc::new(store),
        config: Arc::new(config),
        viewer_dir,
    };

    let app = Router::new()
        .merge(routes::router(api_path.as_deref()))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {bind_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<store::DeviceStore>,
    pub config: Arc<Config>,
    pub viewer_dir: PathBuf,
}
