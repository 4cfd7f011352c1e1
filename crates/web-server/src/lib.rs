use analytics::{AnalyticsSettings, BenchmarkEngine, MetricsBuilder};
use axum::{
    routing::{get, post},
    Router,
};
use configuration::Config;
use sources::{SnapshotStore, Sources};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};
use xirr::XirrSolver;

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub metrics: MetricsBuilder,
    pub benchmark: BenchmarkEngine,
}

impl AppState {
    pub fn new(sources: Sources, settings: AnalyticsSettings) -> Self {
        Self {
            metrics: MetricsBuilder::new(sources.clone(), settings.clone()),
            benchmark: BenchmarkEngine::new(sources, settings),
        }
    }
}

/// Maps the loaded configuration onto the engine settings.
pub fn analytics_settings(config: &Config) -> AnalyticsSettings {
    AnalyticsSettings::new(&config.engine.base_currency, &config.engine.default_book)
        .with_padding_days(config.engine.price_padding_days)
        .with_solver(XirrSolver::new(
            config.solver.tolerance,
            config.solver.max_iterations,
        ))
}

/// Loads the configured data snapshot and wires up both engines.
pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = SnapshotStore::from_path(&config.data.snapshot_path, &config.engine.default_book)?;
    let sources = Sources::from_backend(Arc::new(store));
    Ok(Arc::new(AppState::new(sources, analytics_settings(config))))
}

/// Builds the application routes.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/v1/metrics", get(handlers::get_metrics))
        .route("/api/v1/metrics/benchmark", post(handlers::post_benchmark))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
