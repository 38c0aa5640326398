use axum::Router;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::storage::BlobStore;
use crate::task::TaskService;
use crate::task::api::v1::TaskState;
use crate::task::repository::TaskRepository;

pub mod api;

#[derive(Clone)]
pub struct HealthState {
    pub repository: TaskRepository,
}

/// Assembles the full application router over `store`.
pub fn create_app(config: &Config, store: Arc<dyn BlobStore>) -> anyhow::Result<Router> {
    let origin = HeaderValue::from_str(&config.cors_origin)?;

    let repository = TaskRepository::new(store, config.storage_key.clone())
        .with_write_mode(config.write_mode)
        .with_retry_policy(config.retry_policy());
    let task_state = Arc::new(TaskState {
        service: TaskService::new(repository.clone()),
    });
    let health_state = Arc::new(HealthState { repository });

    let app = Router::new()
        .route("/health", get(health_check_handler))
        .with_state(health_state)
        .merge(api::create_api_router(task_state, &origin, config.require_auth))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
    Ok(app)
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let store = config.blob_store();
    let app = create_app(&config, store)?;

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!(
        "Web server running on http://{} ({:?} storage, {:?} writes)",
        server_address,
        config.storage_backend,
        config.write_mode
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Reports whether the blob backend answers.
#[tracing::instrument(skip(state))]
pub async fn health_check_handler(
    State(state): State<Arc<HealthState>>,
) -> (StatusCode, &'static str) {
    match state.repository.exists().await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(err) => {
            tracing::warn!("Health check failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable")
        }
    }
}
