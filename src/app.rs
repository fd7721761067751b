//! Router and shared state for the HTTP service.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::SecretsFile;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgExecutor, QueryExecutor};
use crate::handlers;
use crate::rollup::RegionMap;
use crate::services::EpidataService;
use crate::sources::Planner;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EpidataService>,
}

impl AppState {
    pub fn new(service: EpidataService) -> Self {
        Self { service: Arc::new(service) }
    }

    /// Load the region map and secrets named by `config` and connect to the
    /// configured database.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let planner = planner_from_config(config)?;
        let pool = DatabaseManager::pool().await?;
        let executor: Arc<dyn QueryExecutor> = Arc::new(PgExecutor::new(pool));
        Ok(Self::new(EpidataService::new(planner, executor, config.query.max_results)))
    }
}

/// Build the planner from the configured region map and secrets files.
pub fn planner_from_config(config: &AppConfig) -> anyhow::Result<Planner> {
    let regions = match &config.files.regions_file {
        Some(path) => RegionMap::from_file(path)?,
        None => RegionMap::defaults(),
    };
    let secrets = match &config.files.secrets_file {
        Some(path) => SecretsFile::from_file(path)?,
        None => {
            tracing::warn!("No secrets file configured; gated sources will reject every request");
            SecretsFile::default()
        }
    };
    let (sensors, credentials) = secrets.into_registries(config.auth.clone());
    Ok(Planner::new(Arc::new(regions), Arc::new(sensors), Arc::new(credentials)))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/epidata", get(handlers::epidata_get).post(handlers::epidata_post))
        .with_state(state)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
