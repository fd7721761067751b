#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use epidata_api_rust::auth::SecretsFile;
use epidata_api_rust::config::AuthConfig;
use epidata_api_rust::rollup::RegionMap;
use epidata_api_rust::services::EpidataService;
use epidata_api_rust::sources::Planner;
use epidata_api_rust::testing::MemoryExecutor;
use epidata_api_rust::{app, AppState};
use tokio::sync::oneshot;

pub const SECRETS: &str = r#"
sources:
  fluview: fluview-secret
  cdc: cdc-secret
  twitter: twitter-secret
  norostat: norostat-secret
sensors:
  global: global-secret
  granular:
    twtr: [twtr-token]
    gft: [gft-token]
"#;

/// In-process server backed by canned rows instead of a database.
pub struct TestServer {
    pub base_url: String,
    pub executor: Arc<MemoryExecutor>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start(executor: MemoryExecutor) -> Result<Self> {
        Self::start_with_limit(executor, 3650).await
    }

    pub async fn start_with_limit(executor: MemoryExecutor, max_results: usize) -> Result<Self> {
        let secrets = SecretsFile::from_yaml_str(SECRETS)?;
        let (sensors, credentials) = secrets.into_registries(AuthConfig::default());
        let planner = Planner::new(Arc::new(RegionMap::defaults()), Arc::new(sensors), Arc::new(credentials));

        let executor = Arc::new(executor);
        let service = EpidataService::new(planner, executor.clone(), max_results);
        let router = app(AppState::new(service));

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await;
        });

        Ok(Self { base_url: format!("http://127.0.0.1:{}", port), executor, shutdown: Some(tx) })
    }

    pub async fn epidata(&self, params: &[(&str, &str)]) -> Result<(reqwest::StatusCode, serde_json::Value)> {
        let res = reqwest::Client::new()
            .get(format!("{}/api/epidata", self.base_url))
            .query(params)
            .send()
            .await?;
        let status = res.status();
        Ok((status, res.json().await?))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
