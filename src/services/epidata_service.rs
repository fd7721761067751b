use std::sync::Arc;
use std::time::Instant;

use crate::database::{QueryExecutor, Row};
use crate::error::EpidataError;
use crate::sources::{Params, Planner, QueryPlan, Source};

/// Rows of one request and whether the result limit cut them short.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
    pub truncated: bool,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Plans a request and runs its statements against storage.
pub struct EpidataService {
    planner: Planner,
    executor: Arc<dyn QueryExecutor>,
    max_results: usize,
}

impl EpidataService {
    pub fn new(planner: Planner, executor: Arc<dyn QueryExecutor>, max_results: usize) -> Self {
        Self { planner, executor, max_results }
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub async fn query(&self, source: Source, params: &Params) -> Result<ResultSet, EpidataError> {
        let plan = self.planner.plan(source, params)?;
        self.execute(&plan).await
    }

    /// Run statements in order until `max_results` rows are collected.
    pub async fn execute(&self, plan: &QueryPlan) -> Result<ResultSet, EpidataError> {
        let started = Instant::now();
        let mut rows: Vec<Row> = Vec::new();

        for statement in &plan.statements {
            let remaining = self.max_results.saturating_sub(rows.len());
            if remaining == 0 {
                break;
            }
            let sql = statement.clone().limit(i64::try_from(remaining).unwrap_or(i64::MAX)).to_sql();
            rows.extend(self.executor.fetch(&sql, &plan.manifest, remaining).await?);
        }

        let truncated = rows.len() >= self.max_results;
        if truncated {
            tracing::warn!("{}: result truncated at {} rows", plan.source, self.max_results);
        }
        plan.post.apply(&mut rows);

        tracing::info!(
            "{}: {} rows from {} statements in {:?}",
            plan.source,
            rows.len(),
            plan.statements.len(),
            started.elapsed()
        );
        Ok(ResultSet { rows, truncated })
    }

    pub async fn health_check(&self) -> Result<(), EpidataError> {
        Ok(self.executor.health_check().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, SensorAuthRegistry, SourceCredentials};
    use crate::config::AuthConfig;
    use crate::rollup::RegionMap;
    use crate::testing::{row, MemoryExecutor};
    use serde_json::json;

    fn planner() -> Planner {
        let credentials = SourceCredentials::new().with_source("cdc", Credential::from_secret("cdc-secret"));
        Planner::new(
            Arc::new(RegionMap::defaults()),
            Arc::new(SensorAuthRegistry::new(AuthConfig::default())),
            Arc::new(credentials),
        )
    }

    fn gft_rows(count: i64) -> Vec<Row> {
        (0..count)
            .map(|i| row([("epiweek", json!(201501 + i)), ("location", json!("nat")), ("num", json!(i))]))
            .collect()
    }

    fn gft_params() -> Params {
        Params::from_pairs([("epiweeks", "201501-201552"), ("locations", "nat")])
    }

    #[tokio::test]
    async fn returns_rows_under_the_limit() {
        let executor = Arc::new(MemoryExecutor::new().with_rows("gft", gft_rows(3)));
        let service = EpidataService::new(planner(), executor.clone(), 10);

        let result = service.query(Source::Gft, &gft_params()).await.unwrap();
        assert_eq!(result.len(), 3);
        assert!(!result.truncated);
        assert!(executor.statements()[0].query.ends_with("LIMIT 10"));
    }

    #[tokio::test]
    async fn truncates_at_max_results() {
        let executor = Arc::new(MemoryExecutor::new().with_rows("gft", gft_rows(5)));
        let service = EpidataService::new(planner(), executor, 5);

        let result = service.query(Source::Gft, &gft_params()).await.unwrap();
        assert_eq!(result.len(), 5);
        assert!(result.truncated);
    }

    #[tokio::test]
    async fn later_statements_get_the_remaining_budget() {
        let rows = vec![row([("location", json!("nat")), ("epiweek", json!(201501)), ("total", json!(7))])];
        let executor = Arc::new(MemoryExecutor::new().with_rows("cdc_extract", rows));
        let service = EpidataService::new(planner(), executor.clone(), 2);
        let params = Params::from_pairs([("epiweeks", "201501"), ("locations", "nat,hhs1,pa"), ("auth", "cdc-secret")]);

        let result = service.query(Source::Cdc, &params).await.unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.truncated);
        let statements = executor.statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[1].query.ends_with("LIMIT 1"));
    }

    #[tokio::test]
    async fn no_rows_is_not_an_error() {
        let service = EpidataService::new(planner(), Arc::new(MemoryExecutor::new()), 10);
        let result = service.query(Source::Gft, &gft_params()).await.unwrap();
        assert!(result.is_empty());
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let service = EpidataService::new(planner(), Arc::new(MemoryExecutor::failing()), 10);
        let err = service.query(Source::Gft, &gft_params()).await.unwrap_err();
        assert!(matches!(err, EpidataError::Database(_)));
        assert!(service.health_check().await.is_err());
    }

    #[tokio::test]
    async fn planning_errors_skip_storage() {
        let executor = Arc::new(MemoryExecutor::new());
        let service = EpidataService::new(planner(), executor.clone(), 10);
        let params = Params::from_pairs([("epiweeks", "201501"), ("locations", "nat"), ("auth", "wrong")]);
        assert!(service.query(Source::Cdc, &params).await.is_err());
        assert!(executor.statements().is_empty());
    }
}
