use std::collections::{HashMap, HashSet};

use crate::config::AuthConfig;

use super::credential::{Credential, CredentialPresentation};
use super::error::AuthError;

/// Who may read which sensor. Built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct SensorAuthRegistry {
    granular: HashMap<String, HashSet<Credential>>,
    open: HashSet<String>,
    global: Option<Credential>,
    limits: AuthConfig,
}

impl SensorAuthRegistry {
    pub fn new(limits: AuthConfig) -> Self {
        Self {
            granular: HashMap::new(),
            open: HashSet::new(),
            global: None,
            limits,
        }
    }

    pub fn with_granular(mut self, sensor: impl Into<String>, credential: Credential) -> Self {
        self.granular.entry(sensor.into()).or_default().insert(credential);
        self
    }

    pub fn with_open(mut self, sensor: impl Into<String>) -> Self {
        self.open.insert(sensor.into());
        self
    }

    pub fn with_global(mut self, credential: Credential) -> Self {
        self.global = Some(credential);
        self
    }

    pub fn limits(&self) -> &AuthConfig {
        &self.limits
    }

    pub fn global(&self) -> Option<&Credential> {
        self.global.as_ref()
    }

    /// Largest number of granular credentials accepted for any one sensor.
    pub fn max_granular_per_sensor(&self) -> usize {
        self.granular.values().map(HashSet::len).max().unwrap_or(0)
    }

    /// Decide a sensor request all-or-nothing.
    ///
    /// Shape and cost are checked before any credential comparison. Every
    /// sensor is treated as gated for the cost bound, so the answer does not
    /// depend on which names exist.
    pub fn authorize(&self, presentation: &CredentialPresentation) -> Result<Vec<String>, AuthError> {
        let requested = presentation.names.len();
        let presented = presentation.presented();

        if requested == 0 {
            return Err(AuthError::NoSensorsRequested);
        }
        if presented > self.limits.max_credentials {
            return Err(AuthError::TooManyCredentials);
        }

        // No granular credentials at all means no granular comparisons.
        let granular_checks = requested
            .saturating_mul(self.max_granular_per_sensor())
            .saturating_mul(presented.max(1));
        if presented > self.limits.max_global_checks || granular_checks > self.limits.max_granular_checks {
            tracing::warn!(
                "Rejecting sensor query: {} names, {} credentials, {} granular checks",
                requested,
                presented,
                granular_checks
            );
            return Err(AuthError::QueryTooExpensive);
        }

        let global = self
            .global
            .as_ref()
            .is_some_and(|global| presentation.credentials.contains(global));
        let failed: Vec<String> = presentation
            .names
            .iter()
            .filter(|name| !(global || self.open.contains(name.as_str()) || self.granted(name, presentation)))
            .cloned()
            .collect();

        if !failed.is_empty() {
            tracing::warn!("Unauthorized sensors requested: {}", failed.join(","));
            return Err(AuthError::UnauthorizedSensors(failed));
        }
        Ok(presentation.names.clone())
    }

    fn granted(&self, name: &str, presentation: &CredentialPresentation) -> bool {
        self.granular
            .get(name)
            .is_some_and(|accepted| presentation.credentials.iter().any(|c| accepted.contains(c)))
    }
}

/// Single shared credential per gated source (`fluview`, `cdc`, ...).
#[derive(Debug, Clone, Default)]
pub struct SourceCredentials {
    by_source: HashMap<String, Credential>,
}

impl SourceCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>, credential: Credential) -> Self {
        self.by_source.insert(source.into(), credential);
        self
    }

    /// False when the source has no configured credential.
    pub fn verify(&self, source: &str, presented: Option<&str>) -> bool {
        match (self.by_source.get(source), presented) {
            (Some(expected), Some(secret)) => *expected == Credential::from_secret(secret),
            _ => false,
        }
    }

    pub fn require(&self, source: &str, presented: Option<&str>) -> Result<(), AuthError> {
        if self.verify(source, presented) {
            Ok(())
        } else {
            tracing::warn!("Unauthenticated request for source {}", source);
            Err(AuthError::Unauthenticated)
        }
    }
}
