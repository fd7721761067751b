use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub query: QueryConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Rows collected per request before the response is marked truncated.
    pub max_results: usize,
    pub debug_logging: bool,
}

/// Ceilings for the sensor authorization engine. Credentials should carry
/// enough entropy for these many comparisons per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub max_global_checks: usize,
    pub max_granular_checks: usize,
    pub max_credentials: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    pub secrets_file: Option<String>,
    pub regions_file: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Query overrides
        if let Ok(v) = env::var("QUERY_MAX_RESULTS") {
            self.query.max_results = v.parse().unwrap_or(self.query.max_results);
        }
        if let Ok(v) = env::var("QUERY_DEBUG_LOGGING") {
            self.query.debug_logging = v.parse().unwrap_or(self.query.debug_logging);
        }

        // Auth overrides
        if let Ok(v) = env::var("AUTH_MAX_GLOBAL_CHECKS") {
            self.auth.max_global_checks = v.parse().unwrap_or(self.auth.max_global_checks);
        }
        if let Ok(v) = env::var("AUTH_MAX_GRANULAR_CHECKS") {
            self.auth.max_granular_checks = v.parse().unwrap_or(self.auth.max_granular_checks);
        }
        if let Ok(v) = env::var("AUTH_MAX_CREDENTIALS") {
            self.auth.max_credentials = v.parse().unwrap_or(self.auth.max_credentials);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // File overrides
        if let Ok(v) = env::var("EPIDATA_SECRETS_FILE") {
            self.files.secrets_file = Some(v);
        }
        if let Ok(v) = env::var("EPIDATA_REGIONS_FILE") {
            self.files.regions_file = Some(v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            query: QueryConfig { max_results: 3650, debug_logging: true },
            auth: AuthConfig::default(),
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            files: FilesConfig {
                secrets_file: Some("secrets.yaml".to_string()),
                regions_file: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            query: QueryConfig { max_results: 3650, debug_logging: false },
            auth: AuthConfig::default(),
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            files: FilesConfig { secrets_file: None, regions_file: None },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            query: QueryConfig { max_results: 3650, debug_logging: false },
            auth: AuthConfig::default(),
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            files: FilesConfig { secrets_file: None, regions_file: None },
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_global_checks: 1,
            max_granular_checks: 30,
            max_credentials: 1,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
