// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::filter::FilterError;
use crate::issue::IssueError;
use crate::rollup::RollupError;

/// Every way a request can fail, with its HTTP status and client message
#[derive(Debug)]
pub enum EpidataError {
    // 400 Bad Request
    NoSource,
    MissingParameters(Vec<String>),
    Filter(FilterError),
    Issue(IssueError),

    // 410 Gone
    Retired(&'static str),

    // 400 / 401, depending on the kind
    Auth(AuthError),

    // 500 Internal Server Error
    Rollup(RollupError),
    Database(DatabaseError),
}

/// Result code of an envelope that carries an error.
pub const RESULT_ERROR: i32 = -1;

impl EpidataError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            EpidataError::NoSource => 400,
            EpidataError::MissingParameters(_) => 400,
            EpidataError::Filter(_) => 400,
            EpidataError::Issue(_) => 400,
            EpidataError::Retired(_) => 410,
            EpidataError::Auth(err) => match err {
                AuthError::UnauthorizedSensors(_) | AuthError::Unauthenticated => 401,
                AuthError::SecretsFile(_) => 500,
                _ => 400,
            },
            EpidataError::Rollup(_) => 500,
            EpidataError::Database(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            EpidataError::NoSource => "no data source specified".to_string(),
            EpidataError::MissingParameters(names) => format!("missing parameter(s): {}", names.join(", ")),
            EpidataError::Filter(err) => err.to_string(),
            EpidataError::Issue(err) => err.to_string(),
            EpidataError::Retired(message) => message.to_string(),
            EpidataError::Auth(AuthError::SecretsFile(_)) => "server misconfigured".to_string(),
            EpidataError::Auth(err) => err.to_string(),
            EpidataError::Rollup(_) => "server misconfigured".to_string(),
            EpidataError::Database(_) => "database error".to_string(),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            EpidataError::NoSource => "NO_SOURCE",
            EpidataError::MissingParameters(_) => "MISSING_PARAMETERS",
            EpidataError::Filter(FilterError::EmptyFilter) => "EMPTY_FILTER",
            EpidataError::Filter(_) => "INVALID_FILTER",
            EpidataError::Issue(_) => "INVALID_SELECTOR",
            EpidataError::Retired(_) => "RETIRED_SOURCE",
            EpidataError::Auth(err) => match err {
                AuthError::NoSensorsRequested => "NO_SENSORS_REQUESTED",
                AuthError::TooManyCredentials => "TOO_MANY_CREDENTIALS",
                AuthError::QueryTooExpensive => "QUERY_TOO_EXPENSIVE",
                AuthError::UnauthorizedSensors(_) | AuthError::Unauthenticated => "UNAUTHORIZED",
                AuthError::SecretsFile(_) => "INTERNAL_SERVER_ERROR",
            },
            EpidataError::Rollup(_) => "INTERNAL_SERVER_ERROR",
            EpidataError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Convert to the response envelope
    pub fn to_json(&self) -> Value {
        json!({
            "result": RESULT_ERROR,
            "message": self.message(),
            "code": self.error_code()
        })
    }

    pub fn missing(names: &[&str]) -> Self {
        EpidataError::MissingParameters(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<FilterError> for EpidataError {
    fn from(err: FilterError) -> Self {
        EpidataError::Filter(err)
    }
}

impl From<IssueError> for EpidataError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::Filter(inner) => EpidataError::Filter(inner),
            other => EpidataError::Issue(other),
        }
    }
}

impl From<RollupError> for EpidataError {
    fn from(err: RollupError) -> Self {
        match err {
            RollupError::Filter(inner) => EpidataError::Filter(inner),
            other => {
                tracing::error!("Rollup error: {}", other);
                EpidataError::Rollup(other)
            }
        }
    }
}

impl From<AuthError> for EpidataError {
    fn from(err: AuthError) -> Self {
        EpidataError::Auth(err)
    }
}

impl From<DatabaseError> for EpidataError {
    fn from(err: DatabaseError) -> Self {
        // Log the real error but return generic message
        tracing::error!("Database error: {}", err);
        EpidataError::Database(err)
    }
}

// Standard error trait implementations
impl std::fmt::Display for EpidataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for EpidataError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for EpidataError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
