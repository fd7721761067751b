use thiserror::Error;

/// Authorization failures. Messages never say which comparison failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no sensor names provided")]
    NoSensorsRequested,

    #[error(
        "currently, only a single auth token is allowed to be presented at a time; \
         please issue a separate query for each sensor name using only the corresponding token"
    )]
    TooManyCredentials,

    #[error(
        "too many sensors requested and/or auth tokens presented; please divide sensors into batches \
         and/or use only the tokens needed for the sensors requested"
    )]
    QueryTooExpensive,

    #[error("unauthenticated/nonexistent sensor(s): {}", .0.join(","))]
    UnauthorizedSensors(Vec<String>),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("failed to load secrets: {0}")]
    SecretsFile(String),
}
