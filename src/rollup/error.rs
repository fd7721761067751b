use thiserror::Error;

use crate::filter::FilterError;

#[derive(Error, Debug)]
pub enum RollupError {
    #[error("region '{0}' is defined more than once")]
    DuplicateRegion(String),

    #[error("region '{0}' has no members")]
    EmptyRegion(String),

    #[error("location '{member}' belongs to both '{first}' and '{second}' in scheme '{scheme}'")]
    OverlappingMember {
        scheme: String,
        member: String,
        first: String,
        second: String,
    },

    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    #[error("failed to read region file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse region file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),
}
