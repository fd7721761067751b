use thiserror::Error;

use crate::filter::FilterError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("invalid issue selector: {0}")]
    InvalidSelector(String),

    #[error(transparent)]
    Filter(#[from] FilterError),
}
