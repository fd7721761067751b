use thiserror::Error;

use super::types::FilterKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter list must not be empty")]
    EmptyFilter,

    #[error("expected {expected} values, found {found}")]
    KindMismatch { expected: FilterKind, found: FilterKind },

    #[error("invalid {kind} value: {value}")]
    InvalidValue { kind: FilterKind, value: String },

    #[error("ranges are not supported for {0} values")]
    RangeNotSupported(FilterKind),
}
