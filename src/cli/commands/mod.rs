pub mod authorize;
pub mod plan;
pub mod query;
