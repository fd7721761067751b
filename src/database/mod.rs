pub mod executor;
pub mod manager;

pub use executor::{ColumnManifest, FieldType, PgExecutor, QueryExecutor, Row};
pub use manager::{DatabaseError, DatabaseManager};
