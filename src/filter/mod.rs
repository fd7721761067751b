pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod parse;
pub mod error;

pub use types::*;
pub use filter::{Filter, SelectExpr, SelectField, TableSource};
pub use filter_where::{compile, FilterWhere, Predicate};
pub use parse::extract_values;
pub use error::FilterError;
