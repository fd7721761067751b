pub mod epidata_service;

pub use epidata_service::{EpidataService, ResultSet};
