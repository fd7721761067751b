pub mod epidata;
pub mod response;
pub mod root;

pub use epidata::{epidata_get, epidata_post};
pub use response::EpidataResponse;
pub use root::{health, root};
