//! Credential checks: one shared secret per gated source, and the tiered
//! sensor authorization engine (open sensors, a global credential, and
//! per-sensor granular credentials under a bounded comparison budget).

pub mod credential;
pub mod error;
pub mod registry;
pub mod secrets;

pub use credential::{Credential, CredentialPresentation};
pub use error::AuthError;
pub use registry::{SensorAuthRegistry, SourceCredentials};
pub use secrets::SecretsFile;
