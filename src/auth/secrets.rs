use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

use super::credential::Credential;
use super::error::AuthError;
use super::registry::{SensorAuthRegistry, SourceCredentials};

/// Source-credential name under which the global sensor secret is registered.
pub const SENSORS_SOURCE: &str = "sensors";

/// Secrets file layout:
///
/// ```yaml
/// sources:
///   fluview: "..."
///   cdc: "..."
///   norostat: "..."
/// sensors:
///   global: "..."
///   granular:
///     twtr: ["..."]
///   open: [sar3, epic, arch]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsFile {
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
    #[serde(default)]
    pub sensors: SensorSecrets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSecrets {
    pub global: Option<String>,
    #[serde(default)]
    pub granular: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_open_sensors")]
    pub open: Vec<String>,
}

impl Default for SensorSecrets {
    fn default() -> Self {
        Self {
            global: None,
            granular: BTreeMap::new(),
            open: default_open_sensors(),
        }
    }
}

fn default_open_sensors() -> Vec<String> {
    ["sar3", "epic", "arch"].iter().map(|s| s.to_string()).collect()
}

impl SecretsFile {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, AuthError> {
        serde_yaml::from_str(yaml).map_err(|e| AuthError::SecretsFile(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AuthError::SecretsFile(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    /// Digest every secret and drop the raw values.
    pub fn into_registries(self, limits: AuthConfig) -> (SensorAuthRegistry, SourceCredentials) {
        let mut sensors = SensorAuthRegistry::new(limits);
        for (sensor, secrets) in &self.sensors.granular {
            for secret in secrets {
                sensors = sensors.with_granular(sensor.as_str(), Credential::from_secret(secret));
            }
        }
        for sensor in self.sensors.open {
            sensors = sensors.with_open(sensor);
        }
        if let Some(global) = &self.sensors.global {
            sensors = sensors.with_global(Credential::from_secret(global));
        }

        let mut sources = self
            .sources
            .iter()
            .fold(SourceCredentials::new(), |acc, (source, secret)| {
                acc.with_source(source.as_str(), Credential::from_secret(secret))
            });
        // The global sensor secret doubles as the dengue_sensors credential.
        if let Some(global) = &self.sensors.global {
            if !self.sources.contains_key(SENSORS_SOURCE) {
                sources = sources.with_source(SENSORS_SOURCE, Credential::from_secret(global));
            }
        }

        tracing::info!(
            "Loaded credentials for {} sources and {} granular sensors",
            self.sources.len(),
            self.sensors.granular.len()
        );
        (sensors, sources)
    }
}
