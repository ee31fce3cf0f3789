//! Configuration file loading for the guard binary
//!
//! Wraps the engine configuration with the settings only the platform side
//! needs: the storage location, the geolocation table and HTTP tuning.

use anyhow::Context;
use gateguard_core::GuardConfig;
use serde::{Deserialize, Serialize};

/// Full configuration of the guard process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Engine configuration, passed to `Guard::new`
    pub guard: GuardConfig,

    /// Storage backend settings
    pub storage: StorageSettings,

    /// Static geolocation table
    pub geo: GeoSettings,

    /// HTTP client tuning for proxy-detection services
    pub http: HttpSettings,
}

/// Where the address cache is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database file
    pub path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: "gateguard.db".to_string(),
        }
    }
}

/// One row of the static geolocation table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoEntry {
    /// CIDR block, e.g. `203.0.113.0/24`
    pub cidr: String,

    /// ISO 3166 country code for the block
    pub country: String,

    /// Optional city name for the block
    pub city: Option<String>,
}

/// Static geolocation data; a stand-in for an external geo database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSettings {
    pub entries: Vec<GeoEntry>,
}

/// HTTP client tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

impl ProxySettings {
    /// Load settings from a file, or fall back to defaults when no path is
    /// given. The engine part is validated by `Guard::new` afterwards.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .build()
            .context("could not read the configuration file")?
            .try_deserialize::<ProxySettings>()
            .context("could not parse the configuration file")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_file_yields_defaults() {
        let settings = ProxySettings::load(None).unwrap();
        assert_eq!(settings.storage.path, "gateguard.db");
        assert_eq!(settings.http.timeout_secs, 5);
        assert!(settings.guard.validate().is_ok());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
[storage]
path = "/tmp/guard-test.db"

[guard.misc]
attack_connection_threshold = 12

[[geo.entries]]
cidr = "203.0.113.0/24"
country = "PL"
"#
        )
        .unwrap();

        let settings = ProxySettings::load(file.path().to_str()).unwrap();
        assert_eq!(settings.storage.path, "/tmp/guard-test.db");
        assert_eq!(settings.guard.misc.attack_connection_threshold, 12);
        assert_eq!(settings.geo.entries.len(), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ProxySettings::load(Some("/nonexistent/gateguard")).is_err());
    }
}
