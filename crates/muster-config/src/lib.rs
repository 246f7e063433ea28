//! Configuration for the muster collector.
//!
//! TOML file + `MUSTER_` environment overrides, merged through figment.
//! Controller descriptors resolve to `muster_api::ControllerEndpoint`;
//! IP-selection overrides deserialize straight into
//! `muster_core::IpSelectionRules`.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

use muster_api::ControllerEndpoint;
use muster_core::IpSelectionRules;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Overrides for the machine-IP selection heuristic.
    #[serde(default)]
    pub ip_selection: IpSelectionRules,

    /// Controllers to collect, in run order.
    #[serde(default)]
    pub controllers: Vec<ControllerEntry>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    "muster.db".into()
}

/// One configured controller.
#[derive(Debug, Deserialize)]
pub struct ControllerEntry {
    /// Controller label, used in logs and error context.
    pub controller: String,

    pub username: String,

    /// Password for the controller account (plaintext in the file —
    /// prefer the `MUSTER_CONTROLLERS_*` env overrides in shared setups).
    pub password: SecretString,

    /// CA certificate in PEM form; empty or absent for self-signed
    /// controllers.
    #[serde(default)]
    pub cacert: Option<String>,

    /// Store owner this controller's runs belong to.
    pub owner_id: i64,

    /// Controller UUID as known to configuration.
    #[serde(default)]
    pub uuid: String,

    /// API endpoint (e.g. `https://10.0.0.2:17070`).
    pub endpoint: String,
}

impl ControllerEntry {
    /// Resolve this entry to a connection descriptor.
    pub fn to_endpoint(&self) -> Result<ControllerEndpoint, ConfigError> {
        let endpoint: url::Url =
            self.endpoint
                .parse()
                .map_err(|_| ConfigError::Validation {
                    field: "endpoint".into(),
                    reason: format!("invalid URL: {}", self.endpoint),
                })?;

        let cacert = self
            .cacert
            .as_deref()
            .filter(|pem| !pem.trim().is_empty())
            .map(str::to_owned);

        Ok(ControllerEndpoint {
            name: self.controller.clone(),
            endpoint,
            username: self.username.clone(),
            password: self.password.clone(),
            cacert,
            uuid: self.uuid.clone(),
        })
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load configuration from a TOML file plus `MUSTER_` env overrides.
///
/// Env keys use double underscores as separators, e.g.
/// `MUSTER_DATABASE__PATH=/var/lib/muster/muster.db`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let figment = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("MUSTER_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Tests ───────────────────────────────────────────────────────────
