//! Runner configuration: a TOML file plus environment overrides.
//!
//! ```toml
//! [network]
//! server_key = "0123456789abcdef"
//! endpoint = "https://bizflow.example.com/bizflow/rest/api"
//! endpoint_file_upload = "https://bizflow.example.com/bizflow/rest/file"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::api::HttpOptions;
use crate::crypto::{KeyDerivation, PayloadCipher};
use crate::error::{ConfigError, Result};

pub const CONFIG_FILE_NAME: &str = "bizflow.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub network: NetworkSettings,
    pub authentication: AuthenticationSettings,
    pub general: GeneralSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Shared secret the request payloads are encrypted with.
    pub server_key: String,
    pub endpoint: String,
    pub endpoint_file_upload: String,
    /// INSECURE: accept self-signed or otherwise invalid TLS certificates.
    pub accept_invalid_certs: bool,
    /// Request timeout in seconds; 0 disables it.
    pub timeout_secs: u64,
    pub key_derivation: KeyDerivation,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            server_key: String::new(),
            endpoint: String::new(),
            endpoint_file_upload: String::new(),
            accept_invalid_certs: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            key_derivation: KeyDerivation::None,
        }
    }
}

/// Defaults offered at the login prompt.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthenticationSettings {
    pub login_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub show_log_on_console: bool,
}

impl Settings {
    /// Load settings from `path`, or from the first default location that
    /// exists, then apply `BIZFLOW_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => find_config_file()?,
        };
        debug!(path = %path.display(), "loading configuration");

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut settings = Self::from_toml_str(&text)?;
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text).map_err(ConfigError::from)?)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let net = &mut self.network;
        for (key, slot) in [
            ("BIZFLOW_SERVER_KEY", &mut net.server_key),
            ("BIZFLOW_ENDPOINT", &mut net.endpoint),
            ("BIZFLOW_UPLOAD_ENDPOINT", &mut net.endpoint_file_upload),
            ("BIZFLOW_LOGIN_ID", &mut self.authentication.login_id),
            ("BIZFLOW_PASSWORD", &mut self.authentication.password),
        ] {
            if let Some(value) = var(key) {
                *slot = value;
            }
        }
        if let Some(value) = var("BIZFLOW_ACCEPT_INVALID_CERTS") {
            net.accept_invalid_certs = matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.network.server_key.is_empty() {
            return Err(ConfigError::Missing("network.server_key").into());
        }
        if self.network.endpoint.is_empty() {
            return Err(ConfigError::Missing("network.endpoint").into());
        }
        Ok(())
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            accept_invalid_certs: self.network.accept_invalid_certs,
            timeout: (self.network.timeout_secs > 0)
                .then(|| Duration::from_secs(self.network.timeout_secs)),
        }
    }

    pub fn cipher(&self) -> Result<PayloadCipher> {
        Ok(PayloadCipher::from_secret(
            &self.network.server_key,
            self.network.key_derivation,
        )?)
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("bizflow-runner").join("config.toml"));
    }
    paths
}

fn find_config_file() -> Result<PathBuf> {
    let candidates = default_locations();
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| {
            let tried = candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            ConfigError::NotFound(tried).into()
        })
}
