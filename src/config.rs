use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;

use crate::constants::{DEFAULT_MUX_API_BASE, DEFAULT_PORT, DEFAULT_SIGNATURE_TOLERANCE_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenancyMode {
    /// One status document at a fixed, well-known path
    Single,
    /// One status document per app/user pair
    Multi,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_tenancy() -> TenancyMode {
    TenancyMode::Single
}

fn default_mux_api_base_url() -> String {
    DEFAULT_MUX_API_BASE.to_string()
}

fn default_signature_tolerance_secs() -> u64 {
    DEFAULT_SIGNATURE_TOLERANCE_SECS
}

/// Relay configuration file structure (TOML)
///
/// Secrets never live here; see `credentials.rs`.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// HTTP listen port (default: 3000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Status document addressing scheme (default: single)
    #[serde(default = "default_tenancy")]
    pub tenancy: TenancyMode,
    /// Base URL of the video platform API (default: https://api.mux.com)
    #[serde(default = "default_mux_api_base_url")]
    pub mux_api_base_url: String,
    /// Accepted clock skew for webhook signature timestamps, in seconds (default: 300)
    #[serde(default = "default_signature_tolerance_secs")]
    pub signature_tolerance_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            tenancy: default_tenancy(),
            mux_api_base_url: default_mux_api_base_url(),
            signature_tolerance_secs: default_signature_tolerance_secs(),
        }
    }
}

impl RelayConfig {
    /// Load the optional config file, then apply environment overrides
    pub fn load(config_path: Option<&Path>) -> Result<Self, String> {
        let mut config = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    format!("Failed to read config file '{}': {}", path.display(), e)
                })?;
                toml::from_str(&content).map_err(|e| {
                    format!("Failed to parse config file '{}': {}", path.display(), e)
                })?
            }
            None => RelayConfig::default(),
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Override settings from `PORT`, `TENANCY`, `MUX_API_BASE_URL` and
    /// `MUX_SIGNATURE_TOLERANCE_SECS`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| format!("PORT is not a valid port number: '{}'", port))?;
        }
        if let Some(tenancy) = lookup("TENANCY") {
            self.tenancy = TenancyMode::from_str(tenancy.trim(), true)
                .map_err(|_| format!("TENANCY must be 'single' or 'multi', got '{}'", tenancy))?;
        }
        if let Some(base_url) = lookup("MUX_API_BASE_URL") {
            self.mux_api_base_url = base_url;
        }
        if let Some(tolerance) = lookup("MUX_SIGNATURE_TOLERANCE_SECS") {
            self.signature_tolerance_secs = tolerance.trim().parse().map_err(|_| {
                format!("MUX_SIGNATURE_TOLERANCE_SECS is not a number: '{}'", tolerance)
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must not be 0".to_string());
        }

        if self.signature_tolerance_secs == 0 {
            return Err("signature_tolerance_secs must be greater than 0".to_string());
        }

        let base = url::Url::parse(&self.mux_api_base_url)
            .map_err(|e| format!("Invalid mux_api_base_url '{}': {}", self.mux_api_base_url, e))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(format!(
                "mux_api_base_url must be http or https, got '{}'",
                self.mux_api_base_url
            ));
        }

        Ok(())
    }
}
