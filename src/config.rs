//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files and
//! environment variables.
//!
//! Sources are layered with `figment`: built-in defaults, then the optional
//! TOML file, then the environment variables listed below.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::bmv::profile::{BmvModel, BMV_BAUD_RATE};
use crate::error::{BmvError, Result};

/// Environment variable names
pub const BMV_MODEL_ENV: &str = "BMV_MODEL";
pub const DEVICE_TOKEN_ENV: &str = "DEVICE_TOKEN";
pub const SERIAL_DEVICE_ENV: &str = "SERIAL_DEVICE";
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";
pub const FETCH_INTERVAL_ENV: &str = "FETCH_INTERVAL";

/// Environment variable to configuration key
const ENV_KEYS: [(&str, &str); 5] = [
    (BMV_MODEL_ENV, "device.model"),
    (DEVICE_TOKEN_ENV, "publisher.device_token"),
    (SERIAL_DEVICE_ENV, "serial.port"),
    (API_BASE_URL_ENV, "publisher.api_base_url"),
    (FETCH_INTERVAL_ENV, "publisher.fetch_interval_s"),
];

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub device: DeviceConfig,
    pub serial: SerialConfig,
    pub publisher: PublisherConfig,
}

/// Battery monitor configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DeviceConfig {
    /// Model identifier, 600 or 602; 0 until configured
    pub model: u16,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Ingress publishing configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PublisherConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Empty until configured
    #[serde(default)]
    pub device_token: String,

    #[serde(default = "default_fetch_interval_s")]
    pub fetch_interval_s: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            device_token: String::new(),
            fetch_interval_s: default_fetch_interval_s(),
        }
    }
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { BMV_BAUD_RATE }
fn default_timeout_ms() -> u64 { 1000 }

fn default_api_base_url() -> String { "https://api.logreposit.com/v1/".to_string() }
fn default_fetch_interval_s() -> u64 { 5 }

fn config_error(msg: impl std::fmt::Display) -> BmvError {
    BmvError::Config(figment::Error::from(msg.to_string()))
}

/// Environment provider restricted to the variables in `ENV_KEYS`
fn env_provider() -> Env {
    Env::raw()
        .only(&ENV_KEYS.map(|(var, _)| var))
        .map(|var| {
            ENV_KEYS
                .iter()
                .find(|(name, _)| var.as_str().eq_ignore_ascii_case(name))
                .map(|(_, key)| (*key).into())
                .unwrap_or_else(|| var.as_str().to_string().into())
        })
}

impl Config {
    /// Layered configuration sources: defaults, optional TOML file, environment
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(env_provider())
    }

    /// Load configuration from a TOML file
    ///
    /// Environment variables override values from the file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use bmv_reader::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        // A missing file is not an error for `Toml::file`
        fs::metadata(path)?;
        Self::from_figment(Self::figment(Some(path)))
    }

    /// Build configuration from environment variables only
    ///
    /// `BMV_MODEL` and `DEVICE_TOKEN` are required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        Self::from_figment(Self::figment(None))
    }

    /// Extract and validate configuration from a prepared figment
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Selected battery monitor model
    pub fn model(&self) -> Result<BmvModel> {
        BmvModel::try_from(self.device.model)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.device.model == 0 {
            return Err(config_error(format!(
                "you have to specify the BMV model (device.model or {})",
                BMV_MODEL_ENV
            )));
        }

        if BmvModel::try_from(self.device.model).is_err() {
            return Err(config_error("only supported BMV models are 600 and 602"));
        }

        if self.serial.port.is_empty() {
            return Err(config_error("serial port cannot be empty"));
        }

        if self.serial.baud_rate != BMV_BAUD_RATE {
            return Err(config_error(format!("baud_rate must be {} (VE.Direct)", BMV_BAUD_RATE)));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(config_error("timeout_ms must be between 1 and 10000"));
        }

        if self.publisher.device_token.is_empty() {
            return Err(config_error(format!(
                "you have to specify a device token (publisher.device_token or {})",
                DEVICE_TOKEN_ENV
            )));
        }

        let url = &self.publisher.api_base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(config_error("api_base_url must be an http(s) URL"));
        }

        if self.publisher.fetch_interval_s == 0 || self.publisher.fetch_interval_s > 3600 {
            return Err(config_error("fetch_interval_s must be between 1 and 3600"));
        }

        Ok(())
    }
}
