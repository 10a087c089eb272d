use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{ConsoleError, Result};

const MEMBER_NAME: &str = "inventory-console";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub crypto: CryptoSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub reports: ReportSettings,
    #[serde(default)]
    pub workflow: WorkflowSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    /// Backend root, e.g. `http://localhost:3000/api`.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    50
}

#[derive(Deserialize, Clone)]
pub struct CryptoSettings {
    /// Shared secret for password HMAC and cédula encryption.
    pub secret: Secret<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SearchSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_chars: default_min_chars(),
            page_size: default_page_size(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_min_chars() -> usize {
    3
}

fn default_page_size() -> u32 {
    10
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReportSettings {
    #[serde(default = "default_max_records")]
    pub max_records: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

fn default_max_records() -> u32 {
    1000
}

#[derive(Deserialize, Clone, Debug)]
pub struct WorkflowSettings {
    /// Failed product creations tolerated per line before the assignment
    /// loop hands control back to the review step.
    #[serde(default = "default_max_product_attempts")]
    pub max_product_attempts: u32,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_product_attempts: default_max_product_attempts(),
        }
    }
}

fn default_max_product_attempts() -> u32 {
    3
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionSettings {
    #[serde(default = "default_session_path")]
    pub path: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

fn default_session_path() -> String {
    ".inventory-session.json".to_string()
}

pub fn get_configuration() -> Result<Settings> {
    let base_path = std::env::current_dir()?;
    let configuration_directory =
        console_core::config::config_directory(&base_path, MEMBER_NAME);

    console_core::config::load_layered(&configuration_directory, "base.yaml")
        .map_err(|e| ConsoleError::Config(e.to_string()))
}
