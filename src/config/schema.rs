//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the OCS gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// OCS wire-contract settings.
    pub ocs: OcsConfig,

    /// Storage settings for the bundled collaborators.
    pub storage: StorageConfig,

    /// Accounts known to the bundled account directory.
    pub accounts: Vec<AccountConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Deadline applied to every collaborator call in milliseconds.
    pub collaborator_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            collaborator_ms: 5_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Settings that shape the OCS wire contract.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OcsConfig {
    /// URL prefix under which the OCS routes are mounted.
    pub base_path: String,

    /// Protocol version advertised by `config`.
    pub version: String,

    /// Website name advertised by `config`.
    pub website: String,

    /// Host advertised by `config`. Taken from the request when unset.
    pub host: Option<String>,

    /// Contact advertised by `config`.
    pub contact: String,

    /// Whether `config` advertises SSL.
    pub ssl: bool,

    /// Group whose members may read and set any user's quota.
    pub admin_group: String,

    /// Realm sent with the Basic-Auth challenge.
    pub realm: String,

    /// Indentation width for XML documents. Zero renders compact XML.
    pub xml_indent: usize,

    /// Echo request method, URI and parameters in the "no route" message.
    pub debug_diagnostics: bool,
}

impl Default for OcsConfig {
    fn default() -> Self {
        Self {
            base_path: "/ocs/v1.php".to_string(),
            version: "1.7".to_string(),
            website: "ownCloud".to_string(),
            host: None,
            contact: String::new(),
            ssl: false,
            admin_group: "admin".to_string(),
            realm: "your valid user account or api key".to_string(),
            xml_indent: 1,
            debug_diagnostics: true,
        }
    }
}

/// Storage configuration for the bundled collaborators.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the per-user file trees (`<data_dir>/<user>/files`).
    pub data_dir: Option<PathBuf>,

    /// Quota applied to accounts that do not declare one.
    pub default_quota_bytes: u64,

    /// JSON file the preference store is loaded from and saved to.
    pub preferences_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_quota_bytes: 10 * 1024 * 1024 * 1024, // 10GiB
            preferences_file: None,
        }
    }
}

/// A single account of the bundled account directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    /// Login name.
    pub username: String,

    /// Plain password checked by Basic auth.
    pub password: String,

    /// Groups the account belongs to.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Storage quota in bytes.
    #[serde(default)]
    pub quota_bytes: Option<u64>,
}
