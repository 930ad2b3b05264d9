//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check account integrity (unique, non-empty usernames)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// Largest accepted XML indentation width.
pub const MAX_XML_INDENT: usize = 8;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("ocs.base_path '{0}' must be empty or start with '/' and not end with '/'")]
    InvalidBasePath(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("ocs.xml_indent {0} exceeds {MAX_XML_INDENT}")]
    IndentTooWide(usize),

    #[error("ocs.admin_group must not be empty")]
    EmptyAdminGroup,

    #[error("account #{0} has an empty username")]
    EmptyUsername(usize),

    #[error("duplicate account '{0}'")]
    DuplicateAccount(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if !is_valid_base_path(&config.ocs.base_path) {
        errors.push(ValidationError::InvalidBasePath(config.ocs.base_path.clone()));
    }
    if config.ocs.xml_indent > MAX_XML_INDENT {
        errors.push(ValidationError::IndentTooWide(config.ocs.xml_indent));
    }
    if config.ocs.admin_group.is_empty() {
        errors.push(ValidationError::EmptyAdminGroup);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.timeouts.collaborator_ms == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.collaborator_ms"));
    }
    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("listener.max_body_size"));
    }

    let mut seen = HashSet::new();
    for (i, account) in config.accounts.iter().enumerate() {
        if account.username.is_empty() {
            errors.push(ValidationError::EmptyUsername(i));
        } else if !seen.insert(account.username.as_str()) {
            errors.push(ValidationError::DuplicateAccount(account.username.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_base_path(path: &str) -> bool {
    if path.is_empty() {
        return true;
    }
    path.starts_with('/')
        && !path.ends_with('/')
        && !path.contains(['{', '}', '*', '?', '#'])
}
