//! Conditions that end a request outside the envelope.

use thiserror::Error;

/// A transport-level rejection. Handlers propagate it with `?`; the
/// dispatcher turns it into a bare HTTP response without an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OcsReject {
    /// A required parameter was absent. Rendered as HTTP 400.
    #[error("Bad request. Please provide a valid {key}")]
    MissingParameter { key: String },

    /// Credentials were required but missing or invalid. Rendered as HTTP
    /// 401 with a Basic challenge.
    #[error("authentication required")]
    Unauthenticated,
}

impl OcsReject {
    pub fn missing(key: impl Into<String>) -> Self {
        OcsReject::MissingParameter { key: key.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_message() {
        assert_eq!(
            OcsReject::missing("quota").to_string(),
            "Bad request. Please provide a valid quota"
        );
    }
}
