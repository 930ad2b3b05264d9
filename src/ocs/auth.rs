//! Basic-Auth authenticator.
//!
//! Every call re-verifies against the user backend; nothing is cached
//! between calls, even inside one request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;

use crate::backends::UserBackend;
use crate::observability::metrics;
use crate::ocs::error::OcsReject;
use crate::resilience::with_deadline;

/// Username and password taken from an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Decode an `Authorization` header value.
    ///
    /// Returns `None` for other schemes, undecodable payloads and an empty
    /// username.
    pub fn from_authorization(header: &str) -> Option<Self> {
        let (scheme, encoded) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':').unwrap_or((decoded.as_str(), ""));
        if username.is_empty() {
            return None;
        }

        Some(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Who is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated { username: String },
}

impl Identity {
    pub fn username(&self) -> Option<&str> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { username } => Some(username),
        }
    }
}

/// Resolves credentials to an [`Identity`].
#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserBackend>,
    deadline: Duration,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserBackend>, deadline: Duration) -> Self {
        Self { users, deadline }
    }

    /// Verify `credentials`.
    ///
    /// With `force_require_user` unset, missing or invalid credentials
    /// resolve to [`Identity::Anonymous`]; with it set they reject with
    /// [`OcsReject::Unauthenticated`].
    pub async fn check_credentials(
        &self,
        credentials: Option<&Credentials>,
        force_require_user: bool,
    ) -> Result<Identity, OcsReject> {
        if let Some(creds) = credentials {
            if self.verify(&creds.username, &creds.password).await {
                return Ok(Identity::Authenticated {
                    username: creds.username.clone(),
                });
            }
            metrics::record_auth_failure();
            tracing::info!(user = %creds.username, "Basic auth rejected");
        }

        if force_require_user {
            Err(OcsReject::Unauthenticated)
        } else {
            Ok(Identity::Anonymous)
        }
    }

    /// Checks a login/password pair. Backend errors count as a failed
    /// verification.
    pub async fn verify(&self, username: &str, password: &str) -> bool {
        let call = self.users.check_password(username, password);
        match with_deadline(self.deadline, "users.check_password", call).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(user = %username, error = %e, "Credential check failed");
                false
            }
        }
    }
}
