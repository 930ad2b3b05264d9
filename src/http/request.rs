//! Request extraction.
//!
//! # Responsibilities
//! - Decode query string and form body into ordered parameter lists
//! - Derive the path info below the OCS base path
//! - Resolve the addressed host and Basic-Auth credentials
//!
//! # Design Decisions
//! - The context is built once per request and read-only afterwards
//! - A repeated parameter keeps every occurrence; lookups see the last one
//! - Bodies are only parsed as forms when declared as such (or undeclared)

use axum::http::{header, request::Parts, HeaderMap};

use crate::ocs::auth::Credentials;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Ordered name/value pairs of one parameter source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Decode an `application/x-www-form-urlencoded` string.
    pub fn parse(encoded: &[u8]) -> Self {
        Self::from_pairs(
            url::form_urlencoded::parse(encoded).map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Value of `key`; the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Everything the dispatcher needs to know about one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: String,
    /// Request URI as received, including the query string.
    pub uri: String,
    /// Path below the OCS base path, e.g. `/config.xml`.
    pub path: String,
    pub host: String,
    pub query: Params,
    pub body: Params,
    pub credentials: Option<Credentials>,
}

impl RequestContext {
    /// Build the context from request head and buffered body.
    pub fn from_parts(parts: &Parts, body: &[u8], base_path: &str) -> Self {
        let path = parts.uri.path();
        let path = path.strip_prefix(base_path).unwrap_or(path);

        let query = parts
            .uri
            .query()
            .map(|q| Params::parse(q.as_bytes()))
            .unwrap_or_default();
        let body = if is_form(&parts.headers) {
            Params::parse(body)
        } else {
            Params::default()
        };

        let credentials = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(Credentials::from_authorization);

        Self {
            method: parts.method.as_str().to_string(),
            uri: parts.uri.to_string(),
            path: path.to_string(),
            host: request_host(&parts.headers),
            query,
            body,
            credentials,
        }
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    match headers.get(header::CONTENT_TYPE) {
        None => true,
        Some(value) => value
            .to_str()
            .map(|ct| ct.trim_start().starts_with(FORM_CONTENT_TYPE))
            .unwrap_or(false),
    }
}

/// `X-Forwarded-Host`, then `Host`, then `localhost`.
fn request_host(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-host")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| headers.get(header::HOST).and_then(|v| v.to_str().ok()))
        .unwrap_or("localhost")
        .to_string()
}
