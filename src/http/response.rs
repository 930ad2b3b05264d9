//! Response writing.
//!
//! # Responsibilities
//! - Map dispatch outcomes to HTTP status, headers and body
//!
//! # Design Decisions
//! - Rendered envelopes are always HTTP 200, whatever their OCS status
//! - 400 and 401 carry no envelope: plain text and a Basic challenge

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::ocs::OcsResponse;

impl IntoResponse for OcsResponse {
    fn into_response(self) -> Response {
        match self {
            OcsResponse::Document { format, body } => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, format.content_type())],
                body,
            )
                .into_response(),
            OcsResponse::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                message,
            )
                .into_response(),
            OcsResponse::Unauthorized { realm } => {
                let challenge = HeaderValue::from_str(&format!("Basic realm=\"{realm}\""))
                    .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, challenge);
                response
            }
            OcsResponse::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
