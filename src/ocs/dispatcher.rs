//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve the route for a request, or build the 999 fallback
//! - Invoke the bound handler and render its envelope
//! - Turn rejections into bare 400/401 responses
//!
//! # Design Decisions
//! - Envelopes are always delivered with HTTP 200; only rejections use
//!   real status codes
//! - The fallback renders in the requested format (`json` or XML)
//! - Echoing request data in the fallback message is configurable

use std::fmt::Write as _;
use std::time::Instant;

use crate::backends::Collaborators;
use crate::config::OcsConfig;
use crate::http::request::RequestContext;
use crate::observability::metrics;
use crate::ocs::envelope::{Envelope, CODE_NO_ROUTE};
use crate::ocs::error::OcsReject;
use crate::ocs::handlers::{Call, Handlers};
use crate::ocs::params::{ParamSource, ParameterReader};
use crate::ocs::serializer::{Format, ResponseSerializer};
use crate::routing::{RouteError, Router};

const NO_ROUTE_MESSAGE: &str = "Invalid query, please check the syntax. API specifications are here: \
     http://www.freedesktop.org/wiki/Specifications/open-collaboration-services. DEBUG OUTPUT:\n";

/// Outcome of one dispatch, ready to be written to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcsResponse {
    /// A rendered envelope, sent with HTTP 200.
    Document { format: Format, body: String },
    /// HTTP 400 with a plain-text message.
    BadRequest { message: String },
    /// HTTP 401 with a Basic challenge for `realm`.
    Unauthorized { realm: String },
    /// HTTP 500; rendering failed.
    Internal,
}

/// Routes requests to handlers and renders the result.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Router,
    handlers: Handlers,
    serializer: ResponseSerializer,
    realm: String,
    debug_diagnostics: bool,
}

impl Dispatcher {
    pub fn new(config: &OcsConfig, collaborators: Collaborators) -> Result<Self, RouteError> {
        Ok(Self {
            router: Router::ocs()?,
            handlers: Handlers::new(collaborators, config.clone()),
            serializer: ResponseSerializer::new(config.xml_indent),
            realm: config.realm.clone(),
            debug_diagnostics: config.debug_diagnostics,
        })
    }

    pub async fn handle(&self, ctx: &RequestContext) -> OcsResponse {
        let start = Instant::now();
        let params = ParameterReader::new(&ctx.query, &ctx.body);
        let requested_format = params
            .text(ParamSource::for_method(&ctx.method), "format", Some(""))
            .unwrap_or_default();

        let Some(route) = self
            .router
            .match_request(&ctx.method, &ctx.path, &requested_format)
        else {
            tracing::debug!(method = %ctx.method, path = %ctx.path, "No route matched");
            let envelope = Envelope::failed(CODE_NO_ROUTE, self.no_route_message(ctx));
            let response = self.render(Format::from_param(&requested_format), &envelope);
            metrics::record_request("none", "no_route", start);
            return response;
        };

        let operation = route.operation;
        let call = Call {
            route: &route,
            params,
            credentials: ctx.credentials.as_ref(),
            host: &ctx.host,
        };
        tracing::debug!(operation = operation.name(), "Dispatching");

        let (response, outcome) = match self.handlers.invoke(operation, &call).await {
            Ok(envelope) => {
                let outcome = if envelope.is_ok() { "ok" } else { "failed" };
                (self.render(Format::from_param(route.format()), &envelope), outcome)
            }
            Err(reject @ OcsReject::MissingParameter { .. }) => (
                OcsResponse::BadRequest {
                    message: reject.to_string(),
                },
                "bad_request",
            ),
            Err(OcsReject::Unauthenticated) => (
                OcsResponse::Unauthorized {
                    realm: self.realm.clone(),
                },
                "unauthorized",
            ),
        };

        let outcome = if response == OcsResponse::Internal {
            "error"
        } else {
            outcome
        };
        metrics::record_request(operation.name(), outcome, start);
        response
    }

    fn render(&self, format: Format, envelope: &Envelope) -> OcsResponse {
        match self.serializer.render(format, envelope) {
            Ok(body) => OcsResponse::Document { format, body },
            Err(e) => {
                tracing::error!(error = %e, "Failed to render envelope");
                OcsResponse::Internal
            }
        }
    }

    fn no_route_message(&self, ctx: &RequestContext) -> String {
        let mut message = String::from(NO_ROUTE_MESSAGE);
        if !self.debug_diagnostics {
            return message;
        }

        message.push_str("debug output:\n");
        let _ = writeln!(message, "http request method: {}", ctx.method);
        let _ = writeln!(message, "http request uri: {}", ctx.uri);
        for (key, value) in ctx.query.iter() {
            let _ = writeln!(message, "get parameter: {key}->{value}");
        }
        for (key, value) in ctx.body.iter() {
            let _ = writeln!(message, "post parameter: {key}->{value}");
        }
        message
    }
}
