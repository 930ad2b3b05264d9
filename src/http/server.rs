//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router mounting the OCS entry point under the base path
//! - Wire up middleware (tracing, request timeout, request ID)
//! - Buffer the body, build the request context and dispatch
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::backends::Collaborators;
use crate::config::GatewayConfig;
use crate::http::request::{RequestContext, X_REQUEST_ID};
use crate::ocs::Dispatcher;
use crate::routing::RouteError;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub base_path: Arc<str>,
    pub max_body_size: usize,
}

/// HTTP server for the OCS endpoint.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server. Fails when the route table is invalid.
    pub fn new(config: GatewayConfig, collaborators: Collaborators) -> Result<Self, RouteError> {
        let dispatcher = Dispatcher::new(&config.ocs, collaborators)?;
        let base_path = config.ocs.base_path.trim_end_matches('/');

        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            base_path: Arc::from(base_path),
            max_body_size: config.listener.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        let routes = if state.base_path.is_empty() {
            Router::new()
                .route("/", any(ocs_handler))
                .route("/{*path}", any(ocs_handler))
        } else {
            let base = state.base_path.to_string();
            Router::new()
                .route(&base, any(ocs_handler))
                .route(&format!("{base}/{{*path}}"), any(ocs_handler))
        };

        routes
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// The router, for serving in-process (tests) without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_path = %self.config.ocs.base_path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// OCS entry point: every method, every path below the base path.
async fn ocs_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Request body rejected");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let ctx = RequestContext::from_parts(&parts, &body, &state.base_path);
    tracing::debug!(method = %ctx.method, path = %ctx.path, "OCS request");

    state.dispatcher.handle(&ctx).await.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{
        AccountDirectory, FsQuotaBackend, MemoryActivityStore, MemoryPreferenceStore,
    };
    use crate::config::AccountConfig;
    use axum::http::header;
    use tower::ServiceExt;

    fn server(base_path: &str) -> Router {
        let mut config = GatewayConfig::default();
        config.ocs.base_path = base_path.to_string();
        config.accounts = vec![AccountConfig {
            username: "alice".into(),
            password: "pw".into(),
            groups: vec![],
            quota_bytes: None,
        }];

        let directory = Arc::new(AccountDirectory::new(&config.accounts));
        let collaborators = Collaborators {
            users: directory.clone(),
            groups: directory,
            preferences: Arc::new(MemoryPreferenceStore::new(None)),
            quota: Arc::new(FsQuotaBackend::new(&config.storage, &config.accounts)),
            activity: Arc::new(MemoryActivityStore::new()),
            deadline: Duration::from_secs(1),
        };
        HttpServer::new(config, collaborators).unwrap().into_router()
    }

    #[tokio::test]
    async fn test_config_under_base_path() {
        let response = server("/ocs/v1.php")
            .oneshot(
                Request::get("/ocs/v1.php/config.json")
                    .header(header::HOST, "cloud.example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["data"]["host"], "cloud.example.org");
    }

    #[tokio::test]
    async fn test_bare_base_path_is_no_route() {
        let response = server("/ocs/v1.php")
            .oneshot(Request::get("/ocs/v1.php").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("<statuscode>999</statuscode>"));
    }

    #[tokio::test]
    async fn test_outside_base_path_is_not_found() {
        let response = server("/ocs/v1.php")
            .oneshot(Request::get("/config.xml").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_root_mount() {
        let response = server("")
            .oneshot(Request::get("/config.xml").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
