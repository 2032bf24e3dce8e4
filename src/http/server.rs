//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout)
//! - Bind server to listener
//! - Stop accepting on shutdown and let in-flight requests finish

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AgentConfig;
use crate::http::handlers::*;
use crate::http::request::{request_span, UuidRequestId, X_REQUEST_ID};
use crate::mutation::MutationCoordinator;
use crate::reload::ReloadSupervisor;
use crate::store::ConfigStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<MutationCoordinator>,
}

/// HTTP server for the config agent.
pub struct AgentServer {
    router: Router,
    config: AgentConfig,
    coordinator: Arc<MutationCoordinator>,
}

impl AgentServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AgentConfig) -> Self {
        let store = ConfigStore::new(&config.nginx.config_dir, config.nginx.config_extension.clone());
        let reloader = ReloadSupervisor::from_config(&config.nginx);
        let coordinator = Arc::new(MutationCoordinator::new(store, reloader));

        let state = AppState {
            coordinator: coordinator.clone(),
        };
        let router = Self::build_router(&config, state);

        Self {
            router,
            config,
            coordinator,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AgentConfig, state: AppState) -> Router {
        let configs = Router::new()
            .route("/configs", get(list_configs))
            .route(
                "/configs/{filename}",
                get(show_config)
                    .post(upload_config)
                    .put(update_config)
                    .delete(delete_config),
            )
            .route(
                "/configs/",
                post(missing_filename).put(missing_filename).delete(missing_filename),
            )
            .route("/health", get(get_status));

        let header = axum::http::HeaderName::from_static(X_REQUEST_ID);
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(header.clone(), UuidRequestId))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(PropagateRequestIdLayer::new(header))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .nest("/api/ngx", configs)
            .with_state(state)
            .layer(middleware)
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
            config_dir = %self.config.nginx.config_dir,
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

    pub fn coordinator(&self) -> Arc<MutationCoordinator> {
        self.coordinator.clone()
    }

    /// The router without a listener, for driving requests in-process.
    pub fn into_router(self) -> Router {
        self.router
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn server(dir: &std::path::Path, reload_script: &str) -> AgentServer {
        let mut config = AgentConfig::default();
        config.nginx.config_dir = dir.to_string_lossy().into_owned();
        config.nginx.binary_path = "/bin/sh".into();
        config.nginx.reload_args = vec!["-c".into(), reload_script.into()];
        AgentServer::new(config)
    }

    fn form(method: Method, uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_router_update_then_list() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("app.conf"), "old").unwrap();
        let server = server(dir.path(), "exit 0");
        let coordinator = server.coordinator();
        let router = server.into_router();

        let res = router
            .clone()
            .oneshot(form(Method::PUT, "/api/ngx/configs/app.conf", "content=server%7B%7D"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(X_REQUEST_ID));

        let res = router
            .oneshot(Request::get("/api/ngx/configs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
        let files: Vec<ConfigFileView> = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            files,
            vec![ConfigFileView {
                filename: "app.conf".into(),
                content: "server{}".into(),
            }]
        );
        assert_eq!(coordinator.stage(), crate::mutation::MutationStage::Idle);
    }

    #[tokio::test]
    async fn test_router_reload_failure_is_500() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("app.conf"), "old").unwrap();
        let router = server(dir.path(), "exit 1").into_router();

        let res = router
            .oneshot(form(Method::PUT, "/api/ngx/configs/app.conf", "content=new"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(std::fs::read_to_string(dir.path().join("app.conf")).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_router_unknown_route_is_404() {
        let dir = tempdir().unwrap();
        let router = server(dir.path(), "exit 0").into_router();
        let res = router
            .oneshot(Request::get("/api/v1/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
