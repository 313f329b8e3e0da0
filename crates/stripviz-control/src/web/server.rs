//! Axum HTTP server

use axum::http::{header, HeaderValue, Method};
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Instant;
use stripviz_core::ModeControl;
use tower_http::cors::{Any, CorsLayer};

use crate::{error::ControlError, Result};

use super::routes::build_router;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub modes: ModeControl,
    pub channel_count: usize,
    pub started: Instant,
}

impl AppState {
    pub fn new(modes: ModeControl, channel_count: usize) -> Self {
        Self {
            modes,
            channel_count,
            started: Instant::now(),
        }
    }
}

/// Web server configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WebServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Bind to localhost unless told otherwise
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl WebServerConfig {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ControlError::HttpError(format!("Invalid address: {}", e)))
    }
}

/// Web server for the mode control API
pub struct WebServer {
    config: WebServerConfig,
    state: AppState,
}

impl WebServer {
    pub fn new(config: WebServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Router with middleware and state applied
    pub fn build_app(&self) -> Result<Router> {
        let app = build_router()
            .layer(middleware::from_fn(security_headers))
            .with_state(self.state.clone());

        if !self.config.enable_cors {
            return Ok(app);
        }

        let cors_layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);

        // "*" or an empty list allows any origin
        if self.config.allowed_origins.iter().any(|o| o == "*")
            || self.config.allowed_origins.is_empty()
        {
            Ok(app.layer(cors_layer.allow_origin(Any)))
        } else {
            let origins: Result<Vec<HeaderValue>> = self
                .config
                .allowed_origins
                .iter()
                .map(|o| {
                    o.parse::<HeaderValue>().map_err(|e| {
                        ControlError::HttpError(format!("Invalid origin header: {}", e))
                    })
                })
                .collect();

            Ok(app.layer(cors_layer.allow_origin(origins?)))
        }
    }

    /// Serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.socket_addr()?;
        let app = self.build_app()?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ControlError::HttpError(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("Web server listening on {}", addr);

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ControlError::HttpError(format!("Server error: {}", e)))?;

        tracing::info!("Web server stopped");
        Ok(())
    }

    /// Spawn the server in a background task
    pub fn spawn<F>(self, shutdown: F) -> tokio::task::JoinHandle<Result<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

/// Security headers middleware
async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    // Prevent MIME sniffing
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    // Prevent clickjacking
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}
