//! HTTP control surface
//!
//! A small REST API for reading status and switching the visualization mode.
//! Handlers only touch the shared mode cell; they never block the render
//! loop.

pub mod handlers;
pub mod routes;
pub mod server;

pub use handlers::{ApiResponse, SetModeRequest, StatusResponse};
pub use routes::build_router;
pub use server::{AppState, WebServer, WebServerConfig};
