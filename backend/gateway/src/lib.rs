//! DiagramLens Gateway HTTP API Server
//!
//! Serves the browser UI and the JSON API for study sessions: upload,
//! explanation, quiz and chat.

pub mod control_ui;
pub mod error;
pub mod health_api;
pub mod rate_limit;
pub mod reaper;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{GatewayOptions, GatewayState, build_router, shutdown_signal, start_server};
