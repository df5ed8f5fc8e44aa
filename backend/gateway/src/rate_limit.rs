//! Per-client fixed-window rate limiting for model-backed routes.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::server::GatewayState;

#[derive(Clone)]
pub struct RateLimiter {
    // client -> (request_count, window_start)
    limits: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    /// 0 disables limiting.
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            limits: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Count a request from `client` and report whether it is allowed.
    pub async fn check_limit(&self, client: &str) -> bool {
        if self.max_requests == 0 {
            return true;
        }
        let mut limits = self.limits.write().await;
        let now = Instant::now();
        let state = limits.entry(client.to_string()).or_insert((0, now));

        if now.duration_since(state.1) > self.window {
            *state = (1, now);
            return true;
        }
        state.0 += 1;
        if state.0 > self.max_requests {
            warn!(client, limit = self.max_requests, "Rate limit exceeded");
            false
        } else {
            debug!(client, count = state.0, limit = self.max_requests, "Rate limit OK");
            true
        }
    }

    /// Forget clients whose window has closed.
    pub async fn prune(&self) -> usize {
        let mut limits = self.limits.write().await;
        let now = Instant::now();
        let before = limits.len();
        limits.retain(|_, (_, start)| now.duration_since(*start) <= self.window);
        before - limits.len()
    }
}

/// Middleware: reject with 429 once a client exceeds its window.
pub async fn enforce(
    State(state): State<GatewayState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "local".to_string());
    if !state.limiter.check_limit(&client).await {
        return Err(ApiError::too_many_requests());
    }
    Ok(next.run(request).await)
}
