//! Liveness probe

use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::cache::navigation::NavigationCacheStats;
use crate::server::AppState;

use super::{json_response, FullBody};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    pub mode: &'static str,
    pub timestamp: String,
    pub navigation_cache: NavigationCacheStats,
}

/// GET /health
pub async fn health_check(state: Arc<AppState>) -> Response<FullBody> {
    let response = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        mode: if state.args.dev_mode { "development" } else { "production" },
        timestamp: chrono::Utc::now().to_rfc3339(),
        navigation_cache: state.navigation.stats().await,
    };
    json_response(StatusCode::OK, &response)
}
