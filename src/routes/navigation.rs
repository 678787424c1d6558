//! Site navigation links

use hyper::{Response, StatusCode};
use std::sync::Arc;
use tracing::info;

use crate::server::AppState;

use super::{gateway_error_response, json_response, FullBody};

/// GET /navigation
pub async fn handle_navigation(state: Arc<AppState>) -> Response<FullBody> {
    match state.navigation.get_or_load(state.store.as_ref()).await {
        Ok(links) => json_response(StatusCode::OK, &serde_json::json!({ "links": links })),
        Err(e) => gateway_error_response(&e),
    }
}

/// POST /navigation/refresh
pub async fn handle_navigation_refresh(state: Arc<AppState>) -> Response<FullBody> {
    state.navigation.invalidate().await;
    info!("Navigation cache invalidated");
    match state.navigation.get_or_load(state.store.as_ref()).await {
        Ok(links) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "refreshed": true, "links": links }),
        ),
        Err(e) => gateway_error_response(&e),
    }
}
