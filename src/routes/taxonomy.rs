//! Admin CRUD for the video taxonomy
//!
//! `/admin/video-groups[/{id}]` and `/admin/video-subgroups[/{id}]`. Each
//! call is one single-table write with the service-role key.

use bytes::Bytes;
use hyper::{Method, Response, StatusCode};
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{NewVideoGroup, NewVideoSubgroup};
use crate::server::AppState;

use super::{
    error_response, gateway_error_response, json_response, parse_id, parse_json, query_param,
    FullBody,
};

pub const GROUPS_PREFIX: &str = "/admin/video-groups";
pub const SUBGROUPS_PREFIX: &str = "/admin/video-subgroups";

/// Dispatch a taxonomy path; `None` when the path is not a taxonomy route
pub async fn handle_taxonomy_request(
    state: Arc<AppState>,
    method: Method,
    path: &str,
    query: Option<&str>,
    body: Bytes,
) -> Option<Response<FullBody>> {
    if let Some(rest) = path.strip_prefix(SUBGROUPS_PREFIX) {
        return Some(subgroups(state, method, rest, query, body).await);
    }
    if let Some(rest) = path.strip_prefix(GROUPS_PREFIX) {
        return Some(groups(state, method, rest, body).await);
    }
    None
}

/// "" or "/" -> None, "/{id}" -> Some(id), anything deeper -> Err
fn split_id(rest: &str) -> Result<Option<&str>, ()> {
    match rest.trim_end_matches('/') {
        "" => Ok(None),
        r => match r.strip_prefix('/') {
            Some(id) if !id.contains('/') => Ok(Some(id)),
            _ => Err(()),
        },
    }
}

async fn groups(
    state: Arc<AppState>,
    method: Method,
    rest: &str,
    body: Bytes,
) -> Response<FullBody> {
    let id = match split_id(rest) {
        Ok(id) => id,
        Err(()) => return error_response(StatusCode::NOT_FOUND, "Not found"),
    };

    match (method, id) {
        (Method::GET, None) => match state.store.list_video_groups().await {
            Ok(groups) => json_response(StatusCode::OK, &groups),
            Err(e) => gateway_error_response(&e),
        },
        (Method::POST, None) => {
            let group: NewVideoGroup = match parse_json(&body, &["name"]) {
                Ok(g) => g,
                Err(resp) => return resp,
            };
            match state.store.create_video_group(group).await {
                Ok(created) => {
                    info!(id = %created.id, name = %created.name, "Video group created");
                    json_response(StatusCode::CREATED, &created)
                }
                Err(e) => gateway_error_response(&e),
            }
        }
        (Method::PUT, Some(raw)) => {
            let id = match parse_id(raw) {
                Ok(id) => id,
                Err(resp) => return resp,
            };
            let group: NewVideoGroup = match parse_json(&body, &["name"]) {
                Ok(g) => g,
                Err(resp) => return resp,
            };
            match state.store.update_video_group(id, group).await {
                Ok(Some(updated)) => json_response(StatusCode::OK, &updated),
                Ok(None) => error_response(StatusCode::NOT_FOUND, "Video group not found"),
                Err(e) => gateway_error_response(&e),
            }
        }
        (Method::DELETE, Some(raw)) => {
            let id = match parse_id(raw) {
                Ok(id) => id,
                Err(resp) => return resp,
            };
            match state.store.delete_video_group(id).await {
                Ok(true) => json_response(StatusCode::OK, &serde_json::json!({ "success": true })),
                Ok(false) => error_response(StatusCode::NOT_FOUND, "Video group not found"),
                Err(e) => gateway_error_response(&e),
            }
        }
        _ => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    }
}

async fn subgroups(
    state: Arc<AppState>,
    method: Method,
    rest: &str,
    query: Option<&str>,
    body: Bytes,
) -> Response<FullBody> {
    let id = match split_id(rest) {
        Ok(id) => id,
        Err(()) => return error_response(StatusCode::NOT_FOUND, "Not found"),
    };

    match (method, id) {
        (Method::GET, None) => {
            let group_id = match query_param(query, "group_id") {
                Some(raw) => match parse_id(&raw) {
                    Ok(id) => Some(id),
                    Err(resp) => return resp,
                },
                None => None,
            };
            match state.store.list_video_subgroups(group_id).await {
                Ok(subgroups) => json_response(StatusCode::OK, &subgroups),
                Err(e) => gateway_error_response(&e),
            }
        }
        (Method::POST, None) => {
            let subgroup: NewVideoSubgroup = match parse_json(&body, &["group_id", "name"]) {
                Ok(s) => s,
                Err(resp) => return resp,
            };
            match state.store.create_video_subgroup(subgroup).await {
                Ok(created) => {
                    info!(id = %created.id, group = %created.group_id, "Video subgroup created");
                    json_response(StatusCode::CREATED, &created)
                }
                Err(e) => gateway_error_response(&e),
            }
        }
        (Method::PUT, Some(raw)) => {
            let id = match parse_id(raw) {
                Ok(id) => id,
                Err(resp) => return resp,
            };
            let subgroup: NewVideoSubgroup = match parse_json(&body, &["group_id", "name"]) {
                Ok(s) => s,
                Err(resp) => return resp,
            };
            match state.store.update_video_subgroup(id, subgroup).await {
                Ok(Some(updated)) => json_response(StatusCode::OK, &updated),
                Ok(None) => error_response(StatusCode::NOT_FOUND, "Video subgroup not found"),
                Err(e) => gateway_error_response(&e),
            }
        }
        (Method::DELETE, Some(raw)) => {
            let id = match parse_id(raw) {
                Ok(id) => id,
                Err(resp) => return resp,
            };
            match state.store.delete_video_subgroup(id).await {
                Ok(true) => json_response(StatusCode::OK, &serde_json::json!({ "success": true })),
                Ok(false) => error_response(StatusCode::NOT_FOUND, "Video subgroup not found"),
                Err(e) => gateway_error_response(&e),
            }
        }
        _ => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    }
}
