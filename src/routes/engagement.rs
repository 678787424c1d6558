//! Bookmark, rating and feedback endpoints

use bytes::Bytes;
use hyper::{Method, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::schemas::{Bookmark, FeedbackStatus, NewFeedback, Rating};
use crate::server::AppState;
use crate::services::OutgoingEmail;

use super::{
    error_response, gateway_error_response, json_response, parse_id, parse_json, query_param,
    FullBody,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityRef {
    user_id: Uuid,
    entity_type: String,
    entity_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RatingBody {
    #[serde(flatten)]
    entity: EntityRef,
    stars: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackBody {
    #[serde(flatten)]
    entity: EntityRef,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackUpdateBody {
    status: FeedbackStatus,
    #[serde(default)]
    admin_notes: Option<String>,
}

const ENTITY_FIELDS: [&str; 3] = ["userId", "entityType", "entityId"];

/// Dispatch engagement paths; `None` when the path is not one of them
pub async fn handle_engagement_request(
    state: Arc<AppState>,
    method: Method,
    path: &str,
    query: Option<&str>,
    body: Bytes,
) -> Option<Response<FullBody>> {
    let response = match (method, path) {
        (Method::POST, "/bookmarks/toggle") => toggle_bookmark(state, body).await,
        (Method::POST, "/ratings") => rate(state, body).await,
        (Method::POST, "/feedback") => submit_feedback(state, body).await,
        (Method::GET, "/admin/feedback") => list_feedback(state, query).await,
        (Method::PUT, p) if p.starts_with("/admin/feedback/") => {
            let id = p.trim_start_matches("/admin/feedback/");
            update_feedback(state, id, body).await
        }
        _ => return None,
    };
    Some(response)
}

async fn toggle_bookmark(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let entity: EntityRef = match parse_json(&body, &ENTITY_FIELDS) {
        Ok(e) => e,
        Err(resp) => return resp,
    };
    let bookmark = Bookmark {
        user_id: entity.user_id,
        entity_type: entity.entity_type,
        entity_id: entity.entity_id,
    };

    // Two statements; a concurrent toggle can interleave between them
    let result = match state.store.bookmark_exists(&bookmark).await {
        Ok(true) => state.store.delete_bookmark(&bookmark).await.map(|_| false),
        Ok(false) => state.store.insert_bookmark(bookmark).await.map(|_| true),
        Err(e) => Err(e),
    };
    match result {
        Ok(bookmarked) => {
            json_response(StatusCode::OK, &serde_json::json!({ "bookmarked": bookmarked }))
        }
        Err(e) => gateway_error_response(&e),
    }
}

async fn rate(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let mut required = ENTITY_FIELDS.to_vec();
    required.push("stars");
    let request: RatingBody = match parse_json(&body, &required) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    if !(1..=5).contains(&request.stars) {
        return error_response(StatusCode::BAD_REQUEST, "stars must be between 1 and 5");
    }
    let rating = Rating {
        user_id: request.entity.user_id,
        entity_type: request.entity.entity_type,
        entity_id: request.entity.entity_id,
        stars: request.stars,
    };
    match state.store.upsert_rating(rating).await {
        Ok(()) => json_response(StatusCode::OK, &serde_json::json!({ "success": true })),
        Err(e) => gateway_error_response(&e),
    }
}

async fn submit_feedback(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let mut required = ENTITY_FIELDS.to_vec();
    required.push("message");
    let request: FeedbackBody = match parse_json(&body, &required) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    if request.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message must not be empty");
    }

    let feedback = match state
        .store
        .insert_feedback(NewFeedback {
            user_id: request.entity.user_id,
            entity_type: request.entity.entity_type,
            entity_id: request.entity.entity_id,
            message: request.message,
        })
        .await
    {
        Ok(f) => f,
        Err(e) => return gateway_error_response(&e),
    };
    info!(id = %feedback.id, entity = %feedback.entity_type, "Feedback submitted");

    if let Some(to) = &state.args.feedback_notify_email {
        let email = OutgoingEmail {
            to: vec![to.clone()],
            subject: format!("New feedback on {} {}", feedback.entity_type, feedback.entity_id),
            html: format!(
                "<p>{}</p><p>From user {}</p>",
                crate::feeds::xml_escape(&feedback.message),
                feedback.user_id
            ),
        };
        if let Err(e) = state.email.send(&email).await {
            warn!(id = %feedback.id, error = %e, "Feedback notification failed");
        }
    }

    json_response(StatusCode::CREATED, &feedback)
}

async fn list_feedback(state: Arc<AppState>, query: Option<&str>) -> Response<FullBody> {
    let status = match query_param(query, "status") {
        Some(raw) => {
            match serde_json::from_value::<FeedbackStatus>(serde_json::Value::String(raw)) {
                Ok(s) => Some(s),
                Err(_) => {
                    return error_response(StatusCode::BAD_REQUEST, "Unknown feedback status")
                }
            }
        }
        None => None,
    };
    match state.store.list_feedback(status).await {
        Ok(items) => json_response(StatusCode::OK, &items),
        Err(e) => gateway_error_response(&e),
    }
}

async fn update_feedback(state: Arc<AppState>, raw_id: &str, body: Bytes) -> Response<FullBody> {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let request: FeedbackUpdateBody = match parse_json(&body, &["status"]) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match state
        .store
        .update_feedback(id, request.status, request.admin_notes)
        .await
    {
        Ok(Some(updated)) => {
            info!(id = %id, status = request.status.as_str(), "Feedback updated");
            json_response(StatusCode::OK, &updated)
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Feedback not found"),
        Err(e) => gateway_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{body_json, fixture};

    async fn call(
        state: Arc<AppState>,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: String,
    ) -> Response<FullBody> {
        handle_engagement_request(state, method, path, query, Bytes::from(body))
            .await
            .expect("engagement route")
    }

    fn entity_json(extra: &str) -> String {
        format!(
            r#"{{"userId":"{}","entityType":"question","entityId":"{}"{}}}"#,
            Uuid::nil(),
            Uuid::from_u128(7),
            extra
        )
    }

    #[tokio::test]
    async fn test_bookmark_toggles() {
        let fx = fixture();
        for expected in [true, false] {
            let resp = call(
                fx.state.clone(),
                Method::POST,
                "/bookmarks/toggle",
                None,
                entity_json(""),
            )
            .await;
            assert_eq!(body_json(resp).await["bookmarked"], expected);
        }
    }

    #[tokio::test]
    async fn test_rating_upserts_and_validates_range() {
        let fx = fixture();
        for stars in [3, 5] {
            let resp = call(
                fx.state.clone(),
                Method::POST,
                "/ratings",
                None,
                entity_json(&format!(r#","stars":{}"#, stars)),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::OK);
        }
        let ratings = fx.store.ratings().await;
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].stars, 5);

        let resp = call(
            fx.state.clone(),
            Method::POST,
            "/ratings",
            None,
            entity_json(r#","stars":0"#),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_feedback_flow_notifies_and_updates() {
        let fx = fixture();
        let resp = call(
            fx.state.clone(),
            Method::POST,
            "/feedback",
            None,
            entity_json(r#","message":"Option C is also correct""#),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();
        assert_eq!(fx.email.sent_count(), 1);

        let pending = call(
            fx.state.clone(),
            Method::GET,
            "/admin/feedback",
            Some("status=pending"),
            String::new(),
        )
        .await;
        assert_eq!(body_json(pending).await.as_array().unwrap().len(), 1);

        let resp = call(
            fx.state.clone(),
            Method::PUT,
            &format!("/admin/feedback/{}", id),
            None,
            r#"{"status":"resolved","adminNotes":"Fixed the key"}"#.into(),
        )
        .await;
        let json = body_json(resp).await;
        assert_eq!(json["status"], "resolved");
        assert_eq!(json["admin_notes"], "Fixed the key");

        let resp = call(
            fx.state.clone(),
            Method::GET,
            "/admin/feedback",
            Some("status=bogus"),
            String::new(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_handled() {
        let fx = fixture();
        let resp = handle_engagement_request(
            fx.state.clone(),
            Method::GET,
            "/ratings",
            None,
            Bytes::new(),
        )
        .await;
        assert!(resp.is_none());
    }
}
