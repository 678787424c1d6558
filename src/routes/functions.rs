//! Edge functions under `/functions/v1/<name>`
//!
//! Each function parses its JSON body, checks required fields, calls one
//! external service, writes rows, and answers with JSON (or a redirect).

use bytes::Bytes;
use chrono::Utc;
use hyper::{Method, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::feeds::{build_sitemap, render_rss, render_sitemap, RSS_ITEM_LIMIT};
use crate::pipeline::{generate_topic_content, link_questions_to_topics, PipelineError};
use crate::server::AppState;
use crate::services::{
    activate_trial, cancel_subscription, create_checkout, generate_blog_post, CheckoutRequest,
    NewUser, OutgoingEmail,
};

use super::{
    error_response, gateway_error_response, json_response, parse_json, query_param,
    redirect_response, xml_response, FullBody,
};

pub const FUNCTIONS_PREFIX: &str = "/functions/v1/";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkTopicsBody {
    question_ids: Vec<String>,
}

#[derive(Deserialize)]
struct GenerateTopicsBody {
    topics: Vec<String>,
}

#[derive(Deserialize, Default)]
struct GenerateBlogBody {
    #[serde(default)]
    subject: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdBody {
    user_id: Uuid,
}

/// One address or a list
#[derive(Deserialize)]
#[serde(untagged)]
enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    fn into_vec(self) -> Vec<String> {
        match self {
            Recipients::One(to) => vec![to],
            Recipients::Many(to) => to,
        }
    }
}

#[derive(Deserialize)]
struct SendEmailBody {
    to: Recipients,
    subject: String,
    html: String,
}

fn pipeline_error_response(err: &PipelineError) -> Response<FullBody> {
    let body = serde_json::json!({
        "error": err.to_string(),
        "successCount": 0,
        "errorCount": 0,
        "errors": [],
    });
    json_response(err.status_code(), &body)
}

/// Dispatch `/functions/v1/<name>`
pub async fn handle_function_request(
    state: Arc<AppState>,
    method: Method,
    name: &str,
    query: Option<&str>,
    body: Bytes,
) -> Response<FullBody> {
    match (method, name) {
        (Method::POST, "link-topics") => link_topics(state, body).await,
        (Method::POST, "generate-topic-content") => generate_topics(state, body).await,
        (Method::POST, "generate-blog") => generate_blog(state, body).await,
        (Method::POST, "activate-trial") => trial(state, body).await,
        (Method::POST, "create-checkout") => checkout(state, body).await,
        (Method::GET, "cancel-subscription") => cancel(state, query).await,
        (Method::POST, "send-email") => send_email(state, body).await,
        (Method::POST, "create-user") => create_user(state, body).await,
        (Method::POST, "delete-user") => delete_user(state, body).await,
        (Method::GET, "sitemap") => sitemap(state).await,
        (Method::GET, "rss") => rss(state).await,
        (
            _,
            "link-topics" | "generate-topic-content" | "generate-blog" | "activate-trial"
            | "create-checkout" | "cancel-subscription" | "send-email" | "create-user"
            | "delete-user" | "sitemap" | "rss",
        ) => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
        _ => error_response(
            StatusCode::NOT_FOUND,
            &format!("Unknown function: {}", name),
        ),
    }
}

async fn link_topics(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let request: LinkTopicsBody = match parse_json(&body, &["questionIds"]) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match link_questions_to_topics(
        state.store.as_ref(),
        state.matcher.as_ref(),
        &request.question_ids,
    )
    .await
    {
        Ok(summary) => json_response(StatusCode::OK, &summary),
        Err(e) => pipeline_error_response(&e),
    }
}

async fn generate_topics(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let request: GenerateTopicsBody = match parse_json(&body, &["topics"]) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match generate_topic_content(
        state.store.as_ref(),
        state.generator.as_ref(),
        &request.topics,
    )
    .await
    {
        Ok(summary) => json_response(StatusCode::OK, &summary),
        Err(e) => pipeline_error_response(&e),
    }
}

async fn generate_blog(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    // An empty body means "pick the subject for me"
    let request: GenerateBlogBody = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateBlogBody::default()
    } else {
        match parse_json(&body, &[]) {
            Ok(r) => r,
            Err(resp) => return resp,
        }
    };
    match generate_blog_post(
        state.store.as_ref(),
        state.matcher.as_ref(),
        request.subject.as_deref(),
    )
    .await
    {
        Ok(post) => json_response(StatusCode::OK, &serde_json::json!({ "post": post })),
        Err(e) => gateway_error_response(&e),
    }
}

async fn trial(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let request: UserIdBody = match parse_json(&body, &["userId"]) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match activate_trial(state.store.as_ref(), request.user_id).await {
        Ok(trial) => json_response(
            StatusCode::OK,
            &serde_json::json!({ "success": true, "trial": trial }),
        ),
        Err(e) => gateway_error_response(&e),
    }
}

async fn checkout(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let request: CheckoutRequest = match parse_json(&body, &["userId", "tierId"]) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match create_checkout(
        state.store.as_ref(),
        state.payments.as_ref(),
        state.args.site_base(),
        &request,
    )
    .await
    {
        Ok(session) => json_response(StatusCode::OK, &session),
        Err(e) => gateway_error_response(&e),
    }
}

async fn cancel(state: Arc<AppState>, query: Option<&str>) -> Response<FullBody> {
    let Some(raw) = query_param(query, "user_id") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required parameter: user_id");
    };
    let user_id = match Uuid::parse_str(&raw) {
        Ok(id) => id,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "user_id must be a UUID"),
    };
    match cancel_subscription(state.store.as_ref(), state.payments.as_ref(), user_id).await {
        Ok(()) => redirect_response(&format!(
            "{}/account?subscription=cancelled",
            state.args.site_base()
        )),
        Err(e) => gateway_error_response(&e),
    }
}

async fn send_email(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let request: SendEmailBody = match parse_json(&body, &["to", "subject", "html"]) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let to = request.to.into_vec();
    if to.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "to must name at least one recipient");
    }
    let email = OutgoingEmail {
        to,
        subject: request.subject,
        html: request.html,
    };
    match state.email.send(&email).await {
        Ok(id) => json_response(StatusCode::OK, &serde_json::json!({ "id": id })),
        Err(e) => gateway_error_response(&e),
    }
}

async fn create_user(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let request: NewUser = match parse_json(&body, &["email", "password"]) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    if let Err(e) = request.validate() {
        return gateway_error_response(&e);
    }
    match state.users.create_user(&request).await {
        Ok(user) => json_response(StatusCode::OK, &serde_json::json!({ "user": user })),
        Err(e) => gateway_error_response(&e),
    }
}

async fn delete_user(state: Arc<AppState>, body: Bytes) -> Response<FullBody> {
    let request: UserIdBody = match parse_json(&body, &["userId"]) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match state.users.delete_user(request.user_id).await {
        Ok(true) => {
            info!(user = %request.user_id, "User removed via admin function");
            json_response(StatusCode::OK, &serde_json::json!({ "success": true }))
        }
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            &format!("User {} not found", request.user_id),
        ),
        Err(e) => gateway_error_response(&e),
    }
}

async fn sitemap(state: Arc<AppState>) -> Response<FullBody> {
    let blogs = match state.store.list_published_blogs(None).await {
        Ok(b) => b,
        Err(e) => return gateway_error_response(&e),
    };
    let pages = match state.store.list_pages().await {
        Ok(p) => p,
        Err(e) => return gateway_error_response(&e),
    };
    let entries = build_sitemap(state.args.site_base(), &blogs, &pages, Utc::now());
    xml_response("application/xml; charset=utf-8", render_sitemap(&entries))
}

async fn rss(state: Arc<AppState>) -> Response<FullBody> {
    match state.store.list_published_blogs(Some(RSS_ITEM_LIMIT)).await {
        Ok(posts) => xml_response(
            "application/xml; charset=utf-8",
            render_rss(state.args.site_base(), &posts),
        ),
        Err(e) => gateway_error_response(&e),
    }
}
