//! Static content pages
//!
//! Pages are read with the anonymous key and rendered from markdown. A slug
//! with no row is a 404 carrying `status: "not_found"`, plus built-in text
//! for the handful of pages every deployment links to.

use bytes::Bytes;
use hyper::{Response, StatusCode};
use pulldown_cmark::{html, Options, Parser};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::schemas::{NewPage, StaticPage};
use crate::server::AppState;

use super::{error_response, gateway_error_response, json_response, parse_json, FullBody};

/// Built-in markdown for well-known slugs
fn fallback_content(slug: &str) -> Option<(&'static str, &'static str)> {
    match slug {
        "about" => Some((
            "About Us",
            "MedPrep helps candidates prepare for medical licensing exams with \
             question banks, topic notes and video lessons.",
        )),
        "privacy" => Some((
            "Privacy Policy",
            "We store only the account and study data needed to run the service. \
             We never sell personal data.",
        )),
        "terms" => Some((
            "Terms of Service",
            "Content is provided for exam preparation and is not medical advice.",
        )),
        "contact" => Some((
            "Contact",
            "Questions or corrections? Email **support@medprep.app**.",
        )),
        _ => None,
    }
}

/// Markdown to HTML with tables and strikethrough enabled
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[derive(Serialize)]
struct PageResponse<'a> {
    status: &'static str,
    page: &'a StaticPage,
    html: String,
}

#[derive(Serialize)]
struct FallbackPage {
    title: &'static str,
    html: String,
}

#[derive(Serialize)]
struct NotFoundResponse<'a> {
    status: &'static str,
    slug: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback: Option<FallbackPage>,
}

/// GET /pages/{slug}
pub async fn handle_get_page(state: Arc<AppState>, slug: &str) -> Response<FullBody> {
    match state.store.get_page(slug).await {
        Ok(Some(page)) => {
            let html = render_markdown(&page.content);
            json_response(
                StatusCode::OK,
                &PageResponse {
                    status: "ok",
                    page: &page,
                    html,
                },
            )
        }
        Ok(None) => {
            debug!(slug, "Page not found");
            let fallback = fallback_content(slug).map(|(title, body)| FallbackPage {
                title,
                html: render_markdown(body),
            });
            json_response(
                StatusCode::NOT_FOUND,
                &NotFoundResponse {
                    status: "not_found",
                    slug,
                    fallback,
                },
            )
        }
        Err(e) => gateway_error_response(&e),
    }
}

/// PUT /admin/pages/{slug}; drops the navigation cache on success
pub async fn handle_put_page(state: Arc<AppState>, slug: &str, body: Bytes) -> Response<FullBody> {
    if slug.is_empty() || slug.contains('/') {
        return error_response(StatusCode::BAD_REQUEST, "Invalid page slug");
    }
    let page: NewPage = match parse_json(&body, &["title", "content"]) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    match state.store.upsert_page(slug, page).await {
        Ok(saved) => {
            state.navigation.invalidate().await;
            info!(slug, "Page saved, navigation invalidated");
            json_response(StatusCode::OK, &saved)
        }
        Err(e) => gateway_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{body_json, fixture};

    #[test]
    fn test_render_markdown() {
        let html = render_markdown("# Title\n\nSome **bold** text");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[tokio::test]
    async fn test_missing_page_is_404_not_500() {
        let fx = fixture();
        let resp = handle_get_page(fx.state.clone(), "privacy").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["fallback"]["title"], "Privacy Policy");

        let resp = handle_get_page(fx.state.clone(), "made-up").await;
        let json = body_json(resp).await;
        assert_eq!(json["status"], "not_found");
        assert!(json.get("fallback").is_none());
    }

    #[tokio::test]
    async fn test_saved_page_renders_html() {
        let fx = fixture();
        let resp = handle_put_page(
            fx.state.clone(),
            "about",
            Bytes::from_static(br#"{"title":"About","content":"We *teach*."}"#),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(handle_get_page(fx.state.clone(), "about").await).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["page"]["title"], "About");
        assert!(json["html"].as_str().unwrap().contains("<em>teach</em>"));
    }
}
