//! HTTP routes for MedGate
//!
//! Handlers take the already-collected request body and return a complete
//! response. Every response carries the CORS headers the browser client
//! needs to call the gateway directly.

pub mod engagement;
pub mod functions;
pub mod health;
pub mod navigation;
pub mod pages;
pub mod taxonomy;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::types::GatewayError;

pub use engagement::handle_engagement_request;
pub use functions::handle_function_request;
pub use health::health_check;
pub use navigation::{handle_navigation, handle_navigation_refresh};
pub use pages::{handle_get_page, handle_put_page};
pub use taxonomy::handle_taxonomy_request;

pub type FullBody = Full<Bytes>;

pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

fn with_cors(mut response: Response<FullBody>) -> Response<FullBody> {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    response
}

/// JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    match serde_json::to_vec(body) {
        Ok(json) => with_cors(
            Response::builder()
                .status(status)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from(json)))
                .unwrap(),
        ),
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serialize response")
        }
    }
}

/// `{"error": message}`
pub fn error_response(status: StatusCode, message: &str) -> Response<FullBody> {
    let body = serde_json::json!({ "error": message });
    with_cors(
        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap(),
    )
}

/// Map a request-scoped error to its status and `{error}` body
pub fn gateway_error_response(err: &GatewayError) -> Response<FullBody> {
    let status = err.status_code();
    if status.is_server_error() {
        error!(error = %err, "Request failed");
    }
    error_response(status, &err.to_string())
}

pub fn xml_response(content_type: &str, xml: String) -> Response<FullBody> {
    with_cors(
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", content_type)
            .header("Cache-Control", "public, max-age=3600")
            .body(Full::new(Bytes::from(xml)))
            .unwrap(),
    )
}

/// 303 See Other
pub fn redirect_response(location: &str) -> Response<FullBody> {
    with_cors(
        Response::builder()
            .status(StatusCode::SEE_OTHER)
            .header("Location", location)
            .body(Full::new(Bytes::new()))
            .unwrap(),
    )
}

pub fn no_content_response() -> Response<FullBody> {
    with_cors(
        Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Full::new(Bytes::new()))
            .unwrap(),
    )
}

/// Parse a JSON body after checking that every `required` key is present
///
/// Invalid JSON, a missing or null required key, and a type mismatch all
/// become 400 responses.
pub fn parse_json<T: DeserializeOwned>(
    body: &Bytes,
    required: &[&str],
) -> Result<T, Response<FullBody>> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid JSON body"))?;

    for field in required {
        let present = value.get(field).map(|v| !v.is_null()).unwrap_or(false);
        if !present {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                &format!("Missing required field: {}", field),
            ));
        }
    }

    serde_json::from_value(value).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, &format!("Invalid request body: {}", e))
    })
}

/// First value of `key` in a raw query string
pub fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    let query = query?;
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .ok()?
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

/// Parse a path segment as a UUID or answer 400
pub fn parse_id(raw: &str) -> Result<uuid::Uuid, Response<FullBody>> {
    uuid::Uuid::parse_str(raw)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, &format!("Invalid id: {}", raw)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::ai::MockProvider;
    use crate::db::MemoryStore;
    use crate::server::AppState;
    use crate::services::{MemoryUserAdmin, MockEmailSender, MockPayments};
    use crate::Args;
    use clap::Parser;

    pub struct Fixture {
        pub state: Arc<AppState>,
        pub store: Arc<MemoryStore>,
        pub matcher: Arc<MockProvider>,
        pub generator: Arc<MockProvider>,
        pub payments: Arc<MockPayments>,
        pub email: Arc<MockEmailSender>,
        pub users: Arc<MemoryUserAdmin>,
    }

    pub fn fixture_with(matcher: MockProvider, generator: MockProvider) -> Fixture {
        let args = Args::parse_from([
            "medgate",
            "--dev-mode",
            "--site-url",
            "https://medprep.app",
            "--feedback-notify-email",
            "admin@medprep.app",
        ]);
        let store = Arc::new(MemoryStore::new());
        let matcher = Arc::new(matcher);
        let generator = Arc::new(generator);
        let payments = Arc::new(MockPayments::default());
        let email = Arc::new(MockEmailSender::default());
        let users = Arc::new(MemoryUserAdmin::new());
        let state = Arc::new(AppState::with_services(
            args,
            store.clone(),
            matcher.clone(),
            generator.clone(),
            payments.clone(),
            email.clone(),
            users.clone(),
        ));
        Fixture {
            state,
            store,
            matcher,
            generator,
            payments,
            email,
            users,
        }
    }

    pub fn fixture() -> Fixture {
        fixture_with(MockProvider::new(), MockProvider::new())
    }

    pub async fn body_json(resp: hyper::Response<super::FullBody>) -> serde_json::Value {
        use http_body_util::BodyExt;
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub async fn body_text(resp: hyper::Response<super::FullBody>) -> String {
        use http_body_util::BodyExt;
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Body {
        user_id: String,
    }

    #[test]
    fn test_missing_required_field_is_400() {
        let resp = parse_json::<Body>(&Bytes::from_static(b"{}"), &["userId"]).unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp =
            parse_json::<Body>(&Bytes::from_static(b"{\"userId\":null}"), &["userId"]).unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let ok = parse_json::<Body>(&Bytes::from_static(b"{\"userId\":\"u\"}"), &["userId"]);
        assert_eq!(ok.ok().map(|b| b.user_id).as_deref(), Some("u"));
    }

    #[test]
    fn test_invalid_json_is_400() {
        let resp = parse_json::<Body>(&Bytes::from_static(b"{not json"), &[]).unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_query_param_decodes() {
        assert_eq!(
            query_param(Some("user_id=abc%20d&x=1"), "user_id").as_deref(),
            Some("abc d")
        );
        assert_eq!(query_param(None, "user_id"), None);
    }

    #[test]
    fn test_every_response_has_cors() {
        let resp = error_response(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
    }
}
