//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. Requests are routed
//! on `(method, path)`; bodies are collected up front because every handler
//! needs the whole JSON document.

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::ai::{CompletionProvider, GeminiProvider, OpenAiProvider};
use crate::cache::NavigationCache;
use crate::config::Args;
use crate::db::{ContentStore, MemoryStore, SupabaseClient, SupabaseStore};
use crate::routes::{self, functions::FUNCTIONS_PREFIX, FullBody};
use crate::services::{
    EmailSender, MemoryUserAdmin, PaymentProvider, ResendClient, StripeClient, SupabaseAuthAdmin,
    UserAdmin,
};
use crate::types::{GatewayError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Database access (Supabase, or in-memory in dev mode)
    pub store: Arc<dyn ContentStore>,
    /// Model used for topic matching and blog drafts
    pub matcher: Arc<dyn CompletionProvider>,
    /// Model used for topic-content generation
    pub generator: Arc<dyn CompletionProvider>,
    pub payments: Arc<dyn PaymentProvider>,
    pub email: Arc<dyn EmailSender>,
    pub users: Arc<dyn UserAdmin>,
    pub navigation: NavigationCache,
    pub started_at: Instant,
}

impl AppState {
    /// Wire real integrations from configuration
    ///
    /// Without `SUPABASE_URL` in dev mode the store and user admin are
    /// in-memory. Provider clients are always built; a missing key surfaces
    /// as an error on first use, not at startup.
    pub fn from_args(args: Args) -> Result<Self> {
        let timeout = args.request_timeout();

        let (store, users): (Arc<dyn ContentStore>, Arc<dyn UserAdmin>) =
            if args.dev_mode && args.supabase.supabase_url.is_none() {
                warn!("No SUPABASE_URL in dev mode - using in-memory store");
                (Arc::new(MemoryStore::new()), Arc::new(MemoryUserAdmin::new()))
            } else {
                let client = SupabaseClient::from_args(&args)?;
                (
                    Arc::new(SupabaseStore::new(client.clone())),
                    Arc::new(SupabaseAuthAdmin::new(client)),
                )
            };

        let ai = &args.ai;
        let matcher = Arc::new(OpenAiProvider::new(
            ai.openai_base_url.clone(),
            ai.openai_model.clone(),
            ai.openai_api_key.clone(),
            timeout,
        ));
        let generator = Arc::new(GeminiProvider::new(
            ai.gemini_base_url.clone(),
            ai.gemini_model.clone(),
            ai.gemini_api_key.clone(),
            timeout,
        ));
        let payments = Arc::new(StripeClient::new(
            args.stripe_base_url.clone(),
            args.stripe_secret_key.clone(),
            timeout,
        ));
        let email = Arc::new(ResendClient::new(
            args.resend_base_url.clone(),
            args.resend_api_key.clone(),
            args.resend_from.clone(),
            timeout,
        ));

        Ok(Self::with_services(
            args, store, matcher, generator, payments, email, users,
        ))
    }

    /// Assemble state from already-built services
    pub fn with_services(
        args: Args,
        store: Arc<dyn ContentStore>,
        matcher: Arc<dyn CompletionProvider>,
        generator: Arc<dyn CompletionProvider>,
        payments: Arc<dyn PaymentProvider>,
        email: Arc<dyn EmailSender>,
        users: Arc<dyn UserAdmin>,
    ) -> Self {
        let navigation = NavigationCache::new(args.nav_cache_ttl());
        Self {
            args,
            store,
            matcher,
            generator,
            payments,
            email,
            users,
            navigation,
            started_at: Instant::now(),
        }
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listen = state.args.listen;
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| GatewayError::Config(format!("Failed to bind {}: {}", listen, e)))?;

    info!("MedGate listening on {}", state.args.listen);
    info!(
        matcher = state.matcher.name(),
        generator = state.generator.name(),
        nav_ttl_secs = state.args.nav_cache_ttl_secs,
        "Edge functions available at {}*",
        FUNCTIONS_PREFIX
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - external keys are optional");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move {
                            Ok::<_, std::convert::Infallible>(
                                handle_request(state, addr, req).await,
                            )
                        }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Route one request
///
/// Generic over the body so tests can drive the router with `Full<Bytes>`.
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> Response<FullBody>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    info!("[{}] {} {}", addr, method, path);

    // CORS preflight never reads the body
    if method == Method::OPTIONS {
        return routes::no_content_response();
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!(error = %e, "Failed to read request body");
            return routes::error_response(StatusCode::BAD_REQUEST, "Invalid body");
        }
    };
    let query = query.as_deref();

    if let Some(name) = path.strip_prefix(FUNCTIONS_PREFIX) {
        return routes::handle_function_request(state, method, name, query, body).await;
    }

    if let Some(response) = routes::handle_taxonomy_request(
        Arc::clone(&state),
        method.clone(),
        &path,
        query,
        body.clone(),
    )
    .await
    {
        return response;
    }

    if let Some(response) = routes::handle_engagement_request(
        Arc::clone(&state),
        method.clone(),
        &path,
        query,
        body.clone(),
    )
    .await
    {
        return response;
    }

    match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(state).await,

        (Method::GET, "/navigation") => routes::handle_navigation(state).await,
        (Method::POST, "/navigation/refresh") => routes::handle_navigation_refresh(state).await,

        (Method::GET, p) if p.starts_with("/pages/") => {
            let slug = p.trim_start_matches("/pages/");
            routes::handle_get_page(state, slug).await
        }
        (Method::PUT, p) if p.starts_with("/admin/pages/") => {
            let slug = p.trim_start_matches("/admin/pages/");
            routes::handle_put_page(state, slug, body).await
        }

        _ => not_found_response(&path),
    }
}

fn not_found_response(path: &str) -> Response<FullBody> {
    routes::json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "error": "Not Found",
            "path": path,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{body_json, fixture};
    use http_body_util::Full;

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    fn addr() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    #[tokio::test]
    async fn test_preflight_is_204_with_cors() {
        let fx = fixture();
        let resp = handle_request(
            fx.state.clone(),
            addr(),
            request(Method::OPTIONS, "/functions/v1/link-topics", ""),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
        assert!(resp
            .headers()
            .get("Access-Control-Allow-Headers")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("authorization"));
    }

    #[tokio::test]
    async fn test_routes_reach_handlers() {
        let fx = fixture();

        let resp =
            handle_request(fx.state.clone(), addr(), request(Method::GET, "/health", "")).await;
        assert_eq!(body_json(resp).await["healthy"], true);

        let resp = handle_request(
            fx.state.clone(),
            addr(),
            request(Method::POST, "/functions/v1/activate-trial", "{}"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = handle_request(
            fx.state.clone(),
            addr(),
            request(Method::GET, "/pages/terms", ""),
        )
        .await;
        assert_eq!(body_json(resp).await["status"], "not_found");

        let resp = handle_request(
            fx.state.clone(),
            addr(),
            request(Method::GET, "/admin/video-groups", ""),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_page_write_invalidates_navigation() {
        let fx = fixture();
        let nav =
            handle_request(fx.state.clone(), addr(), request(Method::GET, "/navigation", "")).await;
        assert_eq!(body_json(nav).await["links"].as_array().unwrap().len(), 0);

        let resp = handle_request(
            fx.state.clone(),
            addr(),
            request(
                Method::PUT,
                "/admin/pages/contact",
                r#"{"title":"Contact","content":"Email us"}"#,
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let nav =
            handle_request(fx.state.clone(), addr(), request(Method::GET, "/navigation", "")).await;
        assert_eq!(body_json(nav).await["links"][0]["slug"], "contact");
    }

    #[tokio::test]
    async fn test_cancel_subscription_query_is_passed_through() {
        let fx = fixture();
        let resp = handle_request(
            fx.state.clone(),
            addr(),
            request(
                Method::GET,
                "/functions/v1/cancel-subscription?user_id=not-a-uuid",
                "",
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let fx = fixture();
        let resp =
            handle_request(fx.state.clone(), addr(), request(Method::GET, "/nope", "")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["path"], "/nope");
    }
}
