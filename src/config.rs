//! Configuration for MedGate
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Upper bound for the navigation cache TTL (one day)
pub const MAX_NAV_CACHE_TTL_SECS: u64 = 86_400;

/// MedGate - edge-function gateway for the medical exam study platform
#[derive(Parser, Debug, Clone)]
#[command(name = "medgate")]
#[command(about = "Privileged edge functions for the medical exam study platform")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory store, external keys optional)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Supabase project configuration
    #[command(flatten)]
    pub supabase: SupabaseArgs,

    /// AI provider configuration
    #[command(flatten)]
    pub ai: AiArgs,

    /// Stripe secret key
    #[arg(long, env = "STRIPE_SECRET_KEY")]
    pub stripe_secret_key: Option<String>,

    /// Stripe API base URL
    #[arg(long, env = "STRIPE_BASE_URL", default_value = "https://api.stripe.com/v1")]
    pub stripe_base_url: String,

    /// Resend API key
    #[arg(long, env = "RESEND_API_KEY")]
    pub resend_api_key: Option<String>,

    /// Sender address for outgoing email
    #[arg(long, env = "RESEND_FROM", default_value = "MedPrep <noreply@medprep.app>")]
    pub resend_from: String,

    /// Recipient notified when a user submits feedback
    #[arg(long, env = "FEEDBACK_NOTIFY_EMAIL")]
    pub feedback_notify_email: Option<String>,

    /// Resend API base URL
    #[arg(long, env = "RESEND_BASE_URL", default_value = "https://api.resend.com")]
    pub resend_base_url: String,

    /// Public base URL of the web client (redirects, sitemap, RSS links)
    #[arg(long, env = "SITE_URL", default_value = "http://localhost:5173")]
    pub site_url: String,

    /// Outbound HTTP request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Navigation link cache TTL in seconds
    #[arg(long, env = "NAV_CACHE_TTL_SECS", default_value = "300")]
    pub nav_cache_ttl_secs: u64,
}

/// Supabase connection configuration
#[derive(Parser, Debug, Clone)]
pub struct SupabaseArgs {
    /// Supabase project URL (e.g. https://xyz.supabase.co)
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Anonymous (public) API key
    #[arg(long, env = "SUPABASE_ANON_KEY")]
    pub supabase_anon_key: Option<String>,

    /// Service-role key (bypasses row-level security)
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY")]
    pub supabase_service_role_key: Option<String>,
}

/// AI provider configuration
#[derive(Parser, Debug, Clone)]
pub struct AiArgs {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// OpenAI model used for matching and blog generation
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-mini")]
    pub openai_model: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[arg(
        long,
        env = "GEMINI_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    pub gemini_base_url: String,

    /// Gemini model used for topic-content generation
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    pub gemini_model: String,
}

impl Args {
    /// Outbound request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Navigation cache TTL
    pub fn nav_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.nav_cache_ttl_secs)
    }

    /// Site URL without a trailing slash
    pub fn site_base(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.supabase.supabase_url.is_none() {
                return Err("SUPABASE_URL is required in production mode".to_string());
            }
            if self.supabase.supabase_anon_key.is_none() {
                return Err("SUPABASE_ANON_KEY is required in production mode".to_string());
            }
            if self.supabase.supabase_service_role_key.is_none() {
                return Err(
                    "SUPABASE_SERVICE_ROLE_KEY is required in production mode".to_string(),
                );
            }
        }

        if !self.site_url.starts_with("http://") && !self.site_url.starts_with("https://") {
            return Err("SITE_URL must be an http(s) URL".to_string());
        }

        if self.nav_cache_ttl_secs > MAX_NAV_CACHE_TTL_SECS {
            return Err(format!(
                "NAV_CACHE_TTL_SECS must be at most {}",
                MAX_NAV_CACHE_TTL_SECS
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["medgate"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_dev_mode_needs_no_keys() {
        let args = parse(&["--dev-mode", "--site-url", "https://medprep.app/"]);
        assert!(args.validate().is_ok());
        assert_eq!(args.site_base(), "https://medprep.app");
    }

    #[test]
    fn test_production_requires_service_role_key() {
        let args = parse(&[
            "--supabase-url",
            "https://x.supabase.co",
            "--supabase-anon-key",
            "anon",
        ]);
        let err = args.validate().unwrap_err();
        assert!(err.contains("SUPABASE_SERVICE_ROLE_KEY"));
    }

    #[test]
    fn test_rejects_oversized_nav_cache_ttl() {
        let args = parse(&["--dev-mode", "--nav-cache-ttl-secs", "18446744073709551615"]);
        let err = args.validate().unwrap_err();
        assert!(err.contains("NAV_CACHE_TTL_SECS"));

        let args = parse(&["--dev-mode", "--nav-cache-ttl-secs", "86400"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_json_flag() {
        assert!(!parse(&["--dev-mode"]).log_json);
        assert!(parse(&["--dev-mode", "--log-json"]).log_json);
    }

    #[test]
    fn test_rejects_non_http_site_url() {
        let args = parse(&["--dev-mode", "--site-url", "medprep.app"]);
        assert!(args.validate().is_err());
    }
}
