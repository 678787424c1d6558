//! MedGate - edge-function gateway for the medical exam study platform

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use medgate::{config::Args, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    let log_json = args.log_json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("medgate={},info", log_level).into()),
        )
        .with(log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  MedGate - study platform gateway");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!(
        "Supabase: {}",
        args.supabase.supabase_url.as_deref().unwrap_or("(in-memory)")
    );
    info!("Matcher model: {} ({})", args.ai.openai_model, args.ai.openai_base_url);
    info!("Generator model: {} ({})", args.ai.gemini_model, args.ai.gemini_base_url);
    info!("Stripe: {}", configured(args.stripe_secret_key.is_some()));
    info!("Resend: {}", configured(args.resend_api_key.is_some()));
    info!("Site URL: {}", args.site_base());
    info!("======================================");

    let state = Arc::new(AppState::from_args(args)?);
    server::run(state).await?;

    Ok(())
}

fn configured(present: bool) -> &'static str {
    if present {
        "configured"
    } else {
        "not configured"
    }
}
