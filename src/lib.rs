//! MedGate - edge-function gateway for the medical exam study platform
//!
//! MedGate hosts the privileged, stateless request handlers that the browser
//! client cannot run with its anonymous key: AI-assisted content jobs,
//! subscription billing, user administration, and the public XML feeds.
//!
//! ## Services
//!
//! - **Functions**: `/functions/v1/*` edge handlers (JSON in, JSON out)
//! - **Pipelines**: bulk topic matching and topic-content generation
//! - **Billing**: trial activation, Stripe checkout and cancellation
//! - **Content**: static pages, navigation links, taxonomy and engagement rows
//! - **Feeds**: sitemap.xml and RSS 2.0

pub mod ai;
pub mod cache;
pub mod config;
pub mod db;
pub mod feeds;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatewayError, Result};
