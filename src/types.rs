//! Shared error and result types

use hyper::StatusCode;

/// Top-level error for every request-scoped operation
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or malformed request fields
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A row the operation depends on is absent from the database
    #[error("{0} not found")]
    MissingRow(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("AI provider error: {0}")]
    Ai(#[from] crate::ai::AiError),

    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("Email provider error: {0}")]
    Email(String),

    #[error("Auth admin error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status this error surfaces as
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Internal(format!("HTTP client error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
