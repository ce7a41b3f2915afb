// Shared error type for the HTTP surface

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::directory::DirectoryError;
use crate::speech::SpeechError;
use crate::wallet::WalletError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Wallet service error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Speech service error: {0}")]
    Speech(#[from] SpeechError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Wallet(_) | AppError::Speech(_) => StatusCode::BAD_GATEWAY,
            AppError::Directory(DirectoryError::UsernameTaken(_)) => StatusCode::CONFLICT,
            AppError::Directory(DirectoryError::InvalidUsername(_)) => StatusCode::BAD_REQUEST,
            AppError::Directory(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            AppError::Wallet(_) => "Wallet service request failed",
            AppError::Speech(_) => "Speech service request failed",
            AppError::Directory(DirectoryError::UsernameTaken(_)) => "Conflict",
            AppError::Directory(DirectoryError::InvalidUsername(_)) => "Invalid request",
            AppError::Directory(_) => "User directory unavailable",
            AppError::Auth(_) => "Authentication failed",
            AppError::InvalidRequest(_) => "Invalid request",
            AppError::RateLimited => "Too many requests",
            AppError::Internal(_) => "Internal error",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::InvalidRequest(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("token signing failed: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (
            status,
            Json(serde_json::json!({
                "error": self.summary(),
                "details": self.to_string(),
            })),
        )
            .into_response()
    }
}
