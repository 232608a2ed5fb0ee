pub mod auth;
pub mod chats;
pub mod db;
pub mod messages;
pub mod realtime;

use axum::{
    Json,
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::realtime::ConnectionRegistry;

pub type UserId = i64;
pub type ChatId = i64;
pub type MessageId = i64;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub registry: ConnectionRegistry,
}

pub type AppResult<T> = Result<T, AppError>;

/// Every failure the handlers and the realtime core can report, one named
/// kind per outcome so callers match on the variant instead of probing
/// payload shapes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not a member of this chat")]
    AdmissionDenied,
    #[error("message already sent")]
    DuplicateMessage,
    #[error("message not found")]
    MessageNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("chat not found")]
    ChatNotFound,
    #[error("email already registered")]
    EmailTaken,
    #[error("wrong email or password")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::AdmissionDenied => StatusCode::FORBIDDEN,
            AppError::DuplicateMessage | AppError::EmailTaken | AppError::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            AppError::MessageNotFound | AppError::UserNotFound | AppError::ChatNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Store(_) | AppError::PasswordHash(_) | AppError::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
