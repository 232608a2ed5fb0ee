use axum::{
    Json, debug_handler,
    extract::{Path, State},
    http::HeaderMap,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::realtime::{ConnectionRegistry, receipts};
use crate::{AppError, AppResult, MessageId, auth};

/// Read acknowledgement. The reader is identified by their bearer token,
/// not by a path parameter, so a client can only mark reads as itself.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn mark_message_read(
    Path(message_id): Path<MessageId>,
    State(db_pool): State<SqlitePool>,
    State(registry): State<ConnectionRegistry>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    let email = auth::bearer_email(&headers)?;
    let reader_id = auth::user_id_by_email(&db_pool, &email)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let outcome = receipts::mark_read(&db_pool, &registry, message_id, reader_id).await?;
    let message = match outcome {
        receipts::ReadOutcome::AlreadyRead => {
            format!("message {message_id} already read by user {reader_id}")
        }
        receipts::ReadOutcome::Partial { .. } => {
            format!("user {reader_id} marked message {message_id} as read")
        }
        receipts::ReadOutcome::FullyRead => format!("message {message_id} fully read"),
    };
    Ok(Json(json!({ "message": message })))
}
