use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::info;

use crate::{AppResult, ChatId};

#[derive(Deserialize)]
pub(crate) struct ChatBody {
    name: String,
    /// "private" or "group"
    chat_type: String,
}

pub async fn create_chat(
    db_pool: &SqlitePool,
    name: &str,
    chat_type: &str,
) -> Result<ChatId, sqlx::Error> {
    let result = sqlx::query("INSERT INTO chats (name,chat_type) VALUES (?,?)")
        .bind(name)
        .bind(chat_type)
        .execute(db_pool)
        .await?;
    Ok(result.last_insert_rowid())
}

#[debug_handler]
pub(crate) async fn create_chat_handler(
    State(db_pool): State<SqlitePool>,
    Json(body): Json<ChatBody>,
) -> AppResult<Json<Value>> {
    let chat_id = create_chat(&db_pool, &body.name, &body.chat_type).await?;
    info!(chat_id, chat_type = %body.chat_type, "chat created");
    Ok(Json(json!({ "message": "chat created", "chat_id": chat_id })))
}
