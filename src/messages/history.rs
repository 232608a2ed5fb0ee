use axum::{
    Json, debug_handler,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{AppResult, ChatId};

use super::store::{self, Message};

#[derive(Deserialize)]
pub(crate) struct HistoryQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

#[debug_handler]
pub(crate) async fn chat_history(
    Path(chat_id): Path<ChatId>,
    Query(HistoryQuery { limit, offset }): Query<HistoryQuery>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Vec<Message>>> {
    let messages = store::history(
        &db_pool,
        chat_id,
        limit.unwrap_or(10),
        offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(messages))
}
