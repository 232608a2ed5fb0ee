use serde::Serialize;
use sqlx::SqlitePool;

use crate::{AppError, AppResult, ChatId, MessageId, UserId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub text: String,
    pub created_at: String,
    pub fully_read: bool,
}

/// Inserts a message, rejecting a resend of the same text by the same
/// sender into the same chat. The pre-check catches the common case; the
/// unique constraint on (chat_id, sender_id, text, created_at) backstops
/// concurrent inserts of identical content landing in the same timestamp
/// bucket.
pub async fn create_message(
    db_pool: &SqlitePool,
    chat_id: ChatId,
    sender_id: UserId,
    text: &str,
) -> AppResult<Message> {
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM messages WHERE chat_id=? AND sender_id=? AND text=?")
            .bind(chat_id)
            .bind(sender_id)
            .bind(text)
            .fetch_optional(db_pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::DuplicateMessage);
    }

    let result = sqlx::query("INSERT INTO messages (chat_id,sender_id,text) VALUES (?,?,?)")
        .bind(chat_id)
        .bind(sender_id)
        .bind(text)
        .execute(db_pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateMessage
            }
            _ => AppError::Store(err),
        })?;

    get_message(db_pool, result.last_insert_rowid()).await
}

pub async fn get_message(db_pool: &SqlitePool, message_id: MessageId) -> AppResult<Message> {
    sqlx::query_as("SELECT id,chat_id,sender_id,text,created_at,fully_read FROM messages WHERE id=?")
        .bind(message_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(AppError::MessageNotFound)
}

pub async fn history(
    db_pool: &SqlitePool,
    chat_id: ChatId,
    limit: i64,
    offset: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id,chat_id,sender_id,text,created_at,fully_read FROM messages \
         WHERE chat_id=? ORDER BY created_at, id LIMIT ? OFFSET ?",
    )
    .bind(chat_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db_pool)
    .await
}

pub async fn has_read_mark(
    db_pool: &SqlitePool,
    message_id: MessageId,
    user_id: UserId,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM message_readers WHERE message_id=? AND user_id=?")
            .bind(message_id)
            .bind(user_id)
            .fetch_optional(db_pool)
            .await?;
    Ok(row.is_some())
}

/// Idempotent: re-inserting an existing (message, reader) pair is a no-op.
pub async fn insert_read_mark(
    db_pool: &SqlitePool,
    message_id: MessageId,
    user_id: UserId,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO message_readers (message_id,user_id) VALUES (?,?)")
        .bind(message_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn count_read_marks(
    db_pool: &SqlitePool,
    message_id: MessageId,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM message_readers WHERE message_id=?")
        .bind(message_id)
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}

/// How many members have to read a message before it counts as fully
/// read: everyone in the chat except the sender.
pub async fn count_required_readers(
    db_pool: &SqlitePool,
    chat_id: ChatId,
    sender_id: UserId,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM chat_members WHERE chat_id=? AND user_id != ?")
            .bind(chat_id)
            .bind(sender_id)
            .fetch_one(db_pool)
            .await?;
    Ok(count)
}

/// Conditional flip of the monotonic fully_read flag. Returns true only
/// for the caller whose update actually changed the row, so concurrent
/// completions cannot both claim the transition.
pub async fn set_fully_read(
    db_pool: &SqlitePool,
    message_id: MessageId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE messages SET fully_read=1 WHERE id=? AND fully_read=0")
        .bind(message_id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() == 1)
}
