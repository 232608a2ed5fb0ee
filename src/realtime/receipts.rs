use sqlx::SqlitePool;
use tracing::debug;

use crate::messages::store;
use crate::{AppResult, MessageId, UserId};

use super::{ConnectionRegistry, Notice};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadOutcome {
    /// This reader had already acknowledged this message.
    AlreadyRead,
    /// Acknowledged, but some required readers are still missing.
    Partial { read: i64, required: i64 },
    /// Every member except the sender has now read the message.
    FullyRead,
}

/// Records one read acknowledgement and decides whether the message just
/// became fully read. The read-mark insert is idempotent, and the final
/// flag flip is a conditional update, so concurrent acknowledgements for
/// the same message can both observe a complete count but only the call
/// that wins the flip notifies the sender.
pub async fn mark_read(
    db_pool: &SqlitePool,
    registry: &ConnectionRegistry,
    message_id: MessageId,
    reader_id: UserId,
) -> AppResult<ReadOutcome> {
    let message = store::get_message(db_pool, message_id).await?;

    if store::has_read_mark(db_pool, message_id, reader_id).await? {
        return Ok(ReadOutcome::AlreadyRead);
    }
    store::insert_read_mark(db_pool, message_id, reader_id).await?;

    let required = store::count_required_readers(db_pool, message.chat_id, message.sender_id).await?;
    let read = store::count_read_marks(db_pool, message_id).await?;
    debug!(message_id, read, required, "read progress");

    if read == required {
        if store::set_fully_read(db_pool, message_id).await? {
            registry
                .send_to_user(message.sender_id, Notice::FullyRead { message_id }.to_string())
                .await;
        }
        return Ok(ReadOutcome::FullyRead);
    }
    Ok(ReadOutcome::Partial { read, required })
}
