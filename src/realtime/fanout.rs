use sqlx::SqlitePool;
use tracing::debug;

use crate::messages::store::{self, Message};
use crate::{AppError, AppResult, ChatId, UserId, chats};

use super::{ConnectionRegistry, Notice};

#[derive(Debug)]
pub enum RouteOutcome {
    Delivered(Message),
    /// Duplicate content; the sender was told, peers were not.
    Rejected,
}

/// Persists one inbound message and fans it out: every other member gets
/// a new-message notice, the sender gets a confirmation. Membership is a
/// snapshot read, not transactional with the insert; a member joining or
/// leaving mid-send may be missed or over-notified, which is accepted.
/// Pushes are independent and unordered, and their failures never reach
/// the sender.
pub async fn route(
    db_pool: &SqlitePool,
    registry: &ConnectionRegistry,
    chat_id: ChatId,
    sender_id: UserId,
    text: &str,
) -> AppResult<RouteOutcome> {
    let message = match store::create_message(db_pool, chat_id, sender_id, text).await {
        Ok(message) => message,
        Err(AppError::DuplicateMessage) => {
            registry
                .send_to_user(sender_id, Notice::DuplicateRejected.to_string())
                .await;
            return Ok(RouteOutcome::Rejected);
        }
        Err(err) => return Err(err),
    };

    let members = chats::members::list_member_ids(db_pool, chat_id).await?;
    for member_id in members {
        if member_id == sender_id {
            continue;
        }
        registry
            .send_to_user(
                member_id,
                Notice::NewMessage {
                    sender_id,
                    text: text.to_owned(),
                }
                .to_string(),
            )
            .await;
    }

    registry
        .send_to_user(
            sender_id,
            Notice::Delivered {
                text: text.to_owned(),
            }
            .to_string(),
        )
        .await;

    debug!(message_id = message.id, chat_id, sender_id, "message fanned out");
    Ok(RouteOutcome::Delivered(message))
}
