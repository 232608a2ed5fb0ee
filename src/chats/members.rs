use axum::{
    Json, debug_handler,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::info;

use crate::{AppError, AppResult, ChatId, UserId, auth};

/// Membership check used both for websocket admission and for computing
/// fan-out recipient sets.
pub async fn is_member(
    db_pool: &SqlitePool,
    chat_id: ChatId,
    user_id: UserId,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM chat_members WHERE chat_id=? AND user_id=?")
            .bind(chat_id)
            .bind(user_id)
            .fetch_optional(db_pool)
            .await?;
    Ok(row.is_some())
}

pub async fn list_member_ids(
    db_pool: &SqlitePool,
    chat_id: ChatId,
) -> Result<Vec<UserId>, sqlx::Error> {
    let rows: Vec<(UserId,)> = sqlx::query_as("SELECT user_id FROM chat_members WHERE chat_id=?")
        .bind(chat_id)
        .fetch_all(db_pool)
        .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

#[derive(Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct Member {
    pub id: UserId,
    pub name: String,
}

pub async fn list_members(
    db_pool: &SqlitePool,
    chat_id: ChatId,
) -> Result<Vec<Member>, sqlx::Error> {
    sqlx::query_as(
        "SELECT users.id, users.name FROM users \
         JOIN chat_members ON users.id = chat_members.user_id \
         WHERE chat_members.chat_id=?",
    )
    .bind(chat_id)
    .fetch_all(db_pool)
    .await
}

/// Adding a member who is already in the chat is reported, not an error.
pub async fn add_member(
    db_pool: &SqlitePool,
    chat_id: ChatId,
    user_id: UserId,
) -> AppResult<bool> {
    let chat: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM chats WHERE id=?")
        .bind(chat_id)
        .fetch_optional(db_pool)
        .await?;
    if chat.is_none() {
        return Err(AppError::ChatNotFound);
    }
    if !auth::user_exists(db_pool, user_id).await? {
        return Err(AppError::UserNotFound);
    }
    if is_member(db_pool, chat_id, user_id).await? {
        return Ok(false);
    }

    sqlx::query("INSERT INTO chat_members (chat_id,user_id) VALUES (?,?)")
        .bind(chat_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    info!(chat_id, user_id, "member added");
    Ok(true)
}

#[derive(Deserialize)]
pub(crate) struct AddMemberQuery {
    user_id: UserId,
}

#[debug_handler]
pub(crate) async fn add_member_handler(
    Path(chat_id): Path<ChatId>,
    Query(AddMemberQuery { user_id }): Query<AddMemberQuery>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Value>> {
    let added = add_member(&db_pool, chat_id, user_id).await?;
    let message = if added {
        format!("user {user_id} added to chat {chat_id}")
    } else {
        "user is already in this chat".to_owned()
    };
    Ok(Json(json!({ "message": message })))
}

#[debug_handler]
pub(crate) async fn list_members_handler(
    Path(chat_id): Path<ChatId>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Value>> {
    let members = list_members(&db_pool, chat_id).await?;
    Ok(Json(json!({ "chat_id": chat_id, "members": members })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth, chats, db};

    async fn seed_user(db_pool: &SqlitePool, name: &str) -> UserId {
        auth::create_user(db_pool, name, &format!("{name}@example.com"), "hash")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn membership_round_trip() {
        let db_pool = db::connect_memory().await.unwrap();
        let alice = seed_user(&db_pool, "alice").await;
        let bob = seed_user(&db_pool, "bob").await;
        let chat_id = chats::create_chat(&db_pool, "test", "group").await.unwrap();

        assert!(add_member(&db_pool, chat_id, alice).await.unwrap());
        assert!(add_member(&db_pool, chat_id, bob).await.unwrap());
        // repeat add is a reported no-op
        assert!(!add_member(&db_pool, chat_id, bob).await.unwrap());

        assert!(is_member(&db_pool, chat_id, alice).await.unwrap());
        assert!(!is_member(&db_pool, chat_id, 999).await.unwrap());

        let mut ids = list_member_ids(&db_pool, chat_id).await.unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![alice, bob]);
    }

    #[tokio::test]
    async fn add_member_rejects_unknown_chat_and_user() {
        let db_pool = db::connect_memory().await.unwrap();
        let alice = seed_user(&db_pool, "alice").await;
        let chat_id = chats::create_chat(&db_pool, "test", "group").await.unwrap();

        assert!(matches!(
            add_member(&db_pool, 999, alice).await,
            Err(AppError::ChatNotFound)
        ));
        assert!(matches!(
            add_member(&db_pool, chat_id, 999).await,
            Err(AppError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn list_members_includes_names() {
        let db_pool = db::connect_memory().await.unwrap();
        let alice = seed_user(&db_pool, "alice").await;
        let chat_id = chats::create_chat(&db_pool, "test", "private").await.unwrap();
        add_member(&db_pool, chat_id, alice).await.unwrap();

        let members = list_members(&db_pool, chat_id).await.unwrap();
        assert_eq!(
            members,
            vec![Member {
                id: alice,
                name: "alice".to_owned()
            }]
        );
    }
}
