use axum::{Router, routing::post};
use sqlx::SqlitePool;

use crate::{AppState, UserId};

mod claims;
mod login;
mod password;
mod register;

pub use claims::{Claims, bearer_email, create_access_token, decode_token};
pub use password::{hash_password, verify_password};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register::register))
        .route("/token", post(login::token))
}

pub async fn create_user(
    db_pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<UserId, sqlx::Error> {
    let result = sqlx::query("INSERT INTO users (name,email,password) VALUES (?,?,?)")
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .execute(db_pool)
        .await?;
    Ok(result.last_insert_rowid())
}

pub async fn user_id_by_email(
    db_pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserId>, sqlx::Error> {
    let row: Option<(UserId,)> = sqlx::query_as("SELECT id FROM users WHERE email=?")
        .bind(email)
        .fetch_optional(db_pool)
        .await?;
    Ok(row.map(|(id,)| id))
}

pub(crate) async fn user_exists(db_pool: &SqlitePool, user_id: UserId) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id=?")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(row.is_some())
}
