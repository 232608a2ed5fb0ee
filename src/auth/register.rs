use axum::{Json, debug_handler, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::info;

use crate::{AppError, AppResult};

use super::{create_user, hash_password, user_id_by_email};

#[derive(Deserialize)]
pub(crate) struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    Json(body): Json<RegisterBody>,
) -> AppResult<Json<Value>> {
    if user_id_by_email(&db_pool, &body.email).await?.is_some() {
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash_password(&body.password)?;
    let user_id = create_user(&db_pool, &body.name, &body.email, &password_hash).await?;
    info!(user_id, "user registered");

    Ok(Json(json!({ "message": "user registered" })))
}
