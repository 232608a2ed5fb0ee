use axum::{Form, Json, debug_handler, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{AppError, AppResult, UserId};

use super::{create_access_token, verify_password};

/// Same field names as an OAuth2 password grant form.
#[derive(Deserialize)]
pub(crate) struct TokenForm {
    username: String,
    password: String,
}

#[debug_handler]
pub(crate) async fn token(
    State(db_pool): State<SqlitePool>,
    Form(form): Form<TokenForm>,
) -> AppResult<Json<Value>> {
    let row: Option<(UserId, String)> = sqlx::query_as("SELECT id,password FROM users WHERE email=?")
        .bind(&form.username)
        .fetch_optional(&db_pool)
        .await?;

    // Unknown email and wrong password are reported identically.
    let Some((_, password_hash)) = row else {
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(&form.password, &password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let access_token = create_access_token(&form.username)?;
    Ok(Json(json!({
        "access_token": access_token,
        "token_type": "bearer",
    })))
}
