use axum::http::{HeaderMap, header::AUTHORIZATION};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{AppError, AppResult};

const TOKEN_TTL: Duration = Duration::minutes(30);

fn secret() -> String {
    dotenv::var("JWT_SECRET").unwrap_or_else(|_| "palaver-dev-secret".to_owned())
}

/// `sub` carries the user's email; the user id is resolved per request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

pub fn create_access_token(email: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: email.to_owned(),
        exp: (OffsetDateTime::now_utc() + TOKEN_TTL).unix_timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret().as_bytes()),
    )
}

pub fn decode_token(token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

/// Pulls the email out of an `Authorization: Bearer <jwt>` header.
pub fn bearer_email(headers: &HeaderMap) -> AppResult<String> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::InvalidToken)?;
    let token = header.strip_prefix("Bearer ").ok_or(AppError::InvalidToken)?;
    Ok(decode_token(token)?.sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_round_trip() {
        let token = create_access_token("test@example.com").unwrap();
        let claims = decode_token(&token).unwrap();
        assert_eq!(claims.sub, "test@example.com");
        assert!(claims.exp > OffsetDateTime::now_utc().unix_timestamp());
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert!(matches!(
            decode_token("not.a.token"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_header_round_trip() {
        let token = create_access_token("test@example.com").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(bearer_email(&headers).unwrap(), "test@example.com");
    }

    #[test]
    fn missing_or_malformed_header_is_invalid() {
        assert!(matches!(
            bearer_email(&HeaderMap::new()),
            Err(AppError::InvalidToken)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            bearer_email(&headers),
            Err(AppError::InvalidToken)
        ));
    }
}
