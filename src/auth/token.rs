use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};

/// Bearer token payload: who the caller is and when the token expires.
/// HS256-signed with the configured secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject -- user id
    pub sub: String,
    pub username: String,
    /// Issued at (unix timestamp)
    pub iat: i64,
    /// Expiry (unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        expires_in_days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.into(),
            username: username.into(),
            iat: now.timestamp(),
            exp: (now + Duration::days(expires_in_days)).timestamp(),
        }
    }
}

pub fn create_token(claims: &Claims, secret: &str) -> ApiResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::TokenSigning(e.to_string()))
}

/// Decode and verify a token. Expiry is validated; an expired token and a
/// forged token surface as distinct errors.
pub fn decode_token(token: &str, secret: &str) -> ApiResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
