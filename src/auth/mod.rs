pub mod password;
pub mod token;

pub use self::password::{hash_password, verify_password};
pub use self::token::{create_token, decode_token, Claims};

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::sync::Arc;

use crate::errors::ApiError;
use crate::state::AppState;

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
/// Taking this as a handler argument rejects unauthenticated requests with
/// 401/403 before the handler body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::MissingToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::InvalidAuthHeader)?;

        let claims = token::decode_token(token, &state.config.jwt_secret)?;

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
        })
    }
}
