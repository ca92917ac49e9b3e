use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the authenticated user id, set by the auth proxy in front of the API.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller of a user-scoped endpoint.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing user header `X-User-Id`".into()))?;

        Uuid::parse_str(raw.trim())
            .map(CurrentUser)
            .map_err(|_| AppError::Unauthorized("invalid user id".into()))
    }
}
