use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// Authenticated caller identity, extracted from `Authorization: Bearer`
/// before any handler logic runs.
///
/// Handlers receive this as a parameter and pass the id down explicitly into
/// every store and validator call; there is no ambient current-user state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
        let claims = state.tokens.verify(token).map_err(|_| AppError::Unauthorized)?;

        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
        })
    }
}
