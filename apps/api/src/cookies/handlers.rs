use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extract::AuthUser;
use crate::cookies::upload::{save_cookies, UploadRequest, UploadResponse};
use crate::cookies::validator::{validate_website, ValidationSummary};
use crate::errors::AppError;
use crate::models::cookie::CookieRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WebsiteQuery {
    pub website: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CookieListResponse {
    pub cookies: Vec<CookieRecord>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub website: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// POST /api/v1/cookies
pub async fn handle_upload(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let response = save_cookies(state.store.as_ref(), user.id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/cookies
pub async fn handle_list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<WebsiteQuery>,
) -> Result<Json<CookieListResponse>, AppError> {
    let cookies = state
        .store
        .list(user.id, params.website.as_deref())
        .await?;
    let count = cookies.len();
    Ok(Json(CookieListResponse { cookies, count }))
}

/// DELETE /api/v1/cookies/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.store.delete(user.id, id).await?;
    if !deleted {
        // Absent and foreign-owned look identical to the caller.
        return Err(AppError::NotFound(
            "Cookie not found or access denied".to_string(),
        ));
    }
    Ok(Json(DeleteResponse {
        message: "Cookie deleted successfully".to_string(),
    }))
}

/// POST /api/v1/cookies/validate
pub async fn handle_validate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ValidationSummary>, AppError> {
    let website = request.website.trim();
    if website.is_empty() {
        return Err(AppError::Validation("Website is required".to_string()));
    }

    let summary =
        validate_website(state.store.as_ref(), state.probe.as_ref(), user.id, website).await?;
    Ok(Json(summary))
}
