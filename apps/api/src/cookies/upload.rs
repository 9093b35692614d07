use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::cookies::parser::parse_cookie_header;
use crate::cookies::store::CookieStore;
use crate::errors::AppError;
use crate::models::cookie::CookiePair;

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub website: Option<String>,
    /// Raw `Cookie:` header, parsed server-side.
    #[serde(default)]
    pub cookie_header: Option<String>,
    /// Structured pairs; may be supplied alongside `cookie_header`.
    #[serde(default)]
    pub cookies: Vec<CookiePair>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub created: usize,
}

/// Merges the raw-header and structured sources into one list of pairs to
/// persist: header pairs first, then structured pairs, each source cleaned
/// of entries with an empty trimmed name or value.
pub fn collect_pairs(request: &UploadRequest) -> Vec<CookiePair> {
    let mut pairs = Vec::new();

    if let Some(header) = request.cookie_header.as_deref() {
        pairs.extend(parse_cookie_header(header));
    }

    for cookie in &request.cookies {
        let name = cookie.name.trim();
        let value = cookie.value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        pairs.push(CookiePair {
            name: name.to_string(),
            value: value.to_string(),
            ..cookie.clone()
        });
    }

    pairs
}

/// Persists an upload: one record per merged pair, all owned by `owner`.
///
/// A missing or blank website is rejected; a website with zero usable pairs
/// is accepted as a no-op (zero records created).
pub async fn save_cookies(
    store: &dyn CookieStore,
    owner: Uuid,
    request: UploadRequest,
) -> Result<UploadResponse, AppError> {
    let website = request
        .website
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if website.is_empty() {
        return Err(AppError::Validation("Website is required".to_string()));
    }

    let pairs = collect_pairs(&request);
    for pair in &pairs {
        store.insert(owner, &website, pair).await?;
    }

    info!("Stored {} cookies for {website}", pairs.len());

    Ok(UploadResponse {
        message: format!("Successfully uploaded {} cookies for {website}", pairs.len()),
        created: pairs.len(),
    })
}
