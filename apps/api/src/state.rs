use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::token::TokenManager;
use crate::cookies::probe::SiteProbe;
use crate::cookies::store::CookieStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Pluggable record store. Default: PgCookieStore over the shared pool.
    pub store: Arc<dyn CookieStore>,
    /// Pluggable outbound probe. Default: HttpProbe (reqwest).
    pub probe: Arc<dyn SiteProbe>,
    pub tokens: TokenManager,
}
