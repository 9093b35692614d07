use chrono::Utc;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cookies::probe::{ProbeResponse, SiteProbe};
use crate::cookies::store::CookieStore;
use crate::errors::AppError;
use crate::models::cookie::{CookieRecord, Verdict};

/// Phrases that mark a served page as a login or session-expired screen.
/// A 2xx response carrying two or more of these is treated as the origin
/// bouncing the cookies rather than accepting them.
const UNAUTHENTICATED_MARKERS: &[&str] = &[
    "login",
    "sign in",
    "authentication required",
    "session expired",
    "unauthorized",
    "access denied",
];

/// Result of one validation attempt, shaped for direct display.
/// `verdict` is null when there was nothing stored to validate.
#[derive(Debug, Serialize)]
pub struct ValidationSummary {
    pub message: String,
    pub updated_count: u64,
    pub verdict: Option<Verdict>,
}

/// Probes `website` with every cookie stored for it by `owner` and writes
/// the resulting verdict onto each of those records in one update.
///
/// Cookies are judged as a set per site: one outbound GET carries them all,
/// and the single verdict applies to every record. A transport failure is a
/// verdict (invalid), never an error; the only errors this returns are
/// store-level.
pub async fn validate_website(
    store: &dyn CookieStore,
    probe: &dyn SiteProbe,
    owner: Uuid,
    website: &str,
) -> Result<ValidationSummary, AppError> {
    let records = store.list(owner, Some(website)).await?;
    if records.is_empty() {
        return Ok(ValidationSummary {
            message: format!("No cookies stored for {website}"),
            updated_count: 0,
            verdict: None,
        });
    }

    let target = normalize_target(website);
    let cookie_header = build_cookie_header(&records);

    let verdict = match probe.fetch(&target, &cookie_header).await {
        Ok(response) => classify(&response),
        Err(e) => {
            warn!("Probe for {target} failed: {e}");
            Verdict::Invalid
        }
    };

    let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
    let updated = store.update_validation(&ids, verdict, Utc::now()).await?;

    info!("Validated {updated} cookies for {website}: {verdict:?}");

    Ok(ValidationSummary {
        message: format!("Validated {updated} cookies for {website}"),
        updated_count: updated,
        verdict: Some(verdict),
    })
}

/// Prefixes `https://` when the website label carries no scheme.
pub fn normalize_target(website: &str) -> String {
    if website.starts_with("http://") || website.starts_with("https://") {
        website.to_string()
    } else {
        format!("https://{website}")
    }
}

/// Joins stored records into a single `Cookie:` header value.
pub fn build_cookie_header(records: &[CookieRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}={}", r.name, r.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Classifies a probe response into a verdict.
///
/// 401/403 and any other 4xx/5xx are invalid. A redirect to a login page is
/// invalid; other redirects are valid (the origin accepted the request). A
/// 2xx is valid unless the body reads like a login screen.
pub fn classify(response: &ProbeResponse) -> Verdict {
    let status = response.status;

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Verdict::Invalid;
    }

    if status.is_redirection() {
        return match &response.location {
            Some(location) if looks_like_login(location) => Verdict::Invalid,
            _ => Verdict::Valid,
        };
    }

    if status.is_success() {
        return if unauthenticated_marker_count(&response.body) >= 2 {
            Verdict::Invalid
        } else {
            Verdict::Valid
        };
    }

    Verdict::Invalid
}

fn looks_like_login(location: &str) -> bool {
    let location = location.to_lowercase();
    location.contains("login") || location.contains("signin") || location.contains("sign-in")
}

fn unauthenticated_marker_count(body: &str) -> usize {
    let body = body.to_lowercase();
    UNAUTHENTICATED_MARKERS
        .iter()
        .filter(|marker| body.contains(*marker))
        .count()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::cookies::probe::ProbeError;
    use crate::cookies::store::memory::MemoryCookieStore;
    use crate::models::cookie::{CookiePair, Validity};

    fn response(status: u16) -> ProbeResponse {
        ProbeResponse {
            status: StatusCode::from_u16(status).unwrap(),
            location: None,
            body: String::new(),
        }
    }

    #[test]
    fn test_classify_success_is_valid() {
        assert_eq!(classify(&response(200)), Verdict::Valid);
        assert_eq!(classify(&response(204)), Verdict::Valid);
    }

    #[test]
    fn test_classify_redirect_is_valid() {
        let mut r = response(302);
        r.location = Some("https://example.com/dashboard".to_string());
        assert_eq!(classify(&r), Verdict::Valid);
        assert_eq!(classify(&response(301)), Verdict::Valid);
    }

    #[test]
    fn test_classify_redirect_to_login_is_invalid() {
        for location in ["/login?next=%2F", "https://example.com/signin", "/Sign-In"] {
            let mut r = response(302);
            r.location = Some(location.to_string());
            assert_eq!(classify(&r), Verdict::Invalid, "location {location}");
        }
    }

    #[test]
    fn test_classify_auth_statuses_are_invalid() {
        assert_eq!(classify(&response(401)), Verdict::Invalid);
        assert_eq!(classify(&response(403)), Verdict::Invalid);
    }

    #[test]
    fn test_classify_other_errors_are_invalid() {
        assert_eq!(classify(&response(404)), Verdict::Invalid);
        assert_eq!(classify(&response(500)), Verdict::Invalid);
        assert_eq!(classify(&response(503)), Verdict::Invalid);
    }

    #[test]
    fn test_classify_login_page_body_is_invalid() {
        let mut r = response(200);
        r.body = "<h1>Session expired</h1> Please login to continue".to_string();
        assert_eq!(classify(&r), Verdict::Invalid);
    }

    #[test]
    fn test_classify_single_marker_body_stays_valid() {
        // One stray mention (a footer "Login" link) is not enough to flip.
        let mut r = response(200);
        r.body = "Welcome back! <a href=\"/logout\">Log out</a> login".to_string();
        assert_eq!(classify(&r), Verdict::Valid);
    }

    #[test]
    fn test_normalize_target_defaults_to_https() {
        assert_eq!(normalize_target("example.com"), "https://example.com");
        assert_eq!(normalize_target("http://example.com"), "http://example.com");
        assert_eq!(normalize_target("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_build_cookie_header_preserves_order() {
        let a = record("a", "1");
        let b = record("b", "2");
        assert_eq!(build_cookie_header(&[a, b]), "a=1; b=2");
    }

    fn record(name: &str, value: &str) -> CookieRecord {
        CookieRecord {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            website: "example.com".to_string(),
            name: name.to_string(),
            value: value.to_string(),
            domain: None,
            path: None,
            expires: None,
            is_valid: Validity::Unknown,
            last_validated: None,
            created_at: Utc::now(),
        }
    }

    struct StaticProbe {
        status: u16,
        location: Option<&'static str>,
        body: &'static str,
    }

    impl StaticProbe {
        fn ok() -> Self {
            StaticProbe {
                status: 200,
                location: None,
                body: "",
            }
        }

        fn status(status: u16) -> Self {
            StaticProbe {
                status,
                location: None,
                body: "",
            }
        }
    }

    #[async_trait]
    impl SiteProbe for StaticProbe {
        async fn fetch(&self, _url: &str, _header: &str) -> Result<ProbeResponse, ProbeError> {
            Ok(ProbeResponse {
                status: StatusCode::from_u16(self.status).unwrap(),
                location: self.location.map(String::from),
                body: self.body.to_string(),
            })
        }
    }

    /// Probe that never reaches the origin, standing in for DNS failures,
    /// refused connections, and timeouts alike.
    struct UnreachableProbe;

    #[async_trait]
    impl SiteProbe for UnreachableProbe {
        async fn fetch(&self, url: &str, _header: &str) -> Result<ProbeResponse, ProbeError> {
            Err(ProbeError(format!("connection refused: {url}")))
        }
    }

    async fn seed(store: &MemoryCookieStore, owner: Uuid, website: &str, n: usize) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for i in 0..n {
            let pair = CookiePair::new(format!("c{i}"), format!("v{i}"));
            ids.push(store.insert(owner, website, &pair).await.unwrap());
        }
        ids
    }

    #[tokio::test]
    async fn test_validate_nothing_stored_is_a_noop() {
        let store = MemoryCookieStore::new();
        let summary = validate_website(&store, &StaticProbe::ok(), Uuid::new_v4(), "example.com")
            .await
            .unwrap();

        assert_eq!(summary.updated_count, 0);
        assert!(summary.verdict.is_none());
    }

    #[tokio::test]
    async fn test_validate_success_marks_all_records_valid() {
        let store = MemoryCookieStore::new();
        let owner = Uuid::new_v4();
        let ids = seed(&store, owner, "example.com", 3).await;

        let summary = validate_website(&store, &StaticProbe::ok(), owner, "example.com")
            .await
            .unwrap();

        assert_eq!(summary.updated_count, 3);
        assert_eq!(summary.verdict, Some(Verdict::Valid));
        for id in ids {
            let record = store.get(id).unwrap();
            assert_eq!(record.is_valid, Validity::Valid);
            assert!(record.last_validated.is_some());
        }
    }

    #[tokio::test]
    async fn test_validate_forbidden_marks_all_records_invalid() {
        let store = MemoryCookieStore::new();
        let owner = Uuid::new_v4();
        let ids = seed(&store, owner, "example.com", 2).await;

        let summary = validate_website(&store, &StaticProbe::status(403), owner, "example.com")
            .await
            .unwrap();

        assert_eq!(summary.verdict, Some(Verdict::Invalid));
        for id in ids {
            assert_eq!(store.get(id).unwrap().is_valid, Validity::Invalid);
        }
    }

    #[tokio::test]
    async fn test_validate_transport_failure_is_an_invalid_verdict() {
        let store = MemoryCookieStore::new();
        let owner = Uuid::new_v4();
        seed(&store, owner, "down.example.com", 1).await;

        let summary = validate_website(&store, &UnreachableProbe, owner, "down.example.com")
            .await
            .unwrap();

        assert_eq!(summary.verdict, Some(Verdict::Invalid));
        assert_eq!(summary.updated_count, 1);
    }

    #[tokio::test]
    async fn test_validate_twice_is_idempotent_and_restamps() {
        let store = MemoryCookieStore::new();
        let owner = Uuid::new_v4();
        let ids = seed(&store, owner, "example.com", 1).await;

        let first = validate_website(&store, &StaticProbe::ok(), owner, "example.com")
            .await
            .unwrap();
        let stamp_after_first = store.get(ids[0]).unwrap().last_validated.unwrap();

        let second = validate_website(&store, &StaticProbe::ok(), owner, "example.com")
            .await
            .unwrap();
        let stamp_after_second = store.get(ids[0]).unwrap().last_validated.unwrap();

        assert_eq!(first.verdict, second.verdict);
        assert!(stamp_after_second >= stamp_after_first);
    }

    #[tokio::test]
    async fn test_validate_can_flip_valid_back_to_invalid() {
        let store = MemoryCookieStore::new();
        let owner = Uuid::new_v4();
        let ids = seed(&store, owner, "example.com", 1).await;

        validate_website(&store, &StaticProbe::ok(), owner, "example.com")
            .await
            .unwrap();
        assert_eq!(store.get(ids[0]).unwrap().is_valid, Validity::Valid);

        validate_website(&store, &StaticProbe::status(401), owner, "example.com")
            .await
            .unwrap();
        assert_eq!(store.get(ids[0]).unwrap().is_valid, Validity::Invalid);
    }

    #[tokio::test]
    async fn test_validate_leaves_other_websites_untouched() {
        let store = MemoryCookieStore::new();
        let owner = Uuid::new_v4();
        seed(&store, owner, "a.example.com", 1).await;
        let other = seed(&store, owner, "b.example.com", 1).await;

        validate_website(&store, &StaticProbe::ok(), owner, "a.example.com")
            .await
            .unwrap();

        assert_eq!(store.get(other[0]).unwrap().is_valid, Validity::Unknown);
    }
}
