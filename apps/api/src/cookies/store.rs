use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::cookie::{CookiePair, CookieRecord, Validity, Verdict};

/// Persistence operations the upload and validation flows depend on.
///
/// Kept behind a trait so those flows can be exercised against an in-memory
/// store in tests. All operations are scoped to an owner; a record is never
/// visible to or mutable by any other owner.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Persists one pair for `(owner, website)` and returns the new record id.
    async fn insert(&self, owner: Uuid, website: &str, pair: &CookiePair) -> Result<Uuid>;

    /// Returns the owner's records, newest first, optionally filtered by website.
    async fn list(&self, owner: Uuid, website: Option<&str>) -> Result<Vec<CookieRecord>>;

    /// Writes one verdict and timestamp onto every record in `ids`, in a
    /// single statement. Returns the number of records updated.
    async fn update_validation(
        &self,
        ids: &[Uuid],
        verdict: Verdict,
        at: DateTime<Utc>,
    ) -> Result<u64>;

    /// Deletes the record if it exists AND belongs to `owner`. Returns false
    /// otherwise; a foreign-owned id touches no row.
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool>;
}

#[derive(Debug, FromRow)]
struct CookieRow {
    id: Uuid,
    user_id: Uuid,
    website: String,
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    expires: Option<DateTime<Utc>>,
    is_valid: Option<bool>,
    last_validated: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<CookieRow> for CookieRecord {
    fn from(row: CookieRow) -> Self {
        CookieRecord {
            id: row.id,
            owner: row.user_id,
            website: row.website,
            name: row.name,
            value: row.value,
            domain: row.domain,
            path: row.path,
            expires: row.expires,
            is_valid: Validity::from_bool(row.is_valid),
            last_validated: row.last_validated,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed implementation of [`CookieStore`].
pub struct PgCookieStore {
    pool: PgPool,
}

impl PgCookieStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CookieStore for PgCookieStore {
    async fn insert(&self, owner: Uuid, website: &str, pair: &CookiePair) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO cookies (id, user_id, website, name, value, domain, path, expires)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(website)
        .bind(&pair.name)
        .bind(&pair.value)
        .bind(&pair.domain)
        .bind(&pair.path)
        .bind(pair.expires)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list(&self, owner: Uuid, website: Option<&str>) -> Result<Vec<CookieRecord>> {
        let rows: Vec<CookieRow> = match website {
            Some(site) => {
                sqlx::query_as(
                    r#"
                    SELECT id, user_id, website, name, value, domain, path,
                           expires, is_valid, last_validated, created_at
                    FROM cookies
                    WHERE user_id = $1 AND website = $2
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(owner)
                .bind(site)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, user_id, website, name, value, domain, path,
                           expires, is_valid, last_validated, created_at
                    FROM cookies
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(owner)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(CookieRecord::from).collect())
    }

    async fn update_validation(
        &self,
        ids: &[Uuid],
        verdict: Verdict,
        at: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE cookies SET is_valid = $1, last_validated = $2 WHERE id = ANY($3)",
        )
        .bind(verdict.as_bool())
        .bind(at)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cookies WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryCookieStore;
    use super::*;

    #[tokio::test]
    async fn test_delete_by_owner_removes_the_record() {
        let store = MemoryCookieStore::new();
        let owner = Uuid::new_v4();
        let id = store
            .insert(owner, "example.com", &CookiePair::new("sid", "abc"))
            .await
            .unwrap();

        assert!(store.delete(owner, id).await.unwrap());
        assert!(store.get(id).is_none());
    }

    #[tokio::test]
    async fn test_delete_foreign_owned_record_fails_and_leaves_it() {
        let store = MemoryCookieStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let id = store
            .insert(alice, "example.com", &CookiePair::new("sid", "abc"))
            .await
            .unwrap();

        assert!(!store.delete(bob, id).await.unwrap());
        let record = store.get(id).expect("record must survive a foreign delete");
        assert_eq!(record.owner, alice);
        assert_eq!(record.value, "abc");
    }

    #[tokio::test]
    async fn test_delete_missing_record_reports_false() {
        let store = MemoryCookieStore::new();
        assert!(!store.delete(Uuid::new_v4(), Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let store = MemoryCookieStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store
            .insert(alice, "example.com", &CookiePair::new("a", "1"))
            .await
            .unwrap();
        store
            .insert(bob, "example.com", &CookiePair::new("b", "2"))
            .await
            .unwrap();

        let listed = store.list(alice, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "a");
    }

    #[tokio::test]
    async fn test_update_validation_touches_only_the_given_ids() {
        let store = MemoryCookieStore::new();
        let owner = Uuid::new_v4();
        let target = store
            .insert(owner, "example.com", &CookiePair::new("a", "1"))
            .await
            .unwrap();
        let bystander = store
            .insert(owner, "example.com", &CookiePair::new("b", "2"))
            .await
            .unwrap();

        let updated = store
            .update_validation(&[target], Verdict::Valid, Utc::now())
            .await
            .unwrap();

        assert_eq!(updated, 1);
        assert_eq!(store.get(target).unwrap().is_valid, Validity::Valid);
        assert_eq!(store.get(bystander).unwrap().is_valid, Validity::Unknown);
    }
}
