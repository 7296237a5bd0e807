use crate::domain::error::DomainError;
use crate::domain::guide::{Guide, GuideStats};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{error, info};

#[async_trait]
pub trait GuideRepository: Send + Sync {
    /// Fails with [`DomainError::DuplicateKey`] if the message id is taken.
    async fn insert(&self, guide: Guide) -> Result<Guide, DomainError>;
    async fn count(&self) -> Result<i64, DomainError>;
    async fn list_all(&self, limit: Option<i64>) -> Result<Vec<Guide>, DomainError>;
    async fn find_by_message_id(&self, message_id: i64) -> Result<Option<Guide>, DomainError>;
    async fn delete(&self, message_id: i64) -> Result<bool, DomainError>;
    async fn search(&self, term: &str, limit: i64) -> Result<Vec<Guide>, DomainError>;
    async fn created_since(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Guide>, DomainError>;
    async fn stats(&self, week_start: DateTime<Utc>) -> Result<GuideStats, DomainError>;
    async fn clear(&self) -> Result<u64, DomainError>;
}

#[derive(Clone)]
pub struct SqliteGuideRepository {
    pool: SqlitePool,
}

impl SqliteGuideRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn storage_error(context: &str, e: sqlx::Error) -> DomainError {
    error!("db error while {}: {}", context, e);
    DomainError::StorageUnavailable(e.to_string())
}

// `%` and `_` in user input must match literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl GuideRepository for SqliteGuideRepository {
    async fn insert(&self, guide: Guide) -> Result<Guide, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO guides (message_id, title, content, created_at, saved_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(message_id) DO NOTHING
            "#,
        )
        .bind(guide.message_id)
        .bind(&guide.title)
        .bind(&guide.content)
        .bind(guide.created_at)
        .bind(guide.saved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("inserting guide", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::DuplicateKey(guide.message_id));
        }

        info!(message_id = guide.message_id, "guide stored");
        Ok(guide)
    }

    async fn count(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM guides")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("counting guides", e))
    }

    async fn list_all(&self, limit: Option<i64>) -> Result<Vec<Guide>, DomainError> {
        // SQLite treats a negative LIMIT as no limit.
        let limit = limit.unwrap_or(-1);

        sqlx::query_as::<_, Guide>(
            r#"
            SELECT message_id, title, content, created_at, saved_at
            FROM guides
            ORDER BY created_at DESC, message_id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("listing guides", e))
    }

    async fn find_by_message_id(&self, message_id: i64) -> Result<Option<Guide>, DomainError> {
        sqlx::query_as::<_, Guide>(
            r#"
            SELECT message_id, title, content, created_at, saved_at
            FROM guides WHERE message_id = ?1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("looking up guide", e))
    }

    async fn delete(&self, message_id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM guides WHERE message_id = ?1")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("deleting guide", e))?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(message_id, "guide deleted");
        }
        Ok(removed)
    }

    async fn search(&self, term: &str, limit: i64) -> Result<Vec<Guide>, DomainError> {
        sqlx::query_as::<_, Guide>(
            r#"
            SELECT message_id, title, content, created_at, saved_at
            FROM guides
            WHERE title LIKE ?1 ESCAPE '\'
            ORDER BY created_at DESC, message_id DESC
            LIMIT ?2
            "#,
        )
        .bind(like_pattern(term))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("searching guides", e))
    }

    async fn created_since(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Guide>, DomainError> {
        sqlx::query_as::<_, Guide>(
            r#"
            SELECT message_id, title, content, created_at, saved_at
            FROM guides
            WHERE created_at >= ?1
            ORDER BY created_at DESC, message_id DESC
            LIMIT ?2
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("fetching recent guides", e))
    }

    async fn stats(&self, week_start: DateTime<Utc>) -> Result<GuideStats, DomainError> {
        sqlx::query_as::<_, GuideStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                MIN(created_at) AS first_created_at,
                MAX(created_at) AS latest_created_at,
                COUNT(CASE WHEN created_at >= ?1 THEN 1 END) AS last_week
            FROM guides
            "#,
        )
        .bind(week_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("computing guide stats", e))
    }

    async fn clear(&self) -> Result<u64, DomainError> {
        let deleted = sqlx::query("DELETE FROM guides")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("clearing guides", e))?;

        info!(removed = deleted.rows_affected(), "guide store cleared");
        Ok(deleted.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::create_memory_pool;
    use chrono::{Duration, TimeZone};

    async fn repo() -> SqliteGuideRepository {
        SqliteGuideRepository::new(create_memory_pool().await.unwrap())
    }

    fn guide(message_id: i64, title: &str, created_at: DateTime<Utc>) -> Guide {
        Guide::new(
            message_id,
            title.to_string(),
            format!("{title} body text"),
            created_at,
        )
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let repo = repo().await;
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.list_all(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_matches_distinct_inserts() {
        let repo = repo().await;
        for id in 1..=5 {
            repo.insert(guide(id, "Guide", at(id as u32))).await.unwrap();
        }
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn duplicate_message_id_is_rejected_and_not_stored_twice() {
        let repo = repo().await;
        repo.insert(guide(7, "First", at(1))).await.unwrap();

        let err = repo.insert(guide(7, "Second", at(2))).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateKey(7)));

        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo.find_by_message_id(7).await.unwrap().unwrap();
        assert_eq!(stored.title, "First");
    }

    #[tokio::test]
    async fn lists_newest_first_with_limit() {
        let repo = repo().await;
        repo.insert(guide(1, "Old", at(1))).await.unwrap();
        repo.insert(guide(2, "New", at(3))).await.unwrap();
        repo.insert(guide(3, "Middle", at(2))).await.unwrap();

        let titles: Vec<_> = repo
            .list_all(None)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, ["New", "Middle", "Old"]);

        assert_eq!(repo.list_all(Some(2)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn round_trips_all_fields() {
        let repo = repo().await;
        let original = guide(11, "Round trip", at(4));
        repo.insert(original.clone()).await.unwrap();

        let stored = repo.find_by_message_id(11).await.unwrap().unwrap();
        assert_eq!(stored.message_id, original.message_id);
        assert_eq!(stored.content, original.content);
        assert_eq!(stored.created_at, original.created_at);
        assert!(repo.find_by_message_id(12).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let repo = repo().await;
        repo.insert(guide(1, "Gone soon", at(1))).await.unwrap();
        assert!(repo.delete(1).await.unwrap());
        assert!(!repo.delete(1).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn search_matches_title_substring_case_insensitively() {
        let repo = repo().await;
        repo.insert(guide(1, "Samsung cache cleanup", at(1))).await.unwrap();
        repo.insert(guide(2, "ChatGPT memory", at(2))).await.unwrap();
        repo.insert(guide(3, "100% battery tricks", at(3))).await.unwrap();

        let found = repo.search("CACHE", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message_id, 1);

        let percent = repo.search("%", 10).await.unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].message_id, 3);
    }

    #[tokio::test]
    async fn created_since_filters_by_publication_date() {
        let repo = repo().await;
        repo.insert(guide(1, "Old", at(1))).await.unwrap();
        repo.insert(guide(2, "Recent", at(10))).await.unwrap();

        let recent = repo.created_since(at(5), 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message_id, 2);
    }

    #[tokio::test]
    async fn stats_summarise_the_store() {
        let repo = repo().await;
        let empty = repo.stats(at(1)).await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.first_created_at, None);

        repo.insert(guide(1, "A", at(1))).await.unwrap();
        repo.insert(guide(2, "B", at(9))).await.unwrap();
        repo.insert(guide(3, "C", at(10))).await.unwrap();

        let stats = repo.stats(at(10) - Duration::days(7)).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.first_created_at, Some(at(1)));
        assert_eq!(stats.latest_created_at, Some(at(10)));
        assert_eq!(stats.last_week, 2);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let repo = repo().await;
        repo.insert(guide(1, "A", at(1))).await.unwrap();
        repo.insert(guide(2, "B", at(2))).await.unwrap();
        assert_eq!(repo.clear().await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
