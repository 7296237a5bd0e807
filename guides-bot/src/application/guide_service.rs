use std::sync::Arc;

use crate::data::guide_repository::GuideRepository;
use crate::domain::error::DomainError;
use crate::domain::guide::{Guide, GuideStats};
use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};

pub const DEFAULT_SEARCH_LIMIT: i64 = 10;
pub const DEFAULT_RECENT_DAYS: i64 = 7;

#[derive(Clone)]
pub struct GuideService<R: GuideRepository + 'static> {
    repo: Arc<R>,
}

impl<R> GuideService<R>
where
    R: GuideRepository + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list_guides(&self, limit: Option<i64>) -> Result<Vec<Guide>, DomainError> {
        self.repo.list_all(limit).await
    }

    pub async fn count(&self) -> Result<i64, DomainError> {
        self.repo.count().await
    }

    pub async fn get_guide(&self, message_id: i64) -> Result<Guide, DomainError> {
        self.repo
            .find_by_message_id(message_id)
            .await?
            .ok_or(DomainError::GuideNotFound(message_id))
    }

    pub async fn search(&self, term: &str, limit: Option<i64>) -> Result<Vec<Guide>, DomainError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        self.repo
            .search(term, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await
    }

    pub async fn recent(&self, days: i64, limit: Option<i64>) -> Result<Vec<Guide>, DomainError> {
        let since = Utc::now() - Duration::days(days.max(0));
        self.repo
            .created_since(since, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await
    }

    pub async fn stats(&self) -> Result<GuideStats, DomainError> {
        let week_start = Utc::now() - Duration::days(DEFAULT_RECENT_DAYS);
        self.repo.stats(week_start).await
    }

    #[instrument(skip(self))]
    pub async fn delete_guide(&self, message_id: i64) -> Result<(), DomainError> {
        if self.repo.delete(message_id).await? {
            Ok(())
        } else {
            Err(DomainError::GuideNotFound(message_id))
        }
    }

    pub async fn export(&self) -> Result<Vec<Guide>, DomainError> {
        self.repo.list_all(None).await
    }

    /// Returns how many guides were added; existing message ids are kept.
    #[instrument(skip(self, guides), fields(incoming = guides.len()))]
    pub async fn import(&self, guides: Vec<Guide>) -> Result<usize, DomainError> {
        let mut imported = 0;
        for guide in guides {
            match self.repo.insert(guide).await {
                Ok(_) => imported += 1,
                Err(DomainError::DuplicateKey(message_id)) => {
                    warn!(message_id, "guide already present, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        info!(imported, "import finished");
        Ok(imported)
    }

    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<u64, DomainError> {
        let removed = self.repo.clear().await?;
        warn!(removed, "guide store reset");
        Ok(removed)
    }
}
