use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `created_at` is when the post was published, `saved_at` when it was
/// ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Guide {
    pub message_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
}

impl Guide {
    pub fn new(message_id: i64, title: String, content: String, created_at: DateTime<Utc>) -> Self {
        Self {
            message_id,
            title,
            content,
            created_at,
            saved_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GuideStats {
    pub total: i64,
    pub first_created_at: Option<DateTime<Utc>>,
    pub latest_created_at: Option<DateTime<Utc>>,
    pub last_week: i64,
}
