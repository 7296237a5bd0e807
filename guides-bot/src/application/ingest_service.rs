use std::sync::Arc;

use crate::data::guide_repository::GuideRepository;
use crate::domain::channel_post::{ChannelName, ChannelPost};
use crate::domain::error::DomainError;
use crate::domain::filter::{self, Rejection};
use crate::domain::guide::Guide;
use crate::domain::title::extract_title;
use tracing::instrument;

#[derive(Clone)]
pub struct IngestService<R: GuideRepository + 'static> {
    repo: Arc<R>,
    channel: ChannelName,
}

impl<R> IngestService<R>
where
    R: GuideRepository + 'static,
{
    pub fn new(repo: Arc<R>, channel: ChannelName) -> Self {
        Self { repo, channel }
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    #[instrument(skip(self, post), fields(message_id = post.message_id))]
    pub async fn ingest(&self, post: &ChannelPost) -> Result<Guide, DomainError> {
        if !post.is_from(&self.channel) {
            return Err(Rejection::ForeignChannel.into());
        }

        let text = filter::accept(post)?;
        let title = extract_title(text).ok_or(Rejection::NoTitle)?;
        let guide = Guide::new(post.message_id, title, text.trim().to_string(), post.date);

        self.repo.insert(guide).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::guide_repository::SqliteGuideRepository;
    use crate::domain::channel_post::PostContent;
    use crate::infrastructure::database::create_memory_pool;
    use chrono::Utc;

    const GUIDE_TEXT: &str =
        "📱 Speed up your phone\nTurn off animations in developer options to feel the difference.";

    async fn service() -> (IngestService<SqliteGuideRepository>, Arc<SqliteGuideRepository>) {
        let repo = Arc::new(SqliteGuideRepository::new(
            create_memory_pool().await.unwrap(),
        ));
        let service = IngestService::new(Arc::clone(&repo), ChannelName::new("@Guides"));
        (service, repo)
    }

    fn post(message_id: i64, content: PostContent) -> ChannelPost {
        ChannelPost {
            message_id,
            chat_username: Some("guides".into()),
            date: Utc::now(),
            content,
        }
    }

    fn text(message_id: i64, body: &str) -> ChannelPost {
        post(message_id, PostContent::Text(body.to_string()))
    }

    #[tokio::test]
    async fn accepted_post_is_stored_under_its_message_id() {
        let (service, repo) = service().await;

        let guide = service.ingest(&text(17, GUIDE_TEXT)).await.unwrap();
        assert_eq!(guide.message_id, 17);
        assert_eq!(guide.title, "Speed up your phone");

        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo.find_by_message_id(17).await.unwrap().unwrap();
        assert_eq!(stored.content, GUIDE_TEXT);
    }

    #[tokio::test]
    async fn forty_nine_characters_leave_store_empty() {
        let (service, repo) = service().await;
        let err = service.ingest(&text(1, &"a".repeat(49))).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::ValidationRejected(Rejection::TooShort(49))
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fifty_characters_are_stored() {
        let (service, repo) = service().await;
        service.ingest(&text(1, &"a".repeat(50))).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejected_shapes_never_touch_the_store() {
        let (service, repo) = service().await;
        let skipped = format!("{GUIDE_TEXT} #skip");
        let cases = [
            text(1, &skipped),
            post(2, PostContent::Poll),
            post(3, PostContent::Forward { text: None }),
            post(4, PostContent::Other),
        ];
        for case in &cases {
            assert!(matches!(
                service.ingest(case).await,
                Err(DomainError::ValidationRejected(_))
            ));
        }
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn posts_from_other_chats_are_ignored() {
        let (service, repo) = service().await;
        let mut foreign = text(5, GUIDE_TEXT);
        foreign.chat_username = Some("someone_else".into());

        let err = service.ingest(&foreign).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::ValidationRejected(Rejection::ForeignChannel)
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn redelivery_reports_duplicate_without_second_record() {
        let (service, repo) = service().await;
        service.ingest(&text(9, GUIDE_TEXT)).await.unwrap();

        let err = service.ingest(&text(9, GUIDE_TEXT)).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateKey(9)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
