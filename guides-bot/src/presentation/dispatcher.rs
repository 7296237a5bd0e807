use std::sync::Arc;

use crate::application::guide_service::GuideService;
use crate::application::ingest_service::IngestService;
use crate::data::guide_repository::GuideRepository;
use crate::domain::channel_post::ChannelName;
use crate::domain::error::DomainError;
use crate::domain::guide::Guide;
use crate::infrastructure::telegram::{BotApi, TelegramError};
use crate::presentation::commands::{
    BACK_TO_START, Command, FAILURE_TEXT, SHOW_GUIDES, back_keyboard, render_listing,
    start_keyboard, start_text,
};
use crate::presentation::dto::{CallbackQuery, Message, Update};
use tracing::{debug, error, info, warn};

pub struct UpdateDispatcher<R: GuideRepository + 'static, B: BotApi + 'static> {
    ingest: IngestService<R>,
    guides: GuideService<R>,
    bot: Arc<B>,
    bot_username: Option<String>,
}

impl<R, B> UpdateDispatcher<R, B>
where
    R: GuideRepository + 'static,
    B: BotApi + 'static,
{
    pub fn new(ingest: IngestService<R>, guides: GuideService<R>, bot: Arc<B>) -> Self {
        Self {
            ingest,
            guides,
            bot,
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    fn channel(&self) -> &ChannelName {
        self.ingest.channel()
    }

    // Ingestion problems are logged, never returned.
    pub async fn dispatch(&self, update: Update) -> Result<(), TelegramError> {
        if let Some(post) = update.channel_post {
            self.handle_channel_post(&post).await;
            return Ok(());
        }
        if let Some(query) = update.callback_query {
            return self.handle_callback(query).await;
        }
        if let Some(message) = update.message {
            return self.handle_message(message).await;
        }
        debug!(update_id = update.update_id, "ignoring update without payload");
        Ok(())
    }

    pub async fn handle_channel_post(&self, message: &Message) -> Option<Guide> {
        let post = message.to_channel_post();
        match self.ingest.ingest(&post).await {
            Ok(guide) => {
                info!(message_id = guide.message_id, title = %guide.title, "new guide saved");
                if let Ok(total) = self.guides.count().await {
                    info!(total, "guides in store");
                }
                Some(guide)
            }
            Err(DomainError::ValidationRejected(reason)) => {
                info!(message_id = post.message_id, %reason, "channel post ignored");
                None
            }
            Err(DomainError::DuplicateKey(message_id)) => {
                warn!(message_id, "channel post already stored");
                None
            }
            Err(e) => {
                error!(message_id = post.message_id, error = %e, "failed to save guide");
                None
            }
        }
    }

    async fn handle_message(&self, message: Message) -> Result<(), TelegramError> {
        let bot_username = self.bot_username.as_deref();
        let Some(command) = message
            .text
            .as_deref()
            .and_then(|text| Command::parse(text, bot_username))
        else {
            return Ok(());
        };
        let chat_id = message.chat.id;
        info!(chat_id, ?command, "command received");

        match command {
            Command::Start | Command::Help => {
                self.bot
                    .send_message(
                        chat_id,
                        &start_text(self.channel()),
                        Some(&start_keyboard(self.channel())),
                    )
                    .await
            }
            Command::Guides => {
                for chunk in self.listing().await {
                    self.bot.send_message(chat_id, &chunk, None).await?;
                }
                Ok(())
            }
        }
    }

    async fn handle_callback(&self, query: CallbackQuery) -> Result<(), TelegramError> {
        self.bot.answer_callback_query(&query.id).await?;

        let Some(message) = query.message else {
            return Ok(());
        };
        let chat_id = message.chat.id;

        match query.data.as_deref() {
            Some(SHOW_GUIDES) => {
                let mut chunks = self.listing().await.into_iter();
                if let Some(first) = chunks.next() {
                    let rest: Vec<String> = chunks.collect();
                    // The back button goes on the last message of the listing.
                    let keyboard = back_keyboard();
                    let first_keyboard = rest.is_empty().then_some(&keyboard);
                    self.bot
                        .edit_message_text(chat_id, message.message_id, &first, first_keyboard)
                        .await?;
                    let last = rest.len().saturating_sub(1);
                    for (i, chunk) in rest.iter().enumerate() {
                        let markup = (i == last).then_some(&keyboard);
                        self.bot.send_message(chat_id, chunk, markup).await?;
                    }
                }
                Ok(())
            }
            Some(BACK_TO_START) => {
                self.bot
                    .edit_message_text(
                        chat_id,
                        message.message_id,
                        &start_text(self.channel()),
                        Some(&start_keyboard(self.channel())),
                    )
                    .await
            }
            other => {
                debug!(data = ?other, "unknown callback data");
                Ok(())
            }
        }
    }

    async fn listing(&self) -> Vec<String> {
        match self.guides.list_guides(None).await {
            Ok(guides) => render_listing(&guides, self.channel()),
            Err(e) => {
                error!(error = %e, "failed to load guides");
                vec![FAILURE_TEXT.to_string()]
            }
        }
    }
}
