use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::presentation::dto::{
    AnswerCallbackQueryRequest, ApiResponse, EditMessageTextRequest, GetUpdatesRequest,
    InlineKeyboardMarkup, SendMessageRequest, SetWebhookRequest, Update, User,
};

pub const ALLOWED_UPDATES: [&str; 3] = ["message", "callback_query", "channel_post"];
const PARSE_MODE: &str = "HTML";

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{method} rejected: {description}")]
    Api { method: String, description: String },
    #[error("{0} returned no result")]
    MissingResult(String),
}

#[async_trait]
pub trait BotApi: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError>;

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError>;
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    // Carries the token, never logged.
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self, TelegramError> {
        // Must outlive the getUpdates long-poll timeout.
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TelegramError::Http(e.without_url()))?;
        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    async fn call<T, B>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!(method, "calling Bot API");
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?
            .json()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        if !response.ok {
            return Err(TelegramError::Api {
                method: method.to_string(),
                description: response
                    .description
                    .unwrap_or_else(|| "no description".into()),
            });
        }

        response
            .result
            .ok_or_else(|| TelegramError::MissingResult(method.to_string()))
    }

    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "setWebhook",
                &SetWebhookRequest {
                    url,
                    secret_token: secret,
                    allowed_updates: &ALLOWED_UPDATES,
                },
            )
            .await?;
        info!(url, "webhook registered");
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let _: bool = self
            .call("deleteWebhook", &serde_json::json!({}))
            .await?;
        info!("webhook removed");
        Ok(())
    }

    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdatesRequest {
                offset,
                timeout,
                allowed_updates: &ALLOWED_UPDATES,
            },
        )
        .await
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessageRequest {
                    chat_id,
                    text,
                    parse_mode: PARSE_MODE,
                    disable_web_page_preview: true,
                    reply_markup: keyboard,
                },
            )
            .await?;
        Ok(())
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        // Returns the edited message, or `true` for inline messages.
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageTextRequest {
                    chat_id,
                    message_id,
                    text,
                    parse_mode: PARSE_MODE,
                    disable_web_page_preview: true,
                    reply_markup: keyboard,
                },
            )
            .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQueryRequest { callback_query_id },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_does_not_leak_token() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:secret").unwrap();
        assert_eq!(client.base_url, "https://api.telegram.org/bot123:secret");

        let err = TelegramError::Api {
            method: "sendMessage".into(),
            description: "Bad Request: chat not found".into(),
        };
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn envelope_parses_failures() {
        let response: ApiResponse<bool> = serde_json::from_str(
            r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#,
        )
        .unwrap();
        assert!(!response.ok);
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
        assert!(response.result.is_none());
    }

    #[test]
    fn get_me_result_exposes_username() {
        let response: ApiResponse<User> = serde_json::from_str(
            r#"{"ok":true,"result":{"id":42,"is_bot":true,"username":"GuidesBot"}}"#,
        )
        .unwrap();
        let me = response.result.unwrap();
        assert_eq!(me.id, 42);
        assert_eq!(me.username.as_deref(), Some("GuidesBot"));
    }
}
