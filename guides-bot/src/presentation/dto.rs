use crate::domain::channel_post::{ChannelPost, PostContent};
use crate::domain::guide::Guide;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ======================= TELEGRAM: INBOUND =======================

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub channel_post: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub date: i64,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub poll: Option<serde_json::Value>,
    pub forward_from_chat: Option<Chat>,
    pub forward_origin: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub username: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub data: Option<String>,
    pub message: Option<Message>,
}

impl Message {
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    pub fn is_forward(&self) -> bool {
        self.forward_from_chat.is_some() || self.forward_origin.is_some()
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.date, 0).unwrap_or_else(Utc::now)
    }

    pub fn to_channel_post(&self) -> ChannelPost {
        let content = if self.poll.is_some() {
            PostContent::Poll
        } else if self.is_forward() {
            PostContent::Forward {
                text: self.body().map(str::to_string),
            }
        } else {
            match self.body() {
                Some(text) => PostContent::Text(text.to_string()),
                None => PostContent::Other,
            }
        };

        ChannelPost {
            message_id: self.message_id,
            chat_username: self.chat.username.clone(),
            date: self.sent_at(),
            content,
        }
    }
}

// ======================= TELEGRAM: OUTBOUND =======================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: &str, data: &str) -> Self {
        Self {
            text: text.to_string(),
            url: None,
            callback_data: Some(data.to_string()),
        }
    }

    pub fn link(text: &str, url: String) -> Self {
        Self {
            text: text.to_string(),
            url: Some(url),
            callback_data: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub struct EditMessageTextRequest<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQueryRequest<'a> {
    pub callback_query_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SetWebhookRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<&'a str>,
    pub allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
pub struct GetUpdatesRequest<'a> {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

// ======================= HTTP API =======================

#[derive(Debug, Deserialize)]
pub struct ListGuidesQuery {
    pub limit: Option<i64>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListGuidesResponse {
    pub guides: Vec<Guide>,
    pub total: usize,
}
