use crate::domain::channel_post::ChannelName;
use crate::domain::guide::Guide;
use crate::domain::title::ellipsize;
use crate::presentation::dto::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const SHOW_GUIDES: &str = "show_guides";
pub const BACK_TO_START: &str = "back_to_start";

// In UTF-16 code units.
pub const MESSAGE_LIMIT: usize = 4096;
const LISTING_TITLE_CHARS: usize = 60;

pub const NO_GUIDES_TEXT: &str = "🤷 No guides found yet (0 guides).\n\n\
     Try again later, or check whether anything was posted in the channel.";
pub const FAILURE_TEXT: &str =
    "⚠️ Something went wrong while loading the guides. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Guides,
}

impl Command {
    /// Recognises `/start`, `/help`, `/guides` and `/מדריכים`. A
    /// `/command@BotName` suffix must name this bot; while the bot's own
    /// username is unknown, addressed commands are left alone.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let command = word.strip_prefix('/')?;
        let (name, addressee) = match command.split_once('@') {
            Some((name, addressee)) => (name, Some(addressee)),
            None => (command, None),
        };
        if let Some(addressee) = addressee {
            if !bot_username.is_some_and(|me| me.eq_ignore_ascii_case(addressee)) {
                return None;
            }
        }
        match name.to_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "guides" | "מדריכים" => Some(Command::Guides),
            _ => None,
        }
    }
}

pub fn start_text(channel: &ChannelName) -> String {
    format!(
        "👋 Welcome to {}!\n\n\
         If this is your first time here, this is the place to start.\n\n\
         What you'll find:\n\
         📌 Practical guides\n\
         🧰 Recommended tools for AI and Android\n\
         💡 Ideas for real projects\n\n\
         Pick an option below ⬇️",
        escape_html(&channel.to_string())
    )
}

pub fn start_keyboard(channel: &ChannelName) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![InlineKeyboardButton::callback("📚 All guides", SHOW_GUIDES)],
            vec![InlineKeyboardButton::link(
                "📣 Open the channel",
                format!("https://t.me/{}", channel.as_str()),
            )],
        ],
    }
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::callback(
            "⬅️ Back",
            BACK_TO_START,
        )]],
    }
}

pub fn render_listing(guides: &[Guide], channel: &ChannelName) -> Vec<String> {
    if guides.is_empty() {
        return vec![NO_GUIDES_TEXT.to_string()];
    }

    let header = "📚 <b>All our guides:</b>\n\n".to_string();
    let footer = format!("📊 <b>Total: {} guides</b>", guides.len());

    let mut chunks = Vec::new();
    let mut current = header;
    for guide in guides {
        let entry = format!(
            "• {}\n🔗 {}\n\n",
            escape_html(&ellipsize(&guide.title, LISTING_TITLE_CHARS)),
            channel.post_link(guide.message_id)
        );
        if utf16_len(&current) + utf16_len(&entry) > MESSAGE_LIMIT {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(&entry);
    }

    if utf16_len(&current) + utf16_len(&footer) > MESSAGE_LIMIT {
        chunks.push(std::mem::take(&mut current));
    }
    current.push_str(&footer);
    chunks.push(current);
    chunks
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}
