use thiserror::Error;

use crate::domain::channel_post::{ChannelPost, PostContent};

pub const MIN_POST_CHARS: usize = 50;
pub const SKIP_MARKER: &str = "#skip";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("post comes from another chat")]
    ForeignChannel,
    #[error("post is a poll")]
    Poll,
    #[error("forward without added text")]
    BareForward,
    #[error("post has no text")]
    NoText,
    #[error("post is marked #skip")]
    SkipMarker,
    #[error("post is too short ({0} < 50 characters)")]
    TooShort(usize),
    #[error("no title could be extracted")]
    NoTitle,
}

pub fn accept(post: &ChannelPost) -> Result<&str, Rejection> {
    let text = match &post.content {
        PostContent::Poll => return Err(Rejection::Poll),
        PostContent::Other => return Err(Rejection::NoText),
        PostContent::Forward { text } => match text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(Rejection::BareForward),
        },
        PostContent::Text(text) => text.as_str(),
    };

    if text.to_lowercase().contains(SKIP_MARKER) {
        return Err(Rejection::SkipMarker);
    }

    let length = text.trim().chars().count();
    if length < MIN_POST_CHARS {
        return Err(Rejection::TooShort(length));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(content: PostContent) -> ChannelPost {
        ChannelPost {
            message_id: 42,
            chat_username: Some("guides".into()),
            date: Utc::now(),
            content,
        }
    }

    fn text_post(text: &str) -> ChannelPost {
        post(PostContent::Text(text.to_string()))
    }

    #[test]
    fn rejects_anything_shorter_than_fifty_characters() {
        for len in [0, 1, 10, 49] {
            let post = text_post(&"a".repeat(len));
            assert_eq!(accept(&post), Err(Rejection::TooShort(len)));
        }
        let forwarded = post(PostContent::Forward {
            text: Some("x".repeat(49)),
        });
        assert!(accept(&forwarded).is_err());
    }

    #[test]
    fn accepts_exactly_fifty_characters() {
        let text = "b".repeat(50);
        assert_eq!(accept(&text_post(&text)), Ok(text.as_str()));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 49 Hebrew letters take 98 bytes but are still too short.
        let text = "א".repeat(49);
        assert_eq!(accept(&text_post(&text)), Err(Rejection::TooShort(49)));
        assert!(accept(&text_post(&"א".repeat(50))).is_ok());
    }

    #[test]
    fn surrounding_whitespace_does_not_count() {
        let text = format!("   {}\n\n", "c".repeat(49));
        assert_eq!(accept(&text_post(&text)), Err(Rejection::TooShort(49)));
    }

    #[test]
    fn rejects_skip_marker_in_any_case() {
        let long = "d".repeat(80);
        for marker in ["#skip", "#SKIP", "#Skip"] {
            let text = format!("{long} {marker}");
            assert_eq!(accept(&text_post(&text)), Err(Rejection::SkipMarker));
        }
    }

    #[test]
    fn rejects_polls() {
        assert_eq!(accept(&post(PostContent::Poll)), Err(Rejection::Poll));
    }

    #[test]
    fn rejects_bare_forwards() {
        assert_eq!(
            accept(&post(PostContent::Forward { text: None })),
            Err(Rejection::BareForward)
        );
        assert_eq!(
            accept(&post(PostContent::Forward {
                text: Some("   ".into())
            })),
            Err(Rejection::BareForward)
        );
    }

    #[test]
    fn forward_with_enough_text_is_accepted() {
        let text = "Forwarded guide with a proper explanation attached to it.";
        let forwarded = post(PostContent::Forward {
            text: Some(text.into()),
        });
        assert_eq!(accept(&forwarded), Ok(text));
    }

    #[test]
    fn rejects_posts_without_text() {
        assert_eq!(accept(&post(PostContent::Other)), Err(Rejection::NoText));
    }
}
