pub const MAX_TITLE_CHARS: usize = 100;
const FALLBACK_CHARS: usize = 50;

const SKIPPED_PREFIXES: [&str; 4] = ["#", "@", "https://", "http://"];

/// Lines that are only hashtags, mentions or links are passed over. Returns
/// `None` only for blank input.
pub fn extract_title(text: &str) -> Option<String> {
    let text = text.trim();

    for line in text.lines() {
        let cleaned: String = line.chars().filter(|c| !is_pictograph(*c)).collect();
        let cleaned = cleaned.trim();
        if !cleaned.is_empty() && !SKIPPED_PREFIXES.iter().any(|p| cleaned.starts_with(p)) {
            return Some(truncate_chars(cleaned, MAX_TITLE_CHARS).to_string());
        }
    }

    let fallback = ellipsize(text, FALLBACK_CHARS);
    if fallback.is_empty() {
        None
    } else {
        Some(fallback)
    }
}

pub fn ellipsize(text: &str, max: usize) -> String {
    let cut = truncate_chars(text, max);
    if cut.len() < text.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// Supplementary pictographs plus the joiners emoji sequences leave behind.
fn is_pictograph(c: char) -> bool {
    matches!(c as u32, 0x1F000..=0x1FFFF | 0xFE0F | 0x200D)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_first_line_without_emoji() {
        let text = "🧹 How to clear the cache on Samsung\nStep one: open settings.";
        assert_eq!(
            extract_title(text).as_deref(),
            Some("How to clear the cache on Samsung")
        );
    }

    #[test]
    fn skips_hashtag_mention_and_link_lines() {
        let text = "#android #tips\n@someone\nhttps://example.com\n🧠 What ChatGPT remembers";
        assert_eq!(
            extract_title(text).as_deref(),
            Some("What ChatGPT remembers")
        );
    }

    #[test]
    fn skips_lines_that_are_only_emoji() {
        let text = "🔥🔥🔥\n\nReal heading here";
        assert_eq!(extract_title(text).as_deref(), Some("Real heading here"));
    }

    #[test]
    fn long_lines_are_cut_to_one_hundred_characters() {
        let text = "x".repeat(150);
        let title = extract_title(&text).unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn falls_back_to_text_start_when_no_line_qualifies() {
        let text = format!("#{}", "tag".repeat(30));
        let title = extract_title(&text).unwrap();
        assert_eq!(title, format!("{}...", truncate_chars(&text, 50)));
    }

    #[test]
    fn short_fallback_is_kept_whole() {
        assert_eq!(extract_title("#tag @who").as_deref(), Some("#tag @who"));
    }

    #[test]
    fn blank_text_has_no_title() {
        assert_eq!(extract_title("   \n "), None);
    }

    #[test]
    fn ellipsize_respects_char_boundaries() {
        assert_eq!(ellipsize("שלום עולם", 4), "שלום...");
        assert_eq!(ellipsize("short", 10), "short");
    }
}
