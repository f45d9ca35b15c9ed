//! Comment text sanitization.
//!
//! Raw comment text arrives with pictographs the text analysis APIs reject and
//! with escape sequences left behind by JSON-to-string conversion upstream.

use tunesense_core::{Comment, RawComment};

/// Comments this short carry no sentiment.
const MIN_COMMENT_CHARS: usize = 2;

/// Characters removed before text reaches an analysis provider: the copyright
/// and registered marks, the symbol/pictograph block U+2000..=U+3300, and the
/// emoji planes addressed by the surrogate leads D83C, D83D and D83E.
pub fn is_blacklisted(c: char) -> bool {
    matches!(c, '\u{00A9}' | '\u{00AE}' | '\u{2000}'..='\u{3300}' | '\u{1F000}'..='\u{1FBFF}')
}

/// Apply the text rewrites in order: blacklist, `\n` unescape, one pair of
/// wrapping quotes, `\"` unescape.
pub fn normalize_text(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !is_blacklisted(*c)).collect();
    let unescaped = stripped.replace("\\n", "\n");

    let trimmed = unescaped.strip_prefix('"').unwrap_or(&unescaped);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);

    trimmed.replace("\\\"", "\"")
}

/// Normalize one comment, or `None` when the result is too short to keep.
pub fn normalize_comment(raw: &RawComment) -> Option<Comment> {
    let text = normalize_text(&raw.text);
    if text.chars().count() < MIN_COMMENT_CHARS {
        return None;
    }

    Some(Comment {
        text,
        like_count: raw.like_count,
    })
}

/// Normalize a batch, preserving order and dropping rejected comments.
pub fn normalize_comments(raw: &[RawComment]) -> Vec<Comment> {
    let accepted: Vec<Comment> = raw.iter().filter_map(normalize_comment).collect();

    let dropped = raw.len() - accepted.len();
    if dropped > 0 {
        log::debug!("Dropped {} of {} comments during normalization", dropped, raw.len());
    }

    accepted
}
