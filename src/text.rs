use crate::catalog;
use crate::model::ReflectionEntry;
use once_cell::sync::Lazy;
use regex::Regex;

pub const ELLIPSIS: &str = "...";
pub const EXCERPT_CHARS: usize = 80;
pub const FALLBACK_EXCERPT_CHARS: usize = 60;
const KEYWORD_CHARS_BEFORE: usize = 15;
const KEYWORD_CHARS_AFTER: usize = 30;
const MIN_TOKEN_CHARS: usize = 2;

// Anything that is not a letter, combining mark or digit separates tokens.
static RE_TOKEN_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^\p{L}\p{M}\p{N}]+").unwrap()
});

/// Longest prefix of `s` holding at most `max_chars` characters.
pub fn prefix_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// `prefix...`, the ellipsis is appended even when nothing was cut.
pub fn excerpt(s: &str, max_chars: usize) -> String {
    format!("{}{ELLIPSIS}", prefix_chars(s, max_chars))
}

/// Excerpt of the first non-empty answer, or an empty string for an entry with no answers.
pub fn first_answer_excerpt(entry: &ReflectionEntry) -> String {
    entry.first_answer().map(|a| excerpt(a, EXCERPT_CHARS)).unwrap_or_default()
}

/// Tokens worth counting as keywords: at least two characters, not a stopword.
pub fn keywords(text: &str) -> impl Iterator<Item = &str> {
    RE_TOKEN_SEPARATOR
        .split(text)
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS && !catalog::is_stopword(t))
}

/// Context around the first occurrence of `word`: 15 characters before, 30 after.
/// Falls back to a plain prefix when the word is absent.
pub fn keyword_excerpt(text: &str, word: &str) -> String {
    let Some(pos) = text.find(word).filter(|_| !word.is_empty()) else {
        return excerpt(text, FALLBACK_EXCERPT_CHARS);
    };
    let start = text[..pos]
        .char_indices()
        .rev()
        .nth(KEYWORD_CHARS_BEFORE - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let after = pos + word.len();
    let end = text[after..]
        .char_indices()
        .nth(KEYWORD_CHARS_AFTER)
        .map(|(i, _)| after + i)
        .unwrap_or(text.len());
    format!("{ELLIPSIS}{}{ELLIPSIS}", &text[start..end])
}
