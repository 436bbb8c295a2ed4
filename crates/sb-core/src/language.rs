//! Forum language filter.
//!
//! Text may contain Latin letters, digits, punctuation, whitespace and
//! emoji. Hangul, kana and CJK ideograph blocks are rejected.

use crate::error::{ForumError, Result};
use regex::Regex;
use std::sync::OnceLock;

const DISALLOWED_SCRIPTS: &str = concat!(
    "[",
    r"\x{1100}-\x{11FF}", // Hangul Jamo
    r"\x{3130}-\x{318F}", // Hangul Compatibility Jamo
    r"\x{AC00}-\x{D7AF}", // Hangul Syllables
    r"\x{3040}-\x{309F}", // Hiragana
    r"\x{30A0}-\x{30FF}", // Katakana
    r"\x{31F0}-\x{31FF}", // Katakana Phonetic Extensions
    r"\x{2E80}-\x{2EFF}", // CJK Radicals Supplement
    r"\x{3000}-\x{303F}", // CJK Symbols and Punctuation
    r"\x{3400}-\x{4DBF}", // CJK Unified Ideographs Extension A
    r"\x{4E00}-\x{9FFF}", // CJK Unified Ideographs
    r"\x{F900}-\x{FAFF}", // CJK Compatibility Ideographs
    "]",
);

fn disallowed() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(DISALLOWED_SCRIPTS).expect("static pattern compiles"))
}

/// Empty text is accepted.
pub fn is_english_only(text: &str) -> bool {
    text.is_empty() || !disallowed().is_match(text)
}

/// Rejects `text` with a message naming `field`.
pub fn ensure_english_only(field: &str, text: &str) -> Result<()> {
    if is_english_only(text) {
        Ok(())
    } else {
        Err(ForumError::Validation(format!(
            "{field} must be written in English (no Korean, Japanese or Chinese characters)"
        )))
    }
}
