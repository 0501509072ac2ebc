//! Percent-escaping for directory codes embedded in Markdown.
//!
//! Directory codes may contain spaces, `@` (guest users are addressed by
//! email), and characters that Markdown would read as emphasis, list or link
//! syntax. Mention tokens carry the code escaped so the token survives the
//! Markdown parser untouched and ends at the first whitespace.

use std::borrow::Cow;
use std::fmt::Write;

use threadmark_common::DirectoryEntityKind;

/// Always escaped: token terminators and HTML-significant characters.
const ALWAYS_ESCAPED: [char; 10] = [' ', '@', '%', '&', '\'', '"', '<', '>', '*', '+'];

/// Escaped only when they do not follow a word character, where Markdown
/// would otherwise pick them up as syntax.
const ESCAPED_AFTER_NON_WORD: [char; 9] = [' ', '_', '~', '!', '[', ']', '|', '\\', '-'];

#[inline]
fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[inline]
fn push_percent(out: &mut String, ch: char) {
    // only ever called with ASCII
    let _ = write!(out, "%{:02x}", ch as u32);
}

/// Escape a directory code for use inside a mention token.
pub fn escape(code: &str) -> String {
    let mut first = String::with_capacity(code.len());
    for ch in code.chars() {
        if ALWAYS_ESCAPED.contains(&ch) {
            push_percent(&mut first, ch);
        } else {
            first.push(ch);
        }
    }

    // Second pass looks at the output of the first, so `%40_` keeps its
    // underscore: it now follows the hex digit `0`.
    let mut out = String::with_capacity(first.len());
    let mut prev: Option<char> = None;
    for ch in first.chars() {
        if ESCAPED_AFTER_NON_WORD.contains(&ch) && !prev.is_some_and(is_word_char) {
            push_percent(&mut out, ch);
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    out
}

/// Reverse [`escape`]. Every `%XX` hex pair becomes the character with that
/// code point; a `%` not followed by two hex digits is kept as-is.
pub fn unescape(escaped: &str) -> Cow<'_, str> {
    if !escaped.contains('%') {
        return Cow::Borrowed(escaped);
    }

    let bytes = escaped.as_bytes();
    let mut out = String::with_capacity(escaped.len());
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push_str(&escaped[last..i]);
                out.push(char::from(hi << 4 | lo));
                i += 3;
                last = i;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&escaped[last..]);
    Cow::Owned(out)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Build the canonical mention token for an entity.
///
/// ```ignore
/// assert_eq!(create_mention_token(DirectoryEntityKind::User, "jane doe"), "@jane%20doe");
/// assert_eq!(create_mention_token(DirectoryEntityKind::Organization, "eng"), "@org/eng");
/// ```
pub fn create_mention_token(kind: DirectoryEntityKind, code: &str) -> String {
    match kind.token_tag() {
        None => format!("@{}", escape(code)),
        Some(tag) => format!("@{}/{}", tag, escape(code)),
    }
}
