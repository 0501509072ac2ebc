use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use threadmark_common::DirectoryEntityKind;

use super::codec::unescape;

/// `@code`, `@org/code` or `@group/code`, the code running to the next
/// whitespace.
pub static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(?:(org|group)/)?(\S+)").unwrap());

/// A mention token found in a piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionToken<'t> {
    pub kind: DirectoryEntityKind,
    /// The code as written in the text
    pub escaped_code: &'t str,
    /// Byte range of the whole token, `@` included
    pub range: Range<usize>,
}

impl<'t> MentionToken<'t> {
    fn from_captures(caps: &Captures<'t>) -> Option<Self> {
        let whole = caps.get(0)?;
        let code = caps.get(2)?;
        let kind = caps
            .get(1)
            .map(|tag| DirectoryEntityKind::from_tag(tag.as_str()))
            .unwrap_or(DirectoryEntityKind::User);
        Some(Self {
            kind,
            escaped_code: code.as_str(),
            range: whole.range(),
        })
    }

    /// The raw directory code
    pub fn code(&self) -> Cow<'t, str> {
        unescape(self.escaped_code)
    }
}

/// All mention tokens in `text`, left to right, non-overlapping.
pub fn scan_mentions(text: &str) -> impl Iterator<Item = MentionToken<'_>> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| MentionToken::from_captures(&caps))
}

/// Replace every mention token, keeping the text in between.
///
/// `replace` returns `None` to leave a token exactly as written.
pub fn replace_mentions<'t, F>(text: &'t str, mut replace: F) -> Cow<'t, str>
where
    F: FnMut(&MentionToken<'t>) -> Option<String>,
{
    let mut out: Option<String> = None;
    let mut last = 0;
    for token in scan_mentions(text) {
        if let Some(replacement) = replace(&token) {
            let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
            buf.push_str(&text[last..token.range.start]);
            buf.push_str(&replacement);
            last = token.range.end;
        }
    }
    match out {
        Some(mut buf) => {
            buf.push_str(&text[last..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}
