//! `:shortcode:` to emoji substitution, using the GitHub shortcode table.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([-+]?[A-Za-z0-9_]+):").unwrap());

/// Replace every known `:name:` with its glyph.
///
/// Unknown names are left exactly as written.
pub fn replace_emoji(text: &str) -> Cow<'_, str> {
    if !text.contains(':') {
        return Cow::Borrowed(text);
    }
    SHORTCODE_RE.replace_all(text, |caps: &Captures<'_>| {
        match emojis::get_by_shortcode(&caps[1]) {
            Some(emoji) => emoji.as_str().to_string(),
            None => caps[0].to_string(),
        }
    })
}

/// Looks up a single shortcode, without the colons.
pub fn emoji_for(name: &str) -> Option<&'static str> {
    emojis::get_by_shortcode(name).map(|emoji| emoji.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_shortcodes() {
        assert_eq!(replace_emoji("LGTM :+1: :tada:"), "LGTM 👍 🎉");
        assert_eq!(replace_emoji(":smile::smile:"), "😄😄");
    }

    #[test]
    fn unknown_shortcodes_pass_through() {
        assert_eq!(replace_emoji(":not_an_emoji_at_all:"), ":not_an_emoji_at_all:");
        assert_eq!(replace_emoji("at 10:30:00"), "at 10:30:00");
        assert_eq!(replace_emoji(":smile"), ":smile");
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(replace_emoji("no colons here"), Cow::Borrowed(_)));
    }

    #[test]
    fn single_lookup() {
        assert_eq!(emoji_for("rocket"), Some("🚀"));
        assert_eq!(emoji_for("nope_nope"), None);
    }
}
