use std::borrow::Cow;

/// Decode the five entities `escape_html` produces.
///
/// `&amp;` goes last so `&amp;lt;` comes out as `&lt;`, not `<`.
pub fn unescape_html_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&"),
    )
}
