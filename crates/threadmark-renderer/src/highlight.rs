//! Code block highlighting with inline styles.
//!
//! syntect emits `<span class="...">` per scope. The host strips class
//! attributes, so every span's classes are folded into a `style` attribute
//! through [`SCOPE_STYLES`], and spans with no mapping lose their class.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

pub const CSS_PREFIX: &str = "hljs-";

pub static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Short names people write after the fence, and the language they mean.
pub const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("zsh", "bash"),
    ("sh", "bash"),
    ("c++", "cpp"),
    ("html", "xml"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("kt", "kotlin"),
    ("yaml", "yml"),
];

/// Languages without a bundled grammar, highlighted with a close relative.
const GRAMMAR_FALLBACKS: &[(&str, &str)] = &[("typescript", "js"), ("kotlin", "java")];

const RED: &str = "color: #d91e18;";
const ORANGE: &str = "color: #aa5d00;";
const YELLOW: &str = "color: #ffd700;";
const GREEN: &str = "color: #008000;";
const BLUE: &str = "color: #007faa;";
const PURPLE: &str = "color: #7928a1;";
const GRAY: &str = "color: #696969;";

/// Inline style per scope prefix. The longest matching prefix wins; an empty
/// style leaves the span unstyled.
pub const SCOPE_STYLES: &[(&str, &str)] = &[
    ("comment", GRAY),
    ("string", GREEN),
    ("string.regexp", RED),
    ("constant", ORANGE),
    ("constant.character.escape", GREEN),
    ("keyword", PURPLE),
    ("keyword.operator", ""),
    ("storage", PURPLE),
    ("entity.name", BLUE),
    ("entity.name.tag", RED),
    ("entity.other.inherited-class", BLUE),
    ("entity.other.attribute-name", YELLOW),
    ("support", ORANGE),
    ("variable", RED),
    ("variable.other", ""),
    ("variable.parameter", ""),
    ("variable.language", ORANGE),
    ("punctuation.definition.tag", RED),
    ("markup.heading", BLUE),
    ("markup.bold", "font-weight: bold;"),
    ("markup.italic", "font-style: italic;"),
    ("markup.inserted", GREEN),
    ("markup.deleted", RED),
    ("markup.list", GREEN),
    ("markup.underline.link", ORANGE),
    ("meta.preprocessor", ORANGE),
];

static SPAN_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span class="([^"]*)">"#).unwrap());

fn find_syntax<'s>(syntax_set: &'s SyntaxSet, lang: &str) -> Option<&'s SyntaxReference> {
    syntax_set.find_syntax_by_token(lang).or_else(|| {
        GRAMMAR_FALLBACKS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(lang))
            .and_then(|(_, token)| syntax_set.find_syntax_by_token(token))
    })
}

/// The language a fence info string resolves to.
///
/// A language the highlighter knows is kept as written, otherwise the alias
/// table is consulted, and anything else is `plaintext`.
pub fn canonical_language(lang: &str) -> &str {
    if !lang.is_empty() && find_syntax(&SYNTAX_SET, lang).is_some() {
        return lang;
    }
    LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lang)
        .map(|(_, canonical)| *canonical)
        .unwrap_or("plaintext")
}

/// Style for a span's class list, `None` when nothing maps.
pub fn scope_style(classes: &str) -> Option<&'static str> {
    let atoms: Vec<&str> = classes
        .split_ascii_whitespace()
        .map(|class| class.strip_prefix(CSS_PREFIX).unwrap_or(class))
        .collect();
    (1..=atoms.len())
        .rev()
        .find_map(|n| {
            let scope = atoms[..n].join(".");
            SCOPE_STYLES
                .iter()
                .find(|(prefix, _)| *prefix == scope)
                .map(|(_, style)| *style)
        })
        .filter(|style| !style.is_empty())
}

/// Rewrite syntect's classed spans to inline-styled ones.
pub fn inline_styles(classed: &str) -> String {
    SPAN_CLASS_RE
        .replace_all(classed, |caps: &Captures<'_>| match scope_style(&caps[1]) {
            Some(style) => format!("<span style=\"{style}\">"),
            None => "<span>".to_string(),
        })
        .into_owned()
}

/// Highlight `code` and append inline-styled HTML to `out`.
///
/// Only the highlighted body is written, the caller owns the surrounding
/// `<pre><code>`. On error nothing is appended.
pub fn highlight(
    syntax_set: &SyntaxSet,
    lang: Option<&str>,
    code: &str,
    out: &mut String,
) -> Result<(), syntect::Error> {
    let lang = canonical_language(lang.unwrap_or_default());
    let syntax = find_syntax(syntax_set, lang).unwrap_or_else(|| syntax_set.find_syntax_plain_text());
    tracing::trace!(lang, syntax = %syntax.name, "highlighting code block");

    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        syntax_set,
        ClassStyle::SpacedPrefixed { prefix: CSS_PREFIX },
    );
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    out.push_str(&inline_styles(&generator.finalize()));
    Ok(())
}
