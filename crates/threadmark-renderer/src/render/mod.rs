//! Markdown to inline-styled HTML for the host's comment box.

use pulldown_cmark::{Options, Parser, TextMergeStream};
use pulldown_cmark_escape::{StrWrite, escape_html_body_text};
use serde::Deserialize;
use threadmark_common::{FileLinks, HostFileLinks};

use crate::mention::{MentionLinkOptions, MentionSubstitute};
use crate::utils::unescape_html_entities;

pub mod styles;
mod writer;

#[cfg(test)]
mod tests;

pub use writer::CommentWriter;

const CHECKBOX_ICON_BASE_URL: &str = "https://static.cybozu.com/contents/k/image/argo/form/";

/// Renderer knobs
///
/// Everything defaults to what the host page expects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Render single newlines inside a paragraph as `<br>`
    pub breaks: bool,
    pub checkbox_checked_url: String,
    pub checkbox_unchecked_url: String,
    /// Class the host gives links to uploaded files
    pub tmp_file_class: String,
    /// Class that keeps the host from attaching its link preview bubble
    pub no_link_bubble_class: String,
    pub mention_links: MentionLinkOptions,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            breaks: true,
            checkbox_checked_url: format!("{CHECKBOX_ICON_BASE_URL}checkbox-checked.png"),
            checkbox_unchecked_url: format!("{CHECKBOX_ICON_BASE_URL}checkbox.png"),
            tmp_file_class: "cybozu-tmp-file".to_string(),
            no_link_bubble_class: "ocean-ui-plugin-linkbubble-no".to_string(),
            mention_links: MentionLinkOptions::default(),
        }
    }
}

/// Parser extensions comments are written with: tables, strikethrough and
/// task lists.
pub fn default_md_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// A fenced or indented code block, highlighted when possible.
///
/// `already_escaped` input has its HTML entities decoded first. The language
/// is resolved through the alias table and falls back to plain text; any
/// highlighting failure falls back to the escaped code.
pub fn render_code_block(code: &str, lang: Option<&str>, already_escaped: bool) -> String {
    let code = if already_escaped {
        unescape_html_entities(code)
    } else {
        code.into()
    };

    let mut out = String::with_capacity(code.len() * 2 + 256);
    out.push_str("<pre style=\"");
    out.push_str(styles::PRE);
    out.push_str("\"><code style=\"");
    out.push_str(&styles::code_block());
    out.push_str("\">");
    write_code_body(&mut out, &code, lang);
    out.push_str("</code></pre>");
    out
}

#[cfg(feature = "syntax-highlighting")]
fn write_code_body(out: &mut String, code: &str, lang: Option<&str>) {
    let mut highlighted = String::new();
    match crate::highlight::highlight(&crate::highlight::SYNTAX_SET, lang, code, &mut highlighted)
    {
        Ok(()) => out.push_str(&highlighted),
        Err(error) => {
            tracing::warn!("highlighting failed, writing plain code: {error}");
            let _ = escape_html_body_text(out, code);
        }
    }
}

#[cfg(not(feature = "syntax-highlighting"))]
fn write_code_body(out: &mut String, code: &str, _lang: Option<&str>) {
    let _ = escape_html_body_text(out, code);
}

/// Renders comment Markdown, bound to one mention substituter and one set of
/// file links
pub struct MarkdownRenderer<M, F = HostFileLinks> {
    mentions: M,
    files: F,
    options: RenderOptions,
}

impl<M: MentionSubstitute, F: FileLinks> MarkdownRenderer<M, F> {
    pub fn new(mentions: M, files: F) -> Self {
        Self {
            mentions,
            files,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn mentions(&self) -> &M {
        &self.mentions
    }

    pub fn files(&self) -> &F {
        &self.files
    }

    /// Render to a string. Never fails: unresolvable references come out as
    /// plain text.
    pub fn render(&self, markdown: &str) -> String {
        let mut out = String::with_capacity(markdown.len() * 2);
        // writing into a String cannot fail
        let _ = self.render_to(markdown, &mut out);
        out
    }

    pub fn render_to<W: StrWrite>(&self, markdown: &str, writer: W) -> Result<W, W::Error> {
        let parser = TextMergeStream::new(Parser::new_ext(markdown, default_md_options()));
        CommentWriter::new(parser, writer, &self.mentions, &self.files, &self.options).run()
    }
}
