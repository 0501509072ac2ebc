//! Tests for the comment writer

use threadmark_common::{DirectoryEntity, DirectoryEntityKind, HostFileLinks, StaticDirectory};

use super::*;
use crate::mention::{MentionResolver, create_mention_token};

/// Helper: Render markdown with no mentions and the default host links
fn render_markdown(input: &str) -> String {
    MarkdownRenderer::new((), HostFileLinks::default()).render(input)
}

fn p(inner: &str) -> String {
    format!("<p style=\"{}\">{inner}</p>", styles::PARAGRAPH)
}

fn directory() -> StaticDirectory {
    StaticDirectory::from_entities([
        DirectoryEntity::new(DirectoryEntityKind::User, "1", "jane_doe", "Jane Doe"),
        DirectoryEntity::new(DirectoryEntityKind::User, "8", "_x_y_", "Underscored"),
        DirectoryEntity::new(DirectoryEntityKind::Organization, "2", "eng-team", "Engineering"),
    ])
}

// =============================================================================
// Block elements
// =============================================================================

#[test]
fn test_paragraph_rendering() {
    let output = render_markdown("Hello world\n\nSecond");
    assert_eq!(output, format!("{}{}", p("Hello world"), p("Second")));
}

#[test]
fn test_heading_rendering() {
    let output = render_markdown("# Title\n\n### Small");
    assert_eq!(
        output,
        "<h1 style=\"font-size: 1.8em; font-weight: bold; line-height: 1.55em; margin: 11px 0; \
         border-bottom: 1px solid #ddd;\">Title</h1>\
         <h3 style=\"font-size: 1.4em; font-weight: bold; line-height: 1.45em; margin: 9px 0;\">Small</h3>"
    );
}

#[test]
fn test_blockquote_rendering() {
    let output = render_markdown("> quoted");
    assert_eq!(
        output,
        format!(
            "<blockquote style=\"border-left: .25em solid #dfe2e5; color: #6a737d; margin: 0; \
             padding: 0 1em;\">{}</blockquote>",
            p("quoted")
        )
    );
}

#[test]
fn test_soft_breaks_become_br() {
    assert_eq!(render_markdown("one\ntwo"), p("one<br>two"));

    let renderer = MarkdownRenderer::new((), HostFileLinks::default()).with_options(RenderOptions {
        breaks: false,
        ..Default::default()
    });
    assert_eq!(renderer.render("one\ntwo"), p("one\ntwo"));
}

#[test]
fn test_hard_break_and_rule() {
    assert_eq!(render_markdown("one  \ntwo\n\n---"), format!("{}<hr>", p("one<br>two")));
}

#[test]
fn test_front_matter_is_ordinary_markdown() {
    let output = render_markdown("---\ntitle: x\n---\n\nbody");
    assert!(output.starts_with("<hr>"), "{output}");
    assert!(output.contains("title: x"), "{output}");
    assert!(output.ends_with(&p("body")), "{output}");

    let output = render_markdown("+++\ntitle = 1\n+++");
    assert!(output.starts_with("<p"), "{output}");
    assert!(output.contains("title = 1"), "{output}");
}

#[test]
fn test_ordered_list_start() {
    let item = "<li style=\"text-indent: 0;\">";
    assert_eq!(
        render_markdown("3. a\n4. b"),
        format!("<ol start=\"3\">{item}a</li>{item}b</li></ol>")
    );
    assert_eq!(
        render_markdown("1. a"),
        format!("<ol>{item}a</li></ol>")
    );
}

// =============================================================================
// Task lists
// =============================================================================

const TASK_ITEM: &str = "<li style=\"list-style-type: none; text-indent: -19px;\">";
const UNCHECKED: &str = "<img width=\"10\" height=\"10\" \
    src=\"https://static.cybozu.com/contents/k/image/argo/form/checkbox.png\" alt=\"unchecked\" \
    style=\"margin: 0 4px;\">";
const CHECKED: &str = "<img width=\"10\" height=\"10\" \
    src=\"https://static.cybozu.com/contents/k/image/argo/form/checkbox-checked.png\" alt=\"checked\" \
    style=\"margin: 0 4px;\">";

#[test]
fn test_tight_task_list() {
    let output = render_markdown("- [ ] todo\n- [x] done\n- plain");
    assert_eq!(
        output,
        format!(
            "<ul>{TASK_ITEM}{UNCHECKED}todo</li>{TASK_ITEM}{CHECKED}done</li>\
             <li style=\"text-indent: 0;\">plain</li></ul>"
        )
    );
}

#[test]
fn test_loose_task_list_checkbox_inside_paragraph() {
    let output = render_markdown("- [ ] first\n\n- [x] second\n");
    assert_eq!(
        output,
        format!(
            "<ul>{TASK_ITEM}{}</li>{TASK_ITEM}{}</li></ul>",
            p(&format!("{UNCHECKED}first")),
            p(&format!("{CHECKED}second"))
        )
    );
}

// =============================================================================
// Tables
// =============================================================================

#[test]
fn test_table_rendering() {
    let output = render_markdown("| A | B | C |\n|:--|--:|---|\n| 1 | 2 | 3 |");
    let row = format!("<tr style=\"{}\">", styles::TABLE_ROW);
    let cell = styles::TABLE_CELL;
    assert_eq!(
        output,
        format!(
            "<table style=\"{table}\"><thead>{row}\
             <th align=\"left\" style=\"{cell}\">A</th>\
             <th align=\"right\" style=\"{cell}\">B</th>\
             <th style=\"{cell}\">C</th></tr></thead>\
             <tbody>{row}\
             <td align=\"left\" style=\"{cell}\">1</td>\
             <td align=\"right\" style=\"{cell}\">2</td>\
             <td style=\"{cell}\">3</td></tr></tbody></table>",
            table = styles::TABLE
        )
    );
}

#[test]
fn test_header_only_table_has_no_body() {
    let output = render_markdown("| A |\n|---|");
    assert!(output.ends_with("</thead></table>"), "{output}");
    assert!(!output.contains("<tbody>"));
}

// =============================================================================
// Inline elements
// =============================================================================

#[test]
fn test_text_is_escaped() {
    assert_eq!(render_markdown("a < b & c"), p("a &lt; b &amp; c"));
}

#[test]
fn test_strikethrough_is_a_span() {
    assert_eq!(
        render_markdown("~~gone~~"),
        p("<span style=\"text-decoration: line-through;\">gone</span>")
    );
}

#[test]
fn test_code_span() {
    let output = render_markdown("run `x<y` :rocket:");
    assert_eq!(
        output,
        p(&format!(
            "run <code style=\"{}\">x&lt;y</code> 🚀",
            styles::code_span()
        ))
    );
}

#[test]
fn test_emoji_not_replaced_in_code() {
    let output = render_markdown("`:rocket:`");
    assert!(output.contains(":rocket:"));
    assert!(!output.contains('🚀'));
}

#[test]
fn test_emphasis() {
    assert_eq!(
        render_markdown("*a* **b**"),
        p("<em>a</em> <strong>b</strong>")
    );
}

// =============================================================================
// Links and images
// =============================================================================

#[test]
fn test_plain_link() {
    let output = render_markdown("[site](https://example.com/a?b=1&c=2 \"Title\")");
    insta::assert_snapshot!(output, @r#"<p style="margin: 0 0 16px;"><a href="https://example.com/a?b=1&amp;c=2" title="Title">site</a></p>"#);
}

#[test]
fn test_email_autolink() {
    assert_eq!(
        render_markdown("<jane@example.com>"),
        p("<a href=\"mailto:jane@example.com\">jane@example.com</a>")
    );
}

#[test]
fn test_uploaded_file_link() {
    let output = render_markdown("[report.pdf](tmp:abc-123)");
    assert_eq!(
        output,
        p("<a href=\"/k/api/blob/download.do?fileKey=abc-123&amp;_lc=en\" \
           class=\"cybozu-tmp-file ocean-ui-plugin-linkbubble-no\" data-file=\"abc-123\">\
           <img alt=\"report.pdf\" src=\"https://static.cybozu.com/contents/k/image/file/pdf.png\">\
           report.pdf</a>")
    );
}

#[test]
fn test_uploaded_file_unknown_extension_uses_other_icon() {
    let output = render_markdown("[notes.md](tmp:k9)");
    assert!(output.contains("src=\"https://static.cybozu.com/contents/k/image/file/other.png\""));
}

#[test]
fn test_malformed_upload_link_keeps_text_only() {
    assert_eq!(render_markdown("[oops](tmp:BAD)"), p("oops"));
}

#[test]
fn test_uploaded_image_with_width() {
    let output = render_markdown("![shot.png](tmp:k1 \"=250\")");
    assert_eq!(
        output,
        p("<img src=\"/k/api/blob/download.do?fileKey=k1&amp;_lc=en&amp;w=250\" alt=\"shot.png\" \
           width=\"250\" class=\"cybozu-tmp-file\" data-original=\"tmp:k1\" data-file=\"k1\">")
    );
}

#[test]
fn test_uploaded_image_without_width() {
    let output = render_markdown("![shot.png](tmp:k1)");
    insta::assert_snapshot!(output, @r#"<p style="margin: 0 0 16px;"><img src="/k/api/blob/download.do?fileKey=k1&amp;_lc=en" alt="shot.png" class="cybozu-tmp-file" data-original="tmp:k1" data-file="k1"></p>"#);
}

#[test]
fn test_plain_images() {
    assert_eq!(
        render_markdown("![a *b*](https://example.com/a.png \"hi\")"),
        p("<img src=\"https://example.com/a.png\" alt=\"a b\" title=\"hi\">")
    );
    assert_eq!(
        render_markdown("![a](https://example.com/a.png \"=100\")"),
        p("<img src=\"https://example.com/a.png\" alt=\"a\" width=\"100\">")
    );
}

#[test]
fn test_malformed_upload_image_keeps_alt_text() {
    assert_eq!(render_markdown("![a & b](tmp:NOPE)"), p("a &amp; b"));
}

#[test]
fn test_file_links_follow_host_config() {
    let config = threadmark_common::HostConfig {
        guest_space_id: Some(42),
        ..Default::default()
    };
    let renderer = MarkdownRenderer::new((), HostFileLinks::new(&config));
    let output = renderer.render("[a.txt](tmp:k)");
    assert!(output.contains("href=\"/k/guest/42/api/blob/download.do?fileKey=k&amp;_lc=en\""));
    assert!(output.contains("/file/txt.png"));
}

// =============================================================================
// Code blocks
// =============================================================================

#[test]
fn test_code_block_wrapper() {
    let output = render_markdown("```\n<b>&\n```");
    assert!(output.starts_with(
        "<pre style=\"background-color: #f6f8fa; border-radius: 3px; padding: 8px 16px;\">\
         <code style=\"font-family: 'SFMono-Regular', 'Consolas', 'Liberation Mono', 'Menlo', \
         'monospace';\">"
    ));
    assert!(output.ends_with("</code></pre>"));
    assert!(output.contains("&lt;b&gt;&amp;"));
    assert!(!output.contains("class="));
}

#[test]
fn test_code_block_text_is_not_substituted() {
    let output = render_markdown("```text\n:rocket: @jane_doe\n```");
    assert!(output.contains(":rocket: @jane_doe"));
}

#[test]
fn test_already_escaped_code_is_decoded_once() {
    let output = render_code_block("&lt;b&gt; &amp;amp;", None, true);
    assert!(output.contains("&lt;b&gt; &amp;amp;"), "{output}");
    let raw = render_code_block("&lt;b&gt;", None, false);
    assert!(raw.contains("&amp;lt;b&amp;gt;"), "{raw}");
}

#[cfg(feature = "syntax-highlighting")]
#[test]
fn test_code_block_highlighting_uses_inline_styles() {
    let output = render_markdown("```python\n# note\nx = 'hi'\n```");
    assert!(output.contains("<span style=\"color: #696969;\">"), "{output}");
    assert!(output.contains("<span style=\"color: #008000;\">"), "{output}");
    assert!(!output.contains("class="));
}

// =============================================================================
// Mentions and raw HTML
// =============================================================================

#[tokio::test]
async fn test_mentions_in_text() {
    let resolver = MentionResolver::new(directory());
    let input = "hi @jane_doe and @org/eng-team";
    resolver.resolve(input).await;

    let output = MarkdownRenderer::new(&resolver, HostFileLinks::default()).render(input);
    assert!(output.contains("data-mention-id=\"1\""), "{output}");
    assert!(output.contains("&#64;<bdi>Jane Doe</bdi></a>"));
    assert!(output.contains("data-org-mention-id=\"2\""));
    assert!(output.contains("&#64;<bdi>Engineering</bdi></a>"));
    assert!(!output.contains('@'));
}

#[tokio::test]
async fn test_escaped_mention_survives_markdown() {
    let token = create_mention_token(DirectoryEntityKind::User, "_x_y_");
    let input = format!("ping {token} now");
    let resolver = MentionResolver::new(directory());
    resolver.resolve(&input).await;

    let output = MarkdownRenderer::new(&resolver, HostFileLinks::default()).render(&input);
    assert!(output.contains("<bdi>Underscored</bdi>"), "{output}");
    assert!(!output.contains("<em>"));
}

#[tokio::test]
async fn test_mentions_in_code_stay_literal() {
    let resolver = MentionResolver::new(directory());
    let input = "`@jane_doe`";
    resolver.resolve(input).await;

    let output = MarkdownRenderer::new(&resolver, HostFileLinks::default()).render(input);
    assert!(output.contains("@jane_doe</code>"));
    assert!(!output.contains("<bdi>"));
}

#[tokio::test]
async fn test_raw_html_gets_emoji_and_mentions() {
    let resolver = MentionResolver::new(directory());
    // a token runs to the next whitespace, so the closing tag is kept apart
    let input = "<div>:smile: @jane_doe </div>\n";
    resolver.resolve(input).await;

    let output = MarkdownRenderer::new(&resolver, HostFileLinks::default()).render(input);
    assert!(output.starts_with("<div>😄 <a "), "{output}");
    assert!(output.contains("<bdi>Jane Doe</bdi></a> </div>"));
}

#[test]
fn test_unresolved_mentions_stay_plain() {
    assert_eq!(render_markdown("hi @nobody"), p("hi @nobody"));
}

#[test]
fn test_render_options_from_json() {
    let options: RenderOptions =
        serde_json::from_str(r#"{"breaks": false, "mentionLinks": {"userPath": "/u/"}}"#).unwrap();
    assert!(!options.breaks);
    assert_eq!(options.mention_links.user_path, "/u/");
    assert_eq!(options.tmp_file_class, "cybozu-tmp-file");
}
