use std::sync::LazyLock;

use pulldown_cmark::{Alignment, CodeBlockKind, CowStr, Event, LinkType, Tag, TagEnd};
use pulldown_cmark_escape::{StrWrite, escape_href, escape_html, escape_html_body_text};
use regex::Regex;
use threadmark_common::FileLinks;

use super::{RenderOptions, styles};
use crate::emoji::replace_emoji;
use crate::mention::MentionSubstitute;

/// `tmp:<fileKey>` as written by the upload flow
static TMP_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^tmp:([0-9a-z-]+)").unwrap());

fn tmp_file_key(dest_url: &str) -> Option<&str> {
    TMP_FILE_RE
        .captures(dest_url)
        .and_then(|caps| caps.get(1))
        .map(|key| key.as_str())
}

/// A `"=<width>"` link title asks for an image of that width.
fn requested_width(title: &str) -> Option<&str> {
    title.strip_prefix('=').filter(|width| !width.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableState {
    Head,
    Body,
}

/// Writes parser events as inline-styled HTML for the host's comment box
///
/// Text and raw HTML go through emoji and then mention substitution. Links
/// and images pointing at `tmp:` uploads become download URLs from `files`.
pub struct CommentWriter<'a, 'o, W: StrWrite, M, F> {
    events: std::vec::IntoIter<Event<'a>>,
    writer: W,
    mentions: M,
    files: F,
    options: &'o RenderOptions,

    table_state: TableState,
    table_alignments: Vec<Alignment>,
    table_cell_index: usize,
    table_body_open: bool,

    /// One entry per open link, `true` when an `<a>` was written for it
    link_stack: Vec<bool>,

    code_buffer: Option<(Option<String>, String)>, // (lang, content)
}

impl<'a, 'o, W, M, F> CommentWriter<'a, 'o, W, M, F>
where
    W: StrWrite,
    M: MentionSubstitute,
    F: FileLinks,
{
    pub fn new(
        events: impl IntoIterator<Item = Event<'a>>,
        writer: W,
        mentions: M,
        files: F,
        options: &'o RenderOptions,
    ) -> Self {
        Self {
            // collected up front so list items can look ahead for a task marker
            events: events.into_iter().collect::<Vec<_>>().into_iter(),
            writer,
            mentions,
            files,
            options,
            table_state: TableState::Head,
            table_alignments: vec![],
            table_cell_index: 0,
            table_body_open: false,
            link_stack: vec![],
            code_buffer: None,
        }
    }

    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)
    }

    /// Process markdown events and write HTML
    pub fn run(mut self) -> Result<W, W::Error> {
        while let Some(event) = self.events.next() {
            self.process_event(event)?;
        }
        Ok(self.writer)
    }

    fn process_event(&mut self, event: Event<'a>) -> Result<(), W::Error> {
        use Event::*;
        match event {
            Start(tag) => self.start_tag(tag)?,
            End(tag) => self.end_tag(tag)?,
            Text(text) => {
                if let Some((_, ref mut buffer)) = self.code_buffer {
                    buffer.push_str(&text);
                } else {
                    self.write_text(&text)?;
                }
            }
            Code(text) => {
                self.write("<code style=\"")?;
                self.write(&styles::code_span())?;
                self.write("\">")?;
                escape_html_body_text(&mut self.writer, &text)?;
                self.write("</code>")?;
            }
            InlineMath(text) | DisplayMath(text) => {
                escape_html_body_text(&mut self.writer, &text)?;
            }
            Html(html) | InlineHtml(html) => self.write_html(&html)?,
            FootnoteReference(name) => {
                self.write("<sup>[")?;
                escape_html_body_text(&mut self.writer, &name)?;
                self.write("]</sup>")?;
            }
            SoftBreak => {
                if self.options.breaks {
                    self.write("<br>")?;
                } else {
                    self.write("\n")?;
                }
            }
            HardBreak => self.write("<br>")?,
            Rule => self.write("<hr>")?,
            TaskListMarker(checked) => self.write_checkbox(checked)?,
        }
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<(), W::Error> {
        let mut escaped = String::with_capacity(text.len());
        // writing into a String cannot fail
        let _ = escape_html_body_text(&mut escaped, text);
        let with_emoji = replace_emoji(&escaped);
        let html = self.mentions.substitute(&with_emoji);
        self.write(&html)
    }

    fn write_html(&mut self, html: &str) -> Result<(), W::Error> {
        let with_emoji = replace_emoji(html);
        let html = self.mentions.substitute(&with_emoji);
        self.write(&html)
    }

    fn write_checkbox(&mut self, checked: bool) -> Result<(), W::Error> {
        let (src, alt) = if checked {
            (&self.options.checkbox_checked_url, "checked")
        } else {
            (&self.options.checkbox_unchecked_url, "unchecked")
        };
        write!(
            &mut self.writer,
            "<img width=\"{size}\" height=\"{size}\" src=\"",
            size = styles::CHECKBOX_SIZE
        )?;
        escape_href(&mut self.writer, src)?;
        write!(
            &mut self.writer,
            "\" alt=\"{alt}\" style=\"{}\">",
            styles::CHECKBOX
        )
    }

    /// Whether the list item just opened starts with a task marker.
    ///
    /// In a loose list the marker sits inside the item's first paragraph.
    fn item_is_task(&self) -> bool {
        matches!(
            self.events.as_slice(),
            [Event::TaskListMarker(_), ..]
                | [Event::Start(Tag::Paragraph), Event::TaskListMarker(_), ..]
        )
    }

    /// Plain text of the upcoming events up to the end of the current tag,
    /// without consuming them.
    fn peek_plain_text(&self) -> String {
        let mut text = String::new();
        let mut nest = 0usize;
        for event in self.events.as_slice() {
            match event {
                Event::Start(_) => nest += 1,
                Event::End(_) => {
                    if nest == 0 {
                        break;
                    }
                    nest -= 1;
                }
                _ => push_plain_text(&mut text, event),
            }
        }
        text
    }

    /// Consume events up to the end of the current tag, returning their
    /// plain text.
    fn consume_plain_text(&mut self) -> String {
        let mut text = String::new();
        let mut nest = 0usize;
        for event in self.events.by_ref() {
            match event {
                Event::Start(_) => nest += 1,
                Event::End(_) => {
                    if nest == 0 {
                        break;
                    }
                    nest -= 1;
                }
                ref event => push_plain_text(&mut text, event),
            }
        }
        text
    }

    fn start_tag(&mut self, tag: Tag<'a>) -> Result<(), W::Error> {
        match tag {
            Tag::HtmlBlock => Ok(()),
            Tag::Paragraph => {
                write!(&mut self.writer, "<p style=\"{}\">", styles::PARAGRAPH)
            }
            Tag::Heading { level, .. } => {
                let level = level as u32;
                write!(
                    &mut self.writer,
                    "<h{level} style=\"{}\">",
                    styles::heading(level)
                )
            }
            Tag::BlockQuote(_) => {
                write!(&mut self.writer, "<blockquote style=\"{}\">", styles::BLOCKQUOTE)
            }
            Tag::CodeBlock(info) => {
                let lang = match info {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code_buffer = Some((lang, String::new()));
                Ok(())
            }
            Tag::List(Some(1)) => self.write("<ol>"),
            Tag::List(Some(start)) => write!(&mut self.writer, "<ol start=\"{start}\">"),
            Tag::List(None) => self.write("<ul>"),
            Tag::Item => {
                let style = if self.item_is_task() {
                    styles::TASK_LIST_ITEM
                } else {
                    styles::LIST_ITEM
                };
                write!(&mut self.writer, "<li style=\"{style}\">")
            }
            Tag::FootnoteDefinition(name) => {
                self.write("<div><sup>")?;
                escape_html_body_text(&mut self.writer, &name)?;
                self.write("</sup>")
            }
            Tag::DefinitionList => self.write("<dl>"),
            Tag::DefinitionListTitle => self.write("<dt>"),
            Tag::DefinitionListDefinition => self.write("<dd>"),
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                self.table_body_open = false;
                write!(&mut self.writer, "<table style=\"{}\">", styles::TABLE)
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                write!(&mut self.writer, "<thead><tr style=\"{}\">", styles::TABLE_ROW)
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                if !self.table_body_open {
                    self.table_body_open = true;
                    self.write("<tbody>")?;
                }
                write!(&mut self.writer, "<tr style=\"{}\">", styles::TABLE_ROW)
            }
            Tag::TableCell => {
                match self.table_state {
                    TableState::Head => self.write("<th")?,
                    TableState::Body => self.write("<td")?,
                }
                match self.table_alignments.get(self.table_cell_index) {
                    Some(Alignment::Left) => self.write(" align=\"left\"")?,
                    Some(Alignment::Center) => self.write(" align=\"center\"")?,
                    Some(Alignment::Right) => self.write(" align=\"right\"")?,
                    _ => {}
                }
                write!(&mut self.writer, " style=\"{}\">", styles::TABLE_CELL)
            }
            Tag::Emphasis => self.write("<em>"),
            Tag::Strong => self.write("<strong>"),
            Tag::Strikethrough => {
                write!(&mut self.writer, "<span style=\"{}\">", styles::STRIKETHROUGH)
            }
            Tag::Superscript => self.write("<sup>"),
            Tag::Subscript => self.write("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => self.start_link(link_type, dest_url, title),
            Tag::Image {
                dest_url, title, ..
            } => self.write_image(dest_url, title),
            // metadata blocks are never enabled
            Tag::MetadataBlock(_) => Ok(()),
        }
    }

    fn start_link(
        &mut self,
        link_type: LinkType,
        dest_url: CowStr<'a>,
        title: CowStr<'a>,
    ) -> Result<(), W::Error> {
        if dest_url.starts_with("tmp:") {
            let Some(key) = tmp_file_key(&dest_url) else {
                // only the link text is written
                tracing::debug!("malformed upload reference {}", dest_url);
                self.link_stack.push(false);
                return Ok(());
            };
            let name = self.peek_plain_text();
            let href = self.files.download_url(key, &[]);
            let icon = self.files.file_icon_url(&name);

            self.write("<a href=\"")?;
            escape_href(&mut self.writer, &href)?;
            self.write("\" class=\"")?;
            escape_html(&mut self.writer, &self.options.tmp_file_class)?;
            self.write(" ")?;
            escape_html(&mut self.writer, &self.options.no_link_bubble_class)?;
            self.write("\" data-file=\"")?;
            escape_html(&mut self.writer, key)?;
            self.write("\"><img alt=\"")?;
            escape_html(&mut self.writer, &name)?;
            self.write("\" src=\"")?;
            escape_href(&mut self.writer, &icon)?;
            self.write("\">")?;
            self.link_stack.push(true);
            return Ok(());
        }

        self.write("<a href=\"")?;
        if link_type == LinkType::Email {
            self.write("mailto:")?;
        }
        escape_href(&mut self.writer, &dest_url)?;
        if !title.is_empty() {
            self.write("\" title=\"")?;
            escape_html(&mut self.writer, &title)?;
        }
        self.write("\">")?;
        self.link_stack.push(true);
        Ok(())
    }

    fn write_image(&mut self, dest_url: CowStr<'a>, title: CowStr<'a>) -> Result<(), W::Error> {
        let alt = self.consume_plain_text();
        let width = requested_width(&title);

        let src = if dest_url.starts_with("tmp:") {
            let Some(key) = tmp_file_key(&dest_url) else {
                tracing::debug!("malformed upload reference {}", dest_url);
                return escape_html_body_text(&mut self.writer, &alt);
            };
            let params: Vec<(&str, &str)> = width.map(|w| ("w", w)).into_iter().collect();
            Some((key, self.files.download_url(key, &params)))
        } else {
            None
        };

        self.write("<img src=\"")?;
        match &src {
            Some((_, url)) => escape_href(&mut self.writer, url)?,
            None => escape_href(&mut self.writer, &dest_url)?,
        }
        self.write("\" alt=\"")?;
        escape_html(&mut self.writer, &alt)?;
        self.write("\"")?;
        if let Some(width) = width {
            self.write(" width=\"")?;
            escape_html(&mut self.writer, width)?;
            self.write("\"")?;
        } else if !title.is_empty() {
            self.write(" title=\"")?;
            escape_html(&mut self.writer, &title)?;
            self.write("\"")?;
        }
        if let Some((key, _)) = src {
            self.write(" class=\"")?;
            escape_html(&mut self.writer, &self.options.tmp_file_class)?;
            // the original reference, without the width
            self.write("\" data-original=\"")?;
            escape_html(&mut self.writer, &dest_url)?;
            self.write("\" data-file=\"")?;
            escape_html(&mut self.writer, key)?;
            self.write("\"")?;
        }
        self.write(">")
    }

    fn end_tag(&mut self, tag: TagEnd) -> Result<(), W::Error> {
        match tag {
            TagEnd::HtmlBlock => Ok(()),
            TagEnd::Paragraph => self.write("</p>"),
            TagEnd::Heading(level) => write!(&mut self.writer, "</h{}>", level as u32),
            TagEnd::BlockQuote(_) => self.write("</blockquote>"),
            TagEnd::CodeBlock => {
                let Some((lang, buffer)) = self.code_buffer.take() else {
                    return Ok(());
                };
                let html = super::render_code_block(&buffer, lang.as_deref(), false);
                self.write(&html)
            }
            TagEnd::List(true) => self.write("</ol>"),
            TagEnd::List(false) => self.write("</ul>"),
            TagEnd::Item => self.write("</li>"),
            TagEnd::FootnoteDefinition => self.write("</div>"),
            TagEnd::DefinitionList => self.write("</dl>"),
            TagEnd::DefinitionListTitle => self.write("</dt>"),
            TagEnd::DefinitionListDefinition => self.write("</dd>"),
            TagEnd::Table => {
                if self.table_body_open {
                    self.write("</tbody>")?;
                }
                self.write("</table>")
            }
            TagEnd::TableHead => {
                self.table_state = TableState::Body;
                self.write("</tr></thead>")
            }
            TagEnd::TableRow => self.write("</tr>"),
            TagEnd::TableCell => {
                self.table_cell_index += 1;
                match self.table_state {
                    TableState::Head => self.write("</th>"),
                    TableState::Body => self.write("</td>"),
                }
            }
            TagEnd::Emphasis => self.write("</em>"),
            TagEnd::Strong => self.write("</strong>"),
            TagEnd::Strikethrough => self.write("</span>"),
            TagEnd::Superscript => self.write("</sup>"),
            TagEnd::Subscript => self.write("</sub>"),
            TagEnd::Link => {
                if self.link_stack.pop().unwrap_or(false) {
                    self.write("</a>")
                } else {
                    Ok(())
                }
            }
            // consumed together with the image start
            TagEnd::Image => Ok(()),
            TagEnd::MetadataBlock(_) => Ok(()),
        }
    }
}

fn push_plain_text(text: &mut String, event: &Event<'_>) {
    match event {
        Event::Text(t) | Event::Code(t) | Event::InlineMath(t) | Event::DisplayMath(t) => {
            text.push_str(t)
        }
        Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
        Event::TaskListMarker(true) => text.push_str("[x]"),
        Event::TaskListMarker(false) => text.push_str("[ ]"),
        _ => {}
    }
}
