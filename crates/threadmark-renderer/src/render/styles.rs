//! Inline styles for every element the writer emits.
//!
//! The host sanitizer drops `<style>` blocks and class attributes, so this
//! is the only styling that survives.

pub const MONOSPACE_FONT_FAMILY: &str =
    "'SFMono-Regular', 'Consolas', 'Liberation Mono', 'Menlo', 'monospace'";

pub const PARAGRAPH: &str = "margin: 0 0 16px;";

pub const BLOCKQUOTE: &str =
    "border-left: .25em solid #dfe2e5; color: #6a737d; margin: 0; padding: 0 1em;";

pub const PRE: &str = "background-color: #f6f8fa; border-radius: 3px; padding: 8px 16px;";

pub const TABLE: &str = "border-collapse: collapse; border-spacing: 0; margin: 0 0 16px;";

pub const TABLE_ROW: &str = "background-color: #fff; border-top: 1px solid #c6cbd1;";

pub const TABLE_CELL: &str = "border: 1px solid #dfe2e5; padding: 6px 13px;";

pub const LIST_ITEM: &str = "text-indent: 0;";

/// Task items hide the bullet and pull the checkbox into its place.
pub const TASK_LIST_ITEM: &str = "list-style-type: none; text-indent: -19px;";

pub const CHECKBOX: &str = "margin: 0 4px;";

pub const CHECKBOX_SIZE: u32 = 10;

/// The host removes `<del>` and `text-decoration-line`.
pub const STRIKETHROUGH: &str = "text-decoration: line-through;";

pub fn code_block() -> String {
    format!("font-family: {MONOSPACE_FONT_FAMILY};")
}

pub fn code_span() -> String {
    format!(
        "background-color: rgba(27,31,35,.05); border-radius: 3px; margin: 0 1px; \
         padding: .2em .4em; font-family: {MONOSPACE_FONT_FAMILY};"
    )
}

/// Headings shrink with depth; the top two levels get an underline.
pub fn heading(level: u32) -> String {
    let font_size = f64::from(20 - 2 * level) / 10.0;
    let line_height = f64::from(160 - 5 * level) / 100.0;
    let margin = 12 - level;
    let mut style = format!(
        "font-size: {font_size}em; font-weight: bold; line-height: {line_height}em; margin: {margin}px 0;"
    );
    if level <= 2 {
        style.push_str(" border-bottom: 1px solid #ddd;");
    }
    style
}
