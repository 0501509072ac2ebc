//! Threadmark renderer
//!
//! Turns comment Markdown into the inline-styled HTML the host's comment box
//! accepts, with `@code` mentions resolved against the host directory,
//! `:shortcode:` emoji and highlighted code blocks.
//!
//! Rendering is two-phase. Mentions are resolved asynchronously into a
//! per-session cache first, then the Markdown is rendered synchronously
//! against that cache. [`EditorSession`] ties both phases together and
//! discards renders that a newer edit has overtaken.

pub mod emoji;
#[cfg(feature = "syntax-highlighting")]
pub mod highlight;
pub mod mention;
pub mod render;
pub mod session;
pub mod utils;

pub use mention::{
    MentionLinkOptions, MentionResolver, MentionSubstitute, create_mention_token,
    extract_reply_mentions, reply_prefill,
};
pub use render::{MarkdownRenderer, RenderOptions, render_code_block};
pub use session::EditorSession;
