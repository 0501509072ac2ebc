//! Mention tokens: encoding, resolution against the directory, and
//! substitution into rendered HTML.
//!
//! Resolution is split in two. [`MentionResolver::resolve`] is async and
//! warms the session cache from the directory; [`MentionResolver::substitute`]
//! is synchronous and only reads the cache, so it can run inside the
//! Markdown writer.

use std::borrow::Cow;
use std::collections::HashSet;

use n0_future::join_all;
use pulldown_cmark_escape::escape_html;
use serde::Deserialize;
use threadmark_common::{DirectoryEntity, DirectoryEntityKind, DirectoryLookup};
use tracing::{debug, trace, warn};

mod cache;
mod codec;
mod reply;
mod token;


pub use cache::{CachedEntity, EntityCache};
pub use codec::{create_mention_token, escape, unescape};
pub use reply::{extract_reply_mentions, reply_prefill};
pub use token::{MENTION_RE, MentionToken, replace_mentions, scan_mentions};

/// Codes longer than this (in characters) are never looked up.
pub const MAX_CODE_LEN: usize = 100;

/// How mention anchors are written
///
/// The defaults are the class names and paths the host page recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MentionLinkOptions {
    pub class: String,
    pub style: String,
    /// Prefix for user profile links, followed by the escaped code
    pub user_path: String,
    /// Prefix for guest user profile links
    pub guest_path: String,
}

impl Default for MentionLinkOptions {
    fn default() -> Self {
        Self {
            class: "ocean-ui-plugin-mention-user ocean-ui-plugin-linkbubble-no".to_string(),
            style: "-webkit-user-modify: read-only;".to_string(),
            user_path: "/k/#/people/user/".to_string(),
            guest_path: "/k/guest/#/people/guest/".to_string(),
        }
    }
}

impl MentionLinkOptions {
    /// The anchor for a resolved mention.
    ///
    /// Every `@` is written as `&#64;`, so the mention pattern never matches
    /// inside a generated anchor.
    pub fn anchor(&self, entity: &DirectoryEntity, escaped_code: &str, raw_code: &str) -> String {
        let href = match entity.kind {
            DirectoryEntityKind::Organization | DirectoryEntityKind::Group => "#".to_string(),
            DirectoryEntityKind::User if raw_code.contains('@') => {
                format!("{}{}", self.guest_path, escaped_code)
            }
            DirectoryEntityKind::User => format!("{}{}", self.user_path, escaped_code),
        };

        let mut out = String::with_capacity(256);
        out.push_str("<a class=\"");
        push_escaped(&mut out, &self.class);
        out.push_str("\" href=\"");
        push_escaped(&mut out, &href);
        out.push_str("\" ");
        out.push_str(entity.kind.mention_id_attribute());
        out.push_str("=\"");
        push_escaped(&mut out, &entity.id);
        out.push_str("\" tabindex=\"-1\" style=\"");
        push_escaped(&mut out, &self.style);
        out.push_str("\">@<bdi>");
        push_escaped(&mut out, &entity.name);
        out.push_str("</bdi></a>");
        out.replace('@', "&#64;")
    }
}

fn push_escaped(out: &mut String, s: &str) {
    // writing into a String cannot fail
    let _ = escape_html(&mut *out, s);
}

/// Synchronous mention substitution, as seen by the Markdown writer
pub trait MentionSubstitute {
    fn substitute<'t>(&self, text: &'t str) -> Cow<'t, str>;
}

/// Leaves every token as written
impl MentionSubstitute for () {
    fn substitute<'t>(&self, text: &'t str) -> Cow<'t, str> {
        Cow::Borrowed(text)
    }
}

impl<T: MentionSubstitute + ?Sized> MentionSubstitute for &T {
    fn substitute<'t>(&self, text: &'t str) -> Cow<'t, str> {
        (**self).substitute(text)
    }
}

/// Resolves mention tokens for one editing session
pub struct MentionResolver<D> {
    directory: D,
    cache: EntityCache,
    links: MentionLinkOptions,
}

impl<D: DirectoryLookup> MentionResolver<D> {
    pub fn new(directory: D) -> Self {
        Self::with_links(directory, MentionLinkOptions::default())
    }

    pub fn with_links(directory: D, links: MentionLinkOptions) -> Self {
        Self {
            directory,
            cache: EntityCache::new(),
            links,
        }
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn links(&self) -> &MentionLinkOptions {
        &self.links
    }

    /// Look up every mentioned code the cache cannot answer yet.
    ///
    /// Each distinct `(kind, code)` is fetched at most once per call and all
    /// lookups run concurrently. A failed lookup is logged and left out of
    /// the cache, so the token stays plain until a later call succeeds.
    pub async fn resolve(&self, text: &str) {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for token in scan_mentions(text) {
            let code = token.code();
            if code.chars().count() > MAX_CODE_LEN {
                debug!(kind = %token.kind, "skipping mention code over {MAX_CODE_LEN} characters");
                continue;
            }
            if !seen.insert((token.kind, code.clone())) {
                continue;
            }
            if self.cache.needs_fetch(token.kind, &code) {
                pending.push((token.kind, code));
            } else {
                trace!(kind = %token.kind, code = %code, "mention cache hit");
            }
        }

        if pending.is_empty() {
            return;
        }
        debug!("resolving {} mention codes", pending.len());

        let lookups = pending.into_iter().map(|(kind, code)| async move {
            match self.directory.find_entity(kind, &code).await {
                Ok(found) => {
                    if found.is_none() {
                        debug!(%kind, code = %code, "mention not found");
                    }
                    self.cache
                        .set(kind, &code, found.map(DirectoryEntity::with_preset_avatar));
                }
                Err(error) => {
                    warn!(%kind, code = %code, "mention lookup failed: {error}");
                }
            }
        });
        join_all(lookups).await;
    }

    /// Replace every token with a positive cache entry by its anchor.
    ///
    /// Never touches the directory. Unknown, not-found and oversized codes
    /// stay exactly as written.
    pub fn substitute(&self, text: &str) -> String {
        MentionSubstitute::substitute(self, text).into_owned()
    }

    /// Seed the cache with entities fetched elsewhere.
    pub fn prime(&self, entities: impl IntoIterator<Item = DirectoryEntity>) {
        for entity in entities {
            let code = entity.code.clone();
            self.cache.set(entity.kind, &code, Some(entity));
        }
    }
}

impl<D> MentionSubstitute for MentionResolver<D> {
    fn substitute<'t>(&self, text: &'t str) -> Cow<'t, str> {
        replace_mentions(text, |token| {
            let code = token.code();
            if code.chars().count() > MAX_CODE_LEN {
                return None;
            }
            let entity = self.cache.found(token.kind, &code)?;
            Some(self.links.anchor(&entity, token.escaped_code, &code))
        })
    }
}
