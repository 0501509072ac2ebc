//! One editing session: a resolver cache and a renderer bound to it.
//!
//! Every keystroke starts a render cycle. A cycle resolves the mentions in
//! its text and then renders, but only the newest cycle gets to return HTML.
//! Older cycles still warm the cache.

use std::sync::atomic::{AtomicU64, Ordering};

use threadmark_common::{DirectoryLookup, FileLinks, HostFileLinks, LoginUser};
use tracing::debug;

use crate::mention::{MentionResolver, reply_prefill};
use crate::render::{MarkdownRenderer, RenderOptions};

pub struct EditorSession<D, F = HostFileLinks> {
    renderer: MarkdownRenderer<MentionResolver<D>, F>,
    latest: AtomicU64,
}

impl<D: DirectoryLookup> EditorSession<D, HostFileLinks> {
    pub fn new(directory: D) -> Self {
        Self::with_files(directory, HostFileLinks::default(), RenderOptions::default())
    }
}

impl<D: DirectoryLookup, F: FileLinks> EditorSession<D, F> {
    pub fn with_files(directory: D, files: F, options: RenderOptions) -> Self {
        let resolver = MentionResolver::with_links(directory, options.mention_links.clone());
        Self {
            renderer: MarkdownRenderer::new(resolver, files).with_options(options),
            latest: AtomicU64::new(0),
        }
    }

    pub fn resolver(&self) -> &MentionResolver<D> {
        self.renderer.mentions()
    }

    pub fn renderer(&self) -> &MarkdownRenderer<MentionResolver<D>, F> {
        &self.renderer
    }

    /// Start a render cycle and return its sequence id.
    fn begin_cycle(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, sequence: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == sequence
    }

    /// Resolve then render `text`.
    ///
    /// Returns `None` when a newer cycle started while this one was
    /// resolving; its result would overwrite fresher HTML.
    pub async fn render(&self, text: &str) -> Option<String> {
        let sequence = self.begin_cycle();
        self.resolver().resolve(text).await;
        if !self.is_latest(sequence) {
            debug!(sequence, "discarding stale render");
            return None;
        }
        Some(self.renderer.render(text))
    }

    /// Render with whatever the cache already holds, without a cycle.
    pub fn render_cached(&self, text: &str) -> String {
        self.renderer.render(text)
    }

    /// Editor text for a reply to the comment whose HTML is `reply_html`.
    pub async fn reply_prefill(&self, reply_html: &str, login: &LoginUser, draft: &str) -> String {
        reply_prefill(self.resolver(), reply_html, login, draft).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadmark_common::{
        DirectoryEntity, DirectoryEntityKind, DirectoryError, EntityRef, StaticDirectory,
    };
    use tokio::sync::Notify;

    /// Lookups of the code `slow` wait until the gate opens.
    struct GatedDirectory {
        inner: StaticDirectory,
        gate: Notify,
    }

    impl GatedDirectory {
        fn new() -> Self {
            Self {
                inner: StaticDirectory::from_entities([
                    DirectoryEntity::new(DirectoryEntityKind::User, "1", "slow", "Slow Poke"),
                    DirectoryEntity::new(DirectoryEntityKind::User, "2", "fast", "Quick Draw"),
                ]),
                gate: Notify::new(),
            }
        }
    }

    impl DirectoryLookup for GatedDirectory {
        async fn find_entity(
            &self,
            kind: DirectoryEntityKind,
            code: &str,
        ) -> Result<Option<DirectoryEntity>, DirectoryError> {
            if code == "slow" {
                self.gate.notified().await;
            }
            self.inner.find_entity(kind, code).await
        }

        async fn list_entities_by_id_and_kind(
            &self,
            refs: &[EntityRef],
        ) -> Result<Vec<DirectoryEntity>, DirectoryError> {
            self.inner.list_entities_by_id_and_kind(refs).await
        }
    }

    #[tokio::test]
    async fn test_render_resolves_first() {
        let session = EditorSession::new(GatedDirectory::new());
        let html = session.render("hi @fast").await.unwrap();
        assert!(html.contains("<bdi>Quick Draw</bdi>"), "{html}");
    }

    #[tokio::test]
    async fn test_render_cached_does_not_fetch() {
        let session = EditorSession::new(GatedDirectory::new());
        let html = session.render_cached("hi @fast");
        assert!(html.contains("hi @fast"));
        assert!(session.resolver().cache().is_empty());
    }

    #[tokio::test]
    async fn test_stale_cycle_is_discarded() {
        let session = EditorSession::new(GatedDirectory::new());

        let stale = session.render("@slow");
        let fresh = async {
            let html = session.render("@fast").await;
            session.resolver().directory().gate.notify_one();
            html
        };
        // the gate opens only after the fresh cycle has returned
        let (stale, fresh) = tokio::join!(stale, fresh);

        assert_eq!(stale, None);
        let fresh = fresh.unwrap();
        assert!(fresh.contains("<bdi>Quick Draw</bdi>"), "{fresh}");
        // the stale cycle still warmed the cache
        assert!(session.resolver().cache().found(DirectoryEntityKind::User, "slow").is_some());
        let later = session.render("@slow").await.unwrap();
        assert!(later.contains("<bdi>Slow Poke</bdi>"), "{later}");
    }

    #[tokio::test]
    async fn test_sequential_cycles_all_return() {
        let session = EditorSession::new(GatedDirectory::new());
        assert!(session.render("one").await.is_some());
        assert!(session.render("two").await.is_some());
    }

    #[tokio::test]
    async fn test_reply_prefill_warms_session() {
        let session = EditorSession::new(GatedDirectory::new());
        let reply = "<a class=\"ocean-ui-plugin-mention-user\" data-mention-id=\"2\">@Quick Draw</a>";
        let login = LoginUser::new("someone", "en");

        let draft = session.reply_prefill(reply, &login, "").await;
        assert_eq!(draft, "@fast ");
        assert!(session.render_cached(&draft).contains("<bdi>Quick Draw</bdi>"));
    }
}
