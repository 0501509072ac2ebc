//! Mentions carried over when replying to a comment.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use threadmark_common::{DirectoryEntityKind, DirectoryLookup, EntityRef, LoginUser};
use tracing::{debug, warn};

use super::MentionResolver;
use super::codec::create_mention_token;

const MENTION_ANCHOR_CLASS: &str = "ocean-ui-plugin-mention-user";

/// Find the mention anchors in a comment's HTML, in document order.
///
/// Only `<a>` elements carrying the host's mention class count. An anchor
/// with several id attributes is read as a user first, then organization,
/// then group.
pub fn extract_reply_mentions(html: &str) -> Vec<EntityRef> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    let mut mentions = Vec::new();
    collect_mentions(&dom.document, &mut mentions);
    mentions
}

fn collect_mentions(node: &Handle, mentions: &mut Vec<EntityRef>) {
    if let NodeData::Element { name, attrs, .. } = &node.data {
        if &*name.local == "a" {
            if let Some(mention) = mention_ref(&attrs.borrow()) {
                mentions.push(mention);
            }
        }
    }
    for child in node.children.borrow().iter() {
        collect_mentions(child, mentions);
    }
}

fn mention_ref(attrs: &[html5ever::Attribute]) -> Option<EntityRef> {
    let attr = |wanted: &str| {
        attrs
            .iter()
            .find(|attr| &*attr.name.local == wanted)
            .map(|attr| &*attr.value)
    };

    let is_mention = attr("class").is_some_and(|class| {
        class
            .split_ascii_whitespace()
            .any(|c| c == MENTION_ANCHOR_CLASS)
    });
    if !is_mention {
        return None;
    }

    DirectoryEntityKind::ALL.into_iter().find_map(|kind| {
        attr(kind.mention_id_attribute())
            .filter(|id| !id.is_empty())
            .map(|id| EntityRef::new(kind, id))
    })
}

/// Initial editor text for a reply.
///
/// Fetches the entities mentioned in `reply_html`, seeds the resolver's
/// cache with them and returns their tokens separated by spaces, with a
/// trailing space so the caret lands after them. The signed-in user's own
/// mention is dropped. With nothing left to mention, `draft` is returned.
pub async fn reply_prefill<D: DirectoryLookup>(
    resolver: &MentionResolver<D>,
    reply_html: &str,
    login: &LoginUser,
    draft: &str,
) -> String {
    let refs = extract_reply_mentions(reply_html);
    if refs.is_empty() {
        return draft.to_string();
    }

    let entities = match resolver.directory().list_entities_by_id_and_kind(&refs).await {
        Ok(entities) => entities,
        Err(error) => {
            warn!("failed to fetch reply mentions: {error}");
            return draft.to_string();
        }
    };
    debug!("fetched {} of {} reply mentions", entities.len(), refs.len());

    let tokens: Vec<String> = entities
        .iter()
        .filter(|e| !(e.kind == DirectoryEntityKind::User && e.code == login.code))
        .map(|e| create_mention_token(e.kind, &e.code))
        .collect();
    resolver.prime(entities);

    if tokens.is_empty() {
        draft.to_string()
    } else {
        format!("{} ", tokens.join(" "))
    }
}
