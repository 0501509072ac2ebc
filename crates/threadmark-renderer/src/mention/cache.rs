use std::sync::Arc;

use dashmap::DashMap;
use smol_str::SmolStr;
use threadmark_common::{DirectoryEntity, DirectoryEntityKind};

/// What the cache knows about a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedEntity {
    /// Looked up, the directory has no such entity
    NotFound,
    Found(Arc<DirectoryEntity>),
}

impl CachedEntity {
    pub fn entity(&self) -> Option<&DirectoryEntity> {
        match self {
            Self::NotFound => None,
            Self::Found(entity) => Some(entity),
        }
    }
}

/// Resolved directory entities for one editing session
///
/// Keyed by `(kind, raw code)`, so users, organizations and groups never
/// collide. No eviction: the cache lives exactly as long as the editor does.
#[derive(Debug, Default)]
pub struct EntityCache {
    entries: DashMap<(DirectoryEntityKind, SmolStr), CachedEntity>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if the code was never looked up.
    pub fn get(&self, kind: DirectoryEntityKind, code: &str) -> Option<CachedEntity> {
        self.entries
            .get(&(kind, SmolStr::new(code)))
            .map(|entry| entry.value().clone())
    }

    /// Record a lookup result; `None` records a negative entry.
    pub fn set(&self, kind: DirectoryEntityKind, code: &str, entity: Option<DirectoryEntity>) {
        let value = match entity {
            Some(entity) => CachedEntity::Found(Arc::new(entity)),
            None => CachedEntity::NotFound,
        };
        self.entries.insert((kind, SmolStr::new(code)), value);
    }

    /// The positive entry for a code, if any.
    pub fn found(&self, kind: DirectoryEntityKind, code: &str) -> Option<Arc<DirectoryEntity>> {
        match self.get(kind, code)? {
            CachedEntity::Found(entity) => Some(entity),
            CachedEntity::NotFound => None,
        }
    }

    /// Whether `resolve` should ask the directory for this code.
    ///
    /// Negative entries are fetched again, same as codes never seen. A code
    /// that stays missing is therefore looked up on every resolve pass.
    pub fn needs_fetch(&self, kind: DirectoryEntityKind, code: &str) -> bool {
        !matches!(self.get(kind, code), Some(CachedEntity::Found(_)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinguishes_never_seen_from_not_found() {
        let cache = EntityCache::new();
        assert_eq!(cache.get(DirectoryEntityKind::User, "jane"), None);

        cache.set(DirectoryEntityKind::User, "jane", None);
        assert_eq!(
            cache.get(DirectoryEntityKind::User, "jane"),
            Some(CachedEntity::NotFound)
        );
        assert!(cache.found(DirectoryEntityKind::User, "jane").is_none());
    }

    #[test]
    fn partitions_by_kind() {
        let cache = EntityCache::new();
        let eng = DirectoryEntity::new(DirectoryEntityKind::Organization, "2", "eng", "Engineering");
        cache.set(DirectoryEntityKind::Organization, "eng", Some(eng));

        assert!(cache.found(DirectoryEntityKind::Organization, "eng").is_some());
        assert!(cache.get(DirectoryEntityKind::User, "eng").is_none());
        assert!(cache.get(DirectoryEntityKind::Group, "eng").is_none());
    }

    #[test]
    fn negative_entries_are_refetched() {
        let cache = EntityCache::new();
        assert!(cache.needs_fetch(DirectoryEntityKind::Group, "ops"));

        cache.set(DirectoryEntityKind::Group, "ops", None);
        assert!(cache.needs_fetch(DirectoryEntityKind::Group, "ops"));

        let ops = DirectoryEntity::new(DirectoryEntityKind::Group, "3", "ops", "Operations");
        cache.set(DirectoryEntityKind::Group, "ops", Some(ops));
        assert!(!cache.needs_fetch(DirectoryEntityKind::Group, "ops"));
    }

    #[test]
    fn last_write_wins() {
        let cache = EntityCache::new();
        let jane = DirectoryEntity::new(DirectoryEntityKind::User, "1", "jane", "Jane");
        cache.set(DirectoryEntityKind::User, "jane", Some(jane.clone()));
        cache.set(DirectoryEntityKind::User, "jane", Some(jane.with_avatar("a.png")));
        assert_eq!(
            cache.found(DirectoryEntityKind::User, "jane").unwrap().avatar_url,
            "a.png"
        );
        assert_eq!(cache.len(), 1);
    }
}
