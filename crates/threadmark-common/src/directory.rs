//! The directory lookup seam and an in-memory directory.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::entity::{DirectoryEntity, DirectoryEntityKind, EntityRef};
use crate::error::DirectoryError;

/// Trait for looking up directory entities
///
/// Implementations can call the host's directory API, read a fixture, or
/// anything else. `Ok(None)` means the directory answered and the code does
/// not exist.
pub trait DirectoryLookup {
    /// Find a single entity by kind and exact code
    fn find_entity(
        &self,
        kind: DirectoryEntityKind,
        code: &str,
    ) -> impl Future<Output = Result<Option<DirectoryEntity>, DirectoryError>>;

    /// Batch lookup by `(kind, id)`, used to seed reply mentions
    ///
    /// Unknown references are left out of the result.
    fn list_entities_by_id_and_kind(
        &self,
        refs: &[EntityRef],
    ) -> impl Future<Output = Result<Vec<DirectoryEntity>, DirectoryError>>;
}

impl<T: DirectoryLookup> DirectoryLookup for Arc<T> {
    fn find_entity(
        &self,
        kind: DirectoryEntityKind,
        code: &str,
    ) -> impl Future<Output = Result<Option<DirectoryEntity>, DirectoryError>> {
        (**self).find_entity(kind, code)
    }

    fn list_entities_by_id_and_kind(
        &self,
        refs: &[EntityRef],
    ) -> impl Future<Output = Result<Vec<DirectoryEntity>, DirectoryError>> {
        (**self).list_entities_by_id_and_kind(refs)
    }
}

impl<T: DirectoryLookup> DirectoryLookup for &T {
    fn find_entity(
        &self,
        kind: DirectoryEntityKind,
        code: &str,
    ) -> impl Future<Output = Result<Option<DirectoryEntity>, DirectoryError>> {
        (**self).find_entity(kind, code)
    }

    fn list_entities_by_id_and_kind(
        &self,
        refs: &[EntityRef],
    ) -> impl Future<Output = Result<Vec<DirectoryEntity>, DirectoryError>> {
        (**self).list_entities_by_id_and_kind(refs)
    }
}

/// Directory that never finds anything
impl DirectoryLookup for () {
    async fn find_entity(
        &self,
        _kind: DirectoryEntityKind,
        _code: &str,
    ) -> Result<Option<DirectoryEntity>, DirectoryError> {
        Ok(None)
    }

    async fn list_entities_by_id_and_kind(
        &self,
        _refs: &[EntityRef],
    ) -> Result<Vec<DirectoryEntity>, DirectoryError> {
        Ok(Vec::new())
    }
}

/// In-memory directory, keyed by `(kind, code)`
///
/// Used by the CLI (loaded from a JSON fixture) and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entities: HashMap<(DirectoryEntityKind, SmolStr), DirectoryEntity>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entities(entities: impl IntoIterator<Item = DirectoryEntity>) -> Self {
        let mut directory = Self::new();
        for entity in entities {
            directory.insert(entity);
        }
        directory
    }

    /// Parse a JSON array of entities
    pub fn from_json_str(json: &str) -> Result<Self, DirectoryError> {
        let entities: Vec<DirectoryEntity> =
            serde_json::from_str(json).map_err(|source| DirectoryError::Parse { source })?;
        Ok(Self::from_entities(
            entities.into_iter().map(DirectoryEntity::with_preset_avatar),
        ))
    }

    /// Load a JSON fixture from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = Self::from_json_str(&json)?;
        tracing::debug!(
            "loaded {} directory entities from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    pub fn insert(&mut self, entity: DirectoryEntity) {
        self.entities
            .insert((entity.kind, entity.code.clone()), entity);
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl DirectoryLookup for StaticDirectory {
    async fn find_entity(
        &self,
        kind: DirectoryEntityKind,
        code: &str,
    ) -> Result<Option<DirectoryEntity>, DirectoryError> {
        Ok(self.entities.get(&(kind, SmolStr::new(code))).cloned())
    }

    async fn list_entities_by_id_and_kind(
        &self,
        refs: &[EntityRef],
    ) -> Result<Vec<DirectoryEntity>, DirectoryError> {
        // Keep the caller's order; the reply prefill is built from it.
        Ok(refs
            .iter()
            .filter_map(|r| {
                self.entities
                    .values()
                    .find(|e| e.kind == r.kind && e.id == r.id)
                    .cloned()
            })
            .collect())
    }
}
