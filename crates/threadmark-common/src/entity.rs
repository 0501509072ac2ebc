//! Directory entities: the users, organizations and groups a mention can point at.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Avatar used for organizations when the directory does not return one.
pub const PRESET_ORGANIZATION_AVATAR: &str =
    "https://static.cybozu.com/contents/k/image/argo/preset/user/organization_48.png";

/// Avatar used for groups when the directory does not return one.
pub const PRESET_GROUP_AVATAR: &str =
    "https://static.cybozu.com/contents/k/image/argo/preset/user/group_48.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryEntityKind {
    User,
    Organization,
    Group,
}

impl DirectoryEntityKind {
    pub const ALL: [DirectoryEntityKind; 3] = [Self::User, Self::Organization, Self::Group];

    /// Prefix used inside mention tokens (`@org/...`, `@group/...`).
    ///
    /// Users carry no prefix, so this is `None` for them.
    pub fn token_tag(self) -> Option<&'static str> {
        match self {
            Self::User => None,
            Self::Organization => Some("org"),
            Self::Group => Some("group"),
        }
    }

    /// Parse a kind from a token tag or a host entity type string.
    ///
    /// Accepts `org`, `organization` and `group` in any case. Everything else,
    /// including an empty string, is a user.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "org" | "organization" => Self::Organization,
            "group" => Self::Group,
            _ => Self::User,
        }
    }

    /// Name of the `data-*` attribute the host uses to carry the entity id.
    pub fn mention_id_attribute(self) -> &'static str {
        match self {
            Self::User => "data-mention-id",
            Self::Organization => "data-org-mention-id",
            Self::Group => "data-group-mention-id",
        }
    }

    pub fn preset_avatar(self) -> Option<&'static str> {
        match self {
            Self::User => None,
            Self::Organization => Some(PRESET_ORGANIZATION_AVATAR),
            Self::Group => Some(PRESET_GROUP_AVATAR),
        }
    }
}

impl fmt::Display for DirectoryEntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Organization => f.write_str("organization"),
            Self::Group => f.write_str("group"),
        }
    }
}

/// A resolved directory entry.
///
/// Identity is `(kind, code)`. `id` is the directory's own opaque identifier and
/// only ever ends up in an HTML data attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntity {
    pub kind: DirectoryEntityKind,
    pub id: SmolStr,
    pub code: SmolStr,
    pub name: SmolStr,
    #[serde(default)]
    pub avatar_url: SmolStr,
}

impl DirectoryEntity {
    pub fn new(
        kind: DirectoryEntityKind,
        id: impl Into<SmolStr>,
        code: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
    ) -> Self {
        let avatar_url = kind.preset_avatar().map(SmolStr::new_static).unwrap_or_default();
        Self {
            kind,
            id: id.into(),
            code: code.into(),
            name: name.into(),
            avatar_url,
        }
    }

    pub fn with_avatar(mut self, avatar_url: impl Into<SmolStr>) -> Self {
        self.avatar_url = avatar_url.into();
        self
    }

    /// Fill in the preset avatar for organizations and groups that came back
    /// without one.
    pub fn with_preset_avatar(mut self) -> Self {
        if self.avatar_url.is_empty() {
            if let Some(preset) = self.kind.preset_avatar() {
                self.avatar_url = SmolStr::new_static(preset);
            }
        }
        self
    }

    pub fn reference(&self) -> EntityRef {
        EntityRef {
            kind: self.kind,
            id: self.id.clone(),
        }
    }
}

/// A `(kind, id)` pair, as found in host markup or passed to batch lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: DirectoryEntityKind,
    pub id: SmolStr,
}

impl EntityRef {
    pub fn new(kind: DirectoryEntityKind, id: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}
