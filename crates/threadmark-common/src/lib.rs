//! Shared types for threadmark
//!
//! The directory entity model, the collaborator traits the renderer talks to
//! (directory lookup, uploads, file URLs), host configuration and errors.

pub mod config;
pub mod directory;
pub mod entity;
pub mod error;
pub mod files;
pub mod login;

pub use crate::config::HostConfig;
pub use crate::directory::{DirectoryLookup, StaticDirectory};
pub use crate::entity::{DirectoryEntity, DirectoryEntityKind, EntityRef};
pub use crate::error::{ConfigError, DirectoryError, ThreadmarkError, UploadError};
pub use crate::files::{FileLinks, FileStore, HostFileLinks, UploadDraft, UploadedFile};
pub use crate::login::LoginUser;
