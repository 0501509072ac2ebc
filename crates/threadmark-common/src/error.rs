//! Error types shared across threadmark crates

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::entity::DirectoryEntityKind;

/// Top-level error type for threadmark operations
#[derive(Debug, Error, Diagnostic)]
pub enum ThreadmarkError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Directory lookup errors
///
/// The mention pipeline never surfaces these to the user; a failed lookup is
/// logged and treated as a miss.
#[derive(Debug, Error, Diagnostic)]
pub enum DirectoryError {
    #[error("directory lookup for {kind} `{code}` failed")]
    #[diagnostic(code(directory::lookup))]
    Lookup {
        kind: DirectoryEntityKind,
        code: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("batch directory lookup failed")]
    #[diagnostic(code(directory::batch))]
    Batch {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to read directory fixture at {}", path.display())]
    #[diagnostic(code(directory::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse directory fixture")]
    #[diagnostic(
        code(directory::parse),
        help("expected a JSON array of entities with kind, id, code and name fields")
    )]
    Parse {
        #[source]
        source: serde_json::Error,
    },
}

/// File upload errors
#[derive(Debug, Error, Diagnostic)]
pub enum UploadError {
    #[error("upload of `{name}` failed")]
    #[diagnostic(code(upload::transport))]
    Transport {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("upload of `{name}` was rejected: {message}")]
    #[diagnostic(code(upload::rejected))]
    Rejected { name: String, message: String },
}

/// Configuration errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid value for {var}: {message}")]
    #[diagnostic(code(config::invalid))]
    Invalid { var: &'static str, message: String },

    #[error("failed to parse URL '{url}': {message}")]
    #[diagnostic(code(config::url_parse))]
    UrlParse { url: String, message: String },
}
