//! Uploads and the host URLs for temporary files.
//!
//! Files dropped into the editor are uploaded right away and referenced from
//! the Markdown as `tmp:<fileKey>` until the host turns them into permanent
//! attachments on submit.

use std::future::Future;
use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;

use crate::config::HostConfig;
use crate::error::UploadError;
use crate::login::LoginUser;

/// Extensions that have a dedicated icon on the host.
pub const FILE_ICON_EXTENSIONS: [&str; 9] =
    ["txt", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "pdf", "zip"];

const DOWNLOAD_BLOB_PATH: &str = "/blob/download.do";

static FILE_EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+\.([A-Za-z0-9_]+)$").unwrap());

/// Synchronous URL construction for uploaded files
///
/// The renderer calls these while writing HTML, so they must not block or fail.
pub trait FileLinks {
    /// Signed download URL for a temporary file, with extra query parameters
    /// appended in order.
    fn download_url(&self, file_key: &str, params: &[(&str, &str)]) -> String;

    /// Icon for a file, picked from its extension.
    fn file_icon_url(&self, file_name: &str) -> String;
}

impl<T: FileLinks> FileLinks for &T {
    fn download_url(&self, file_key: &str, params: &[(&str, &str)]) -> String {
        (**self).download_url(file_key, params)
    }

    fn file_icon_url(&self, file_name: &str) -> String {
        (**self).file_icon_url(file_name)
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_key: SmolStr,
    pub is_image: bool,
}

/// Trait for uploading files to the host's temporary blob storage
pub trait FileStore {
    fn upload_file(
        &self,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<UploadedFile, UploadError>>;
}

/// [`FileLinks`] that builds the host's blob URLs from a [`HostConfig`]
#[derive(Debug, Clone)]
pub struct HostFileLinks {
    api_prefix: String,
    locale: String,
    referer: Option<String>,
    icon_base_url: String,
}

impl HostFileLinks {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            api_prefix: config.api_prefix(),
            locale: config.locale.clone(),
            referer: config.referer.as_ref().map(|u| u.to_string()),
            icon_base_url: config.file_icon_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Links for `login`, downloading in the user's locale when it has one.
    pub fn for_login(config: &HostConfig, login: &LoginUser) -> Self {
        let mut links = Self::new(config);
        if !login.locale.is_empty() {
            links.locale = login.locale.to_string();
        }
        links
    }
}

impl Default for HostFileLinks {
    fn default() -> Self {
        Self::new(&HostConfig::default())
    }
}

impl FileLinks for HostFileLinks {
    fn download_url(&self, file_key: &str, params: &[(&str, &str)]) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("fileKey", file_key);
        query.append_pair("_lc", &self.locale);
        if let Some(referer) = &self.referer {
            query.append_pair("_ref", referer);
        }
        for (key, value) in params {
            query.append_pair(key, value);
        }
        format!(
            "{}{}?{}",
            self.api_prefix,
            DOWNLOAD_BLOB_PATH,
            query.finish()
        )
    }

    fn file_icon_url(&self, file_name: &str) -> String {
        let lower = file_name.to_lowercase();
        let icon = FILE_EXTENSION_RE
            .captures(&lower)
            .and_then(|caps| caps.get(1))
            .map(|ext| ext.as_str())
            .filter(|ext| FILE_ICON_EXTENSIONS.contains(ext))
            .unwrap_or("other");
        format!("{}/{}.png", self.icon_base_url, icon)
    }
}

/// An upload that has a placeholder in the draft but no file key yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub name: String,
    pub is_image: bool,
    placeholder: String,
}

impl PendingUpload {
    pub fn new(name: impl Into<String>, is_image: bool) -> Self {
        let name = name.into();
        let placeholder = format!(
            "{}[](Uploading... {})",
            if is_image { "!" } else { "" },
            name
        );
        Self {
            name,
            is_image,
            placeholder,
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
}

/// Markdown that references an uploaded file
///
/// Images carry a `"=<width>"` title so the renderer asks for a thumbnail.
pub fn uploaded_markdown(name: &str, uploaded: &UploadedFile, thumbnail_width: u32) -> String {
    if uploaded.is_image {
        format!(
            "![{}](tmp:{} \"={}\")",
            name, uploaded.file_key, thumbnail_width
        )
    } else {
        format!("[{}](tmp:{})", name, uploaded.file_key)
    }
}

/// Editor text plus caret, updated as uploads start and finish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDraft {
    pub text: String,
    /// Byte offset into `text`
    pub caret: usize,
}

impl UploadDraft {
    pub fn new(text: impl Into<String>, caret: usize) -> Self {
        let text = text.into();
        let caret = clamp_to_boundary(&text, caret);
        Self { text, caret }
    }

    /// Insert the "Uploading..." placeholder at the caret, on its own line.
    pub fn begin(&mut self, name: impl Into<String>, is_image: bool) -> PendingUpload {
        let pending = PendingUpload::new(name, is_image);
        let inserted = format!("{}\n", pending.placeholder());
        self.caret = clamp_to_boundary(&self.text, self.caret);
        self.text.insert_str(self.caret, &inserted);
        self.caret += inserted.len();
        pending
    }

    /// Swap the placeholder for the final reference.
    ///
    /// Returns `false` if the user already removed the placeholder, in which
    /// case the draft is left alone.
    pub fn complete(
        &mut self,
        pending: &PendingUpload,
        uploaded: &UploadedFile,
        thumbnail_width: u32,
    ) -> bool {
        let Some(at) = self.text.find(pending.placeholder()) else {
            return false;
        };
        let replacement = uploaded_markdown(&pending.name, uploaded, thumbnail_width);
        let old_len = pending.placeholder().len();
        let end = at + old_len;
        self.text.replace_range(at..end, &replacement);
        if self.caret >= end {
            self.caret = self.caret - old_len + replacement.len();
        } else if self.caret > at {
            // caret was inside the placeholder
            self.caret = at + replacement.len();
        }
        self.caret = clamp_to_boundary(&self.text, self.caret);
        true
    }

    /// Upload files one after another, updating the draft as each finishes.
    ///
    /// A failed upload keeps its placeholder in the text and is reported back
    /// to the caller; the remaining files are still uploaded.
    pub async fn upload_all<S: FileStore>(
        &mut self,
        store: &S,
        files: Vec<(String, String, Vec<u8>)>,
        thumbnail_width: u32,
    ) -> Vec<UploadError> {
        let mut failures = Vec::new();
        for (name, mime_type, bytes) in files {
            let pending = self.begin(name.clone(), mime_type.starts_with("image/"));
            match store.upload_file(&name, &mime_type, bytes).await {
                Ok(uploaded) => {
                    if !self.complete(&pending, &uploaded, thumbnail_width) {
                        tracing::debug!("upload placeholder for {} was removed", name);
                    }
                }
                Err(e) => {
                    tracing::warn!("upload of {} failed: {}", name, e);
                    failures.push(e);
                }
            }
        }
        failures
    }
}

fn clamp_to_boundary(text: &str, caret: usize) -> usize {
    let mut caret = caret.min(text.len());
    while !text.is_char_boundary(caret) {
        caret -= 1;
    }
    caret
}
