//! Media loading and base64 encoding
//!
//! Reads user-supplied image or video files and turns them into the inline
//! base64 payload sent to the provider.

pub mod mime;

use crate::Result;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Kind of media under analysis. Selects the accept filter and prompt wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    pub fn accept_filter(&self) -> &'static str {
        match self {
            MediaType::Image => "image/*",
            MediaType::Video => "video/*",
        }
    }

    /// Infer the media type from a MIME type; only `video/*` maps to video.
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("video/") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }

    /// Whether a MIME type passes this type's accept filter.
    pub fn accepts(&self, mime_type: &str) -> bool {
        let prefix = self.accept_filter().trim_end_matches('*');
        mime_type.starts_with(prefix)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            other => Err(format!(
                "Invalid media type '{}'. Expected 'image' or 'video'",
                other
            )),
        }
    }
}

/// An in-memory file selected for analysis.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, resolving its MIME type from content or extension.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            tracing::error!("Failed to read media file {}: {}", path.display(), e);
            e
        })?;

        let mime_type = mime::resolve_mime(&bytes, path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(
            "Read {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            mime_type
        );

        Ok(Self::new(file_name, mime_type, bytes))
    }
}

/// Base64 payload paired with the MIME type it was read as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMedia {
    pub mime_type: String,
    pub data: String,
}

/// `data:<mime>;base64,<payload>` for the given file.
pub fn to_data_url(file: &MediaFile) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(&file.bytes);
    format!("data:{};base64,{}", file.mime_type, payload)
}

/// Drop a leading `data:<mime>;base64,` marker, if any.
pub fn strip_data_url_prefix(input: &str) -> &str {
    if !input.starts_with("data:") {
        return input;
    }
    match input.split_once(',') {
        Some((_, payload)) => payload,
        None => input,
    }
}

/// Base64 of the file's bytes without the data URL prefix.
pub fn encode_base64(file: &MediaFile) -> EncodedMedia {
    let data_url = to_data_url(file);
    EncodedMedia {
        mime_type: file.mime_type.clone(),
        data: strip_data_url_prefix(&data_url).to_string(),
    }
}

/// Read a file to completion and encode it.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<EncodedMedia> {
    let file = MediaFile::read(path).await?;
    Ok(encode_base64(&file))
}
