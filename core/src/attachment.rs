//! Staged file attachments and the policy for carrying them across turns.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::errors::{GeminiError, GeminiResult};
use crate::types::InlineData;

/// Mime types the API accepts as inline image data
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
    "image/gif",
];

/// A file the user selected but has not sent yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    /// Base64 encoded file contents
    pub data: String,
    pub mime_type: String,
}

impl PendingAttachment {
    /// Encodes raw file bytes
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> GeminiResult<Self> {
        if bytes.is_empty() {
            return Err(GeminiError::AttachmentError("Attachment is empty".to_string()));
        }
        let mime_type = normalize_mime_type(mime_type)?;

        Ok(Self {
            data: STANDARD.encode(bytes),
            mime_type,
        })
    }

    /// Reads a file from disk, guessing its mime type from the extension
    pub fn from_file(path: &Path) -> GeminiResult<Self> {
        let mime = mime_guess::from_path(path).first().ok_or_else(|| {
            GeminiError::AttachmentError(format!(
                "Cannot determine the file type of {}",
                path.display()
            ))
        })?;
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes, mime.essence_str())
    }

    /// Parses a `data:<mime>;base64,<payload>` URL
    pub fn from_data_url(url: &str) -> GeminiResult<Self> {
        let invalid = || GeminiError::AttachmentError("Malformed data URL".to_string());

        let rest = url.trim().strip_prefix("data:").ok_or_else(invalid)?;
        let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(invalid)?;

        let decoded = STANDARD
            .decode(payload)
            .map_err(|e| GeminiError::AttachmentError(format!("Invalid base64 payload: {}", e)))?;
        if decoded.is_empty() {
            return Err(GeminiError::AttachmentError("Attachment is empty".to_string()));
        }

        Ok(Self {
            data: payload.to_string(),
            mime_type: normalize_mime_type(mime_type)?,
        })
    }

    /// Size of the decoded file in bytes
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4) * 3 - padding.min(2)
    }
}

impl From<PendingAttachment> for InlineData {
    fn from(value: PendingAttachment) -> Self {
        InlineData {
            data: value.data,
            mime_type: value.mime_type,
        }
    }
}

fn normalize_mime_type(mime_type: &str) -> GeminiResult<String> {
    let normalized = mime_type.trim().to_ascii_lowercase();
    if SUPPORTED_MIME_TYPES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(GeminiError::AttachmentError(format!(
            "Unsupported attachment type: {}",
            mime_type
        )))
    }
}

/// Whether an earlier attachment is resent when the user does not stage a new one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentPolicy {
    /// Resend the most recent attachment found in the conversation log
    #[default]
    ReuseLatest,
    /// Only send what was staged for the turn itself
    ExplicitOnly,
}

impl fmt::Display for AttachmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentPolicy::ReuseLatest => write!(f, "reuse-latest"),
            AttachmentPolicy::ExplicitOnly => write!(f, "explicit-only"),
        }
    }
}

impl FromStr for AttachmentPolicy {
    type Err = GeminiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reuse-latest" => Ok(AttachmentPolicy::ReuseLatest),
            "explicit-only" => Ok(AttachmentPolicy::ExplicitOnly),
            other => Err(GeminiError::ConfigError(format!(
                "Unknown attachment policy '{}' (expected reuse-latest or explicit-only)",
                other
            ))),
        }
    }
}
