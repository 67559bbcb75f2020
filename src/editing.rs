// 🖼️ Editing Operations - thin wrappers around the remote image collaborator
//
// Flow for one request:
//   1. EditRequest  → validated into an EditJob (inputs present)
//   2. controller   → checks credit + pending state, issues an EditTicket
//   3. EditJob::run → awaits the ImageGenerator (unbounded latency, fallible)
//   4. controller   → completes the ticket: consume one credit on success,
//                     surface the failure verbatim, or discard if stale

use crate::error::{GenerationError, ValidationError};
use crate::identity::SessionToken;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// OPERATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOperation {
    Edit,
    Merge,
}

impl EditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditOperation::Edit => "edit",
            EditOperation::Merge => "merge",
        }
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// IMAGE DATA
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageData {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        ImageData {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Decode a base64 payload (as carried by JSON APIs)
    pub fn from_base64(data: &str, mime_type: impl Into<String>) -> Result<Self, GenerationError> {
        let bytes = Base64::decode_vec(data.trim())
            .map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;
        Ok(ImageData::new(bytes, mime_type))
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.bytes)
    }

    /// Read an image file, inferring the MIME type from its extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
        Ok(ImageData::new(bytes, mime_for_path(path)))
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short SHA-256 prefix, safe to log in place of the image
    pub fn fingerprint(&self) -> String {
        let digest = format!("{:x}", Sha256::digest(&self.bytes));
        digest[..12].to_string()
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "image/png",
    }
}

// ============================================================================
// REQUESTS & JOBS
// ============================================================================

/// Raw user intent; inputs may be missing
#[derive(Debug, Clone)]
pub enum EditRequest {
    Edit {
        image: Option<ImageData>,
        prompt: String,
    },
    Merge {
        first: Option<ImageData>,
        second: Option<ImageData>,
        prompt: String,
    },
}

impl EditRequest {
    pub fn operation(&self) -> EditOperation {
        match self {
            EditRequest::Edit { .. } => EditOperation::Edit,
            EditRequest::Merge { .. } => EditOperation::Merge,
        }
    }

    /// Check that every required input is present
    pub fn into_job(self) -> Result<EditJob, ValidationError> {
        fn present(image: Option<ImageData>) -> Option<ImageData> {
            image.filter(|image| !image.is_empty())
        }

        match self {
            EditRequest::Edit { image, prompt } => match present(image) {
                Some(image) if !prompt.trim().is_empty() => Ok(EditJob::Edit { image, prompt }),
                _ => Err(ValidationError::MissingEditInput),
            },
            EditRequest::Merge { first, second, prompt } => match (present(first), present(second)) {
                (Some(first), Some(second)) if !prompt.trim().is_empty() => {
                    Ok(EditJob::Merge { first, second, prompt })
                }
                _ => Err(ValidationError::MissingMergeInput),
            },
        }
    }
}

/// Validated request, ready to send to the collaborator
#[derive(Debug, Clone)]
pub enum EditJob {
    Edit {
        image: ImageData,
        prompt: String,
    },
    Merge {
        first: ImageData,
        second: ImageData,
        prompt: String,
    },
}

impl EditJob {
    pub fn operation(&self) -> EditOperation {
        match self {
            EditJob::Edit { .. } => EditOperation::Edit,
            EditJob::Merge { .. } => EditOperation::Merge,
        }
    }

    pub async fn run(&self, generator: &dyn ImageGenerator) -> Result<ImageData, GenerationError> {
        match self {
            EditJob::Edit { image, prompt } => generator.edit(image, prompt).await,
            EditJob::Merge { first, second, prompt } => generator.merge(first, second, prompt).await,
        }
    }
}

/// Proof that a request was admitted, tagged with the session that admitted it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditTicket {
    pub operation: EditOperation,
    pub token: SessionToken,
}

/// How a completed request was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Result image; one credit was consumed (unless exempt)
    Delivered(ImageData),
    /// Remote failure; nothing was consumed
    Failed { message: String },
    /// Session changed while the request was in flight; ignored entirely
    Discarded,
}

// ============================================================================
// IMAGE GENERATOR (external collaborator)
// ============================================================================

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn edit(&self, image: &ImageData, prompt: &str) -> Result<ImageData, GenerationError>;

    async fn merge(
        &self,
        first: &ImageData,
        second: &ImageData,
        prompt: &str,
    ) -> Result<ImageData, GenerationError>;
}

// ============================================================================
// TESTS
// ============================================================================
