//! Object storage for uploaded resumes.
//!
//! # Responsibilities
//! - Enforce the resume type allow-list and size ceiling
//! - Generate collision-resistant object keys
//! - Upload, publicly reference and (for cleanup) delete stored objects
//!
//! # Design Decisions
//! - Type and size checks are split so the route can refuse a bad declared
//!   content-type before reading the part at all
//! - Client-caused failures (type, size) and backend failures are distinct
//!   variants; the error boundary maps them to 400 and 503 respectively

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{BackendConfig, StorageConfig};

const STORAGE_PREFIX: &str = "/storage/v1";
const DETAIL_MAX_LEN: usize = 300;

/// Accepted resume content-types and their canonical extensions.
pub const ALLOWED_RESUME_TYPES: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
];

/// Failures talking to the storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("storage rejected the operation ({status}): {detail}")]
    Rejected { status: u16, detail: String },
}

/// Why a resume was not stored.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Client sent more bytes than the configured ceiling.
    #[error("file is too large ({size} bytes; the limit is {limit})")]
    TooLarge { size: usize, limit: usize },
    /// Client declared a type outside the allow-list.
    #[error("unsupported file type {content_type:?}; accepted types are PDF, DOC and DOCX")]
    UnsupportedType { content_type: String },
    /// The storage backend failed; not the client's fault.
    #[error("resume storage failed: {0}")]
    Backend(#[from] StorageError),
}

/// Client for the backend's object-storage API, bound to one bucket.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: Client,
    base: String,
    key: String,
    bucket: String,
    max_bytes: usize,
}

impl StorageClient {
    /// Uses the service credential when configured, the public one otherwise
    /// (a bucket with a permissive insert policy still works without it).
    pub fn new(backend: &BackendConfig, storage: &StorageConfig) -> Result<Self, StorageError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(backend.timeout_secs))
            .connect_timeout(Duration::from_secs(backend.connect_timeout_secs))
            .build()?;
        let key = if backend.service_role_key.is_empty() {
            backend.anon_key.clone()
        } else {
            backend.service_role_key.clone()
        };
        Ok(Self {
            http,
            base: format!("{}{STORAGE_PREFIX}", backend.url),
            key,
            bucket: storage.bucket.clone(),
            max_bytes: storage.max_upload_bytes,
        })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check a declared content-type against the allow-list, returning the
    /// canonical extension. Runs before any bytes are read.
    pub fn validate_type(&self, content_type: &str) -> Result<&'static str, UploadError> {
        let normalized = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        ALLOWED_RESUME_TYPES
            .iter()
            .find(|(mime, _)| *mime == normalized)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| UploadError::UnsupportedType {
                content_type: content_type.to_string(),
            })
    }

    pub fn validate_size(&self, size: usize) -> Result<(), UploadError> {
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Collision-resistant object key: millisecond timestamp, random token,
    /// and the original extension (falling back to the type's canonical one).
    pub fn object_key(&self, original_filename: Option<&str>, fallback_ext: &str) -> String {
        let ext = original_filename
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| {
                (1..=10).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| fallback_ext.to_string());
        format!(
            "{}_{}.{ext}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        )
    }

    /// Upload the bytes under `key`, returning the public reference.
    pub async fn store_resume(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let response = self
            .http
            .post(format!("{}/object/{}/{key}", self.base, self.bucket))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let mut detail = response.text().await.unwrap_or_default();
            if detail.len() > DETAIL_MAX_LEN {
                detail.truncate(DETAIL_MAX_LEN);
                detail.push_str("...");
            }
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(self.public_url(key))
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/object/public/{}/{key}", self.base, self.bucket)
    }

    /// Best-effort removal, used to compensate when an insert fails after the
    /// upload already succeeded.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self
            .http
            .delete(format!("{}/object/{}/{key}", self.base, self.bucket))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(())
    }
}
