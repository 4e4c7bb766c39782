//! Storage provider abstraction
//!
//! The gateway only needs a handful of operations from the object-storage
//! provider. Keeping them behind a trait lets the upload orchestration run
//! against UploadThing in production and a recording fake in tests.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::error::Result;
use crate::features::auth::Role;

/// A file handed to the provider's bulk upload operation
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
    /// Caller-chosen identifier stored alongside the object (the storage key)
    pub custom_id: Option<String>,
}

/// Metadata attached to an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

/// A file successfully stored by the provider
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub key: String,
    pub url: String,
    pub name: String,
    pub size: u64,
    pub custom_id: Option<String>,
}

/// Per-item outcome of a bulk upload
#[derive(Debug, Clone)]
pub struct UploadFileResult {
    pub data: Option<UploadedFile>,
    pub error: Option<String>,
}

impl UploadFileResult {
    pub fn success(file: UploadedFile) -> Self {
        Self {
            data: Some(file),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Public URL resolved for a storage key
#[derive(Debug, Clone, Deserialize)]
pub struct FileUrl {
    pub key: String,
    pub url: String,
}

/// Raw listing record as reported by the provider
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    pub key: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch
    pub uploaded_at: i64,
    #[serde(default)]
    pub custom_id: Option<String>,
}

/// File announced by a browser client before it uploads
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Request to register browser uploads and obtain presigned targets
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareUploadRequest {
    pub files: Vec<FileDescriptor>,
    pub route_config: serde_json::Value,
    pub metadata: UploadMetadata,
    pub callback_url: String,
    pub callback_slug: String,
}

/// Presigned target the browser uploads one file to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub key: String,
    pub url: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Store files, reporting success or failure per item
    async fn upload_files(
        &self,
        files: Vec<UploadFile>,
        metadata: &UploadMetadata,
    ) -> Result<Vec<UploadFileResult>>;

    /// Create a time-limited URL that accepts a `PUT` of the object bytes
    async fn generate_signed_url(&self, key: &str) -> Result<Option<String>>;

    /// Resolve public URLs for stored keys
    async fn get_file_urls(&self, keys: &[String]) -> Result<Vec<FileUrl>>;

    async fn delete_files(&self, keys: &[String]) -> Result<()>;

    /// List stored files (single page)
    async fn list_files(&self) -> Result<Vec<StoredFile>>;

    /// Register browser uploads and return their presigned targets
    async fn prepare_upload(&self, request: PrepareUploadRequest) -> Result<Vec<PresignedUpload>>;

    /// Check a provider callback signature over the raw request body
    fn verify_signature(&self, payload: &[u8], signature: &str) -> bool;
}
