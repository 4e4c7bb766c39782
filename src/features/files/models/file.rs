use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::modules::storage::StoredFile;

/// A validated image taken from a multipart request
///
/// `bytes` is reference counted, so both upload attempts share one buffer.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub bytes: Bytes,
    pub mime_type: String,
    pub file_name: String,
    pub original_name: Option<String>,
    pub size: Option<u64>,
}

/// Which strategy produced the stored file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum UploadMethod {
    Direct,
    PresignedUrl,
}

/// Outcome of one accepted profile image upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub file_url: String,
    pub method: UploadMethod,
}

/// External shape of a stored file in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileListingEntry {
    pub name: String,
    pub key: String,
    pub size: u64,
    /// ISO-8601 with millisecond precision, e.g. `2020-01-01T00:00:00.000Z`
    #[schema(example = "2020-01-01T00:00:00.000Z")]
    pub uploaded_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
}

impl From<StoredFile> for FileListingEntry {
    fn from(file: StoredFile) -> Self {
        let uploaded_at = DateTime::<Utc>::from_timestamp_millis(file.uploaded_at)
            .unwrap_or_else(|| {
                warn!(
                    "File '{}' has out-of-range uploadedAt {}; reporting epoch",
                    file.key, file.uploaded_at
                );
                DateTime::<Utc>::default()
            })
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        Self {
            name: file.name,
            key: file.key,
            size: file.size,
            uploaded_at,
            custom_id: file.custom_id,
        }
    }
}
