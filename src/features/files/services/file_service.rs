use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};
use crate::features::auth::Role;
use crate::features::files::models::{FileListingEntry, FilePayload, UploadMethod, UploadResult};
use crate::modules::storage::{StorageProvider, UploadFile, UploadMetadata};
use crate::shared::constants::{PROFILE_IMAGE_FILE_TYPE, PROFILE_KEY_PREFIX};

/// Orchestrates profile image uploads against the storage provider
pub struct FileService {
    storage: Arc<dyn StorageProvider>,
    http_client: Client,
}

impl FileService {
    pub fn new(storage: Arc<dyn StorageProvider>, http_client: Client) -> Self {
        Self {
            storage,
            http_client,
        }
    }

    /// Build the storage key `profiles/<owner>/<timestamp>-<file name>`
    pub fn build_key(owner_id: &str, timestamp: i64, file_name: &str) -> String {
        format!(
            "{}/{}/{}-{}",
            PROFILE_KEY_PREFIX, owner_id, timestamp, file_name
        )
    }

    /// Store a profile image, falling back to a signed-URL upload when the
    /// direct upload fails.
    ///
    /// When `old_url` is given, the superseded file is deleted afterwards on a
    /// best-effort basis. Each call produces a new storage key.
    pub async fn upload_profile_image(
        &self,
        payload: FilePayload,
        role: Role,
        owner_id: Option<String>,
        old_url: Option<String>,
    ) -> Result<UploadResult> {
        debug!(
            "Uploading profile image {:?} ({} bytes, {})",
            payload.original_name,
            payload.size.unwrap_or(payload.bytes.len() as u64),
            payload.mime_type
        );

        let now = Utc::now().timestamp_millis();
        let owner = owner_id.unwrap_or_else(|| format!("user-{}", now));
        let key = Self::build_key(&owner, now, &payload.file_name);

        let metadata = UploadMetadata {
            owner_id: Some(owner),
            role,
            file_type: Some(PROFILE_IMAGE_FILE_TYPE.to_string()),
        };

        let result = match self.upload_directly(&payload, &key, &metadata).await {
            Ok(file_url) => UploadResult {
                file_url,
                method: UploadMethod::Direct,
            },
            Err(e) => {
                warn!("Direct upload of {} failed, trying presigned URL: {}", key, e);
                let file_url = self.upload_with_presigned_url(&payload, &key).await?;
                UploadResult {
                    file_url,
                    method: UploadMethod::PresignedUrl,
                }
            }
        };

        info!(
            "Profile image stored: key={}, method={:?}, size={}",
            key,
            result.method,
            payload.bytes.len()
        );

        if let Some(old_url) = old_url {
            self.delete_old_profile_image(&old_url).await;
        }

        Ok(result)
    }

    /// Upload through the provider's bulk upload operation.
    ///
    /// Succeeds when at least one returned item carries a URL.
    pub async fn upload_directly(
        &self,
        payload: &FilePayload,
        key: &str,
        metadata: &UploadMetadata,
    ) -> Result<String> {
        let file = UploadFile {
            name: payload.file_name.clone(),
            mime_type: payload.mime_type.clone(),
            data: payload.bytes.clone(),
            custom_id: Some(key.to_string()),
        };

        let results = self
            .storage
            .upload_files(vec![file], metadata)
            .await
            .map_err(|e| {
                debug!("Direct upload request failed: {}", e);
                AppError::ExternalServiceError("Error uploading file".to_string())
            })?;

        for item in &results {
            if let Some(error) = &item.error {
                debug!("Direct upload item failed: {}", error);
            }
        }

        results
            .into_iter()
            .filter_map(|item| item.data)
            .map(|file| file.url)
            .find(|url| !url.is_empty())
            .ok_or_else(|| AppError::ExternalServiceError("Error uploading file".to_string()))
    }

    /// Upload via a signed URL under the same key, then resolve its public URL
    pub async fn upload_with_presigned_url(&self, payload: &FilePayload, key: &str) -> Result<String> {
        let signed_url = self
            .storage
            .generate_signed_url(key)
            .await?
            .ok_or_else(|| {
                AppError::ExternalServiceError("Error generating presigned URL".to_string())
            })?;

        let response = self
            .http_client
            .put(&signed_url)
            .header(reqwest::header::CONTENT_TYPE, &payload.mime_type)
            .body(payload.bytes.clone())
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!(
                    "Error uploading to presigned URL: {}",
                    e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or(status.as_str());
            return Err(AppError::ExternalServiceError(format!(
                "Error uploading to presigned URL: {}",
                reason
            )));
        }

        let urls = self.storage.get_file_urls(&[key.to_string()]).await?;

        urls.into_iter()
            .map(|f| f.url)
            .find(|url| !url.is_empty())
            .ok_or_else(|| AppError::ExternalServiceError("Could not get file URL".to_string()))
    }

    /// Delete a superseded file identified by the last path segment of its URL.
    ///
    /// Failures are logged and swallowed.
    pub async fn delete_old_profile_image(&self, old_url: &str) {
        let Some(key) = Self::key_from_url(old_url) else {
            warn!("Error deleting old profile image: no key in URL {}", old_url);
            return;
        };

        match self.storage.delete_files(&[key.clone()]).await {
            Ok(()) => debug!("Old profile image deleted: {}", key),
            Err(e) => warn!("Error deleting old profile image: {}", e),
        }
    }

    fn key_from_url(url: &str) -> Option<String> {
        let path = match reqwest::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
        };

        path.rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    }

    /// List stored files in their external shape (single provider page)
    pub async fn list_files(&self) -> Result<Vec<FileListingEntry>> {
        let files = self.storage.list_files().await.map_err(|e| {
            tracing::error!("Failed to list files: {}", e);
            e
        })?;

        Ok(files.into_iter().map(FileListingEntry::from).collect())
    }
}
