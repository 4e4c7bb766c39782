use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{AppError, Result, UploadRejection};
use crate::features::auth::CredentialClaim;
use crate::features::files::dtos::{
    UploadCallbackDto, UploadCompleteResponseDto, WebUploadQueryDto, WebUploadRequestDto,
};
use crate::features::files::services::request_classifier::WEB_SDK_FORBIDDEN_MESSAGE;
use crate::modules::storage::{
    FileDescriptor, PrepareUploadRequest, PresignedUpload, StorageProvider, UploadMetadata,
};
use crate::shared::constants::{IMAGE_MIME_PREFIX, MAX_PROFILE_IMAGE_COUNT, MAX_PROFILE_IMAGE_SIZE};

pub const HOOK_HEADER: &str = "uploadthing-hook";
pub const SIGNATURE_HEADER: &str = "x-uploadthing-signature";

/// A named upload destination with its file constraints
#[derive(Debug, Clone)]
pub struct FileRoute {
    pub slug: &'static str,
    pub mime_prefix: &'static str,
    pub max_file_size: usize,
    pub max_file_count: usize,
}

impl FileRoute {
    /// The `profileImage` route: one image of at most 4 MB
    pub fn profile_image() -> Self {
        Self {
            slug: "profileImage",
            mime_prefix: IMAGE_MIME_PREFIX,
            max_file_size: MAX_PROFILE_IMAGE_SIZE,
            max_file_count: MAX_PROFILE_IMAGE_COUNT,
        }
    }

    /// Route config in the provider's format
    fn config(&self) -> serde_json::Value {
        json!({
            "image": {
                "maxFileSize": format!("{}MB", self.max_file_size / (1024 * 1024)),
                "maxFileCount": self.max_file_count,
            }
        })
    }

    fn validate(&self, files: &[FileDescriptor]) -> Result<()> {
        if files.is_empty() {
            return Err(AppError::UploadRejected(UploadRejection::NoFile));
        }
        if files.len() > self.max_file_count {
            return Err(AppError::UploadRejected(UploadRejection::UnexpectedField));
        }
        for file in files {
            if !file.mime_type.starts_with(self.mime_prefix) {
                return Err(AppError::UploadRejected(UploadRejection::InvalidType));
            }
            if file.size > self.max_file_size as u64 {
                return Err(AppError::UploadRejected(UploadRejection::SizeLimit));
            }
        }
        Ok(())
    }

    /// Authorize the caller and produce the metadata attached to the upload
    fn authorize(&self, claim: &CredentialClaim) -> Result<UploadMetadata> {
        if !claim.is_admin() {
            return Err(AppError::Forbidden(WEB_SDK_FORBIDDEN_MESSAGE.to_string()));
        }

        Ok(UploadMetadata {
            owner_id: None,
            role: claim.role,
            file_type: None,
        })
    }

    fn on_upload_complete(&self, callback: UploadCallbackDto) -> UploadCompleteResponseDto {
        info!(
            "File uploaded successfully by user with role {}: {}",
            callback.metadata.role, callback.file.url
        );
        UploadCompleteResponseDto {
            file_url: callback.file.url,
        }
    }
}

/// Response of a web SDK request
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WebUploadResponse {
    Prepared(Vec<PresignedUpload>),
    Completed(UploadCompleteResponseDto),
}

/// Serves the browser SDK protocol for the configured file routes
pub struct UploadRouter {
    storage: Arc<dyn StorageProvider>,
    callback_url: String,
    routes: Vec<FileRoute>,
}

impl UploadRouter {
    pub fn new(storage: Arc<dyn StorageProvider>, callback_url: String) -> Self {
        Self {
            storage,
            callback_url,
            routes: vec![FileRoute::profile_image()],
        }
    }

    fn route(&self, slug: &str) -> Result<&FileRoute> {
        self.routes
            .iter()
            .find(|r| r.slug == slug)
            .ok_or_else(|| AppError::NotFound(format!("No file route found for slug {}", slug)))
    }

    /// Dispatch a web SDK request: completion callbacks first, then actions
    pub async fn handle(
        &self,
        claim: &CredentialClaim,
        query: &WebUploadQueryDto,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<WebUploadResponse> {
        let hook = headers.get(HOOK_HEADER).and_then(|v| v.to_str().ok());
        if hook == Some("callback") {
            return self.handle_callback(query, headers, body).map(WebUploadResponse::Completed);
        }

        match query.action_type.as_deref() {
            Some("upload") => self
                .handle_upload(claim, query, body)
                .await
                .map(WebUploadResponse::Prepared),
            other => {
                debug!("Unknown web upload action: {:?}", other);
                Err(AppError::UploadRejected(UploadRejection::UnknownAction))
            }
        }
    }

    async fn handle_upload(
        &self,
        claim: &CredentialClaim,
        query: &WebUploadQueryDto,
        body: &[u8],
    ) -> Result<Vec<PresignedUpload>> {
        let route = self.route(query.slug.as_deref().unwrap_or_default())?;

        let request: WebUploadRequestDto = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid upload request: {}", e)))?;

        route.validate(&request.files)?;
        let metadata = route.authorize(claim)?;

        let uploads = self
            .storage
            .prepare_upload(PrepareUploadRequest {
                files: request.files,
                route_config: route.config(),
                metadata,
                callback_url: self.callback_url.clone(),
                callback_slug: route.slug.to_string(),
            })
            .await?;

        debug!("Prepared {} presigned upload(s) for {}", uploads.len(), route.slug);
        Ok(uploads)
    }

    fn handle_callback(
        &self,
        query: &WebUploadQueryDto,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<UploadCompleteResponseDto> {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::UploadRejected(UploadRejection::InvalidSignature))?;

        if !self.storage.verify_signature(body, signature) {
            return Err(AppError::UploadRejected(UploadRejection::InvalidSignature));
        }

        let route = match query.slug.as_deref() {
            Some(slug) => self.route(slug)?,
            None => self.route(FileRoute::profile_image().slug)?,
        };

        let callback: UploadCallbackDto = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid callback payload: {}", e)))?;

        Ok(route.on_upload_complete(callback))
    }
}
