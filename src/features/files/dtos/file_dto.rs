use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::files::models::FileListingEntry;
use crate::modules::storage::FileDescriptor;
use crate::shared::validation::OWNER_ID_REGEX;

/// Profile image upload form for OpenAPI documentation
/// Note: This struct is for Swagger UI documentation only.
/// The actual handler reads the multipart stream directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
#[schema(rename_all = "camelCase")]
pub struct ProfileImageUploadDto {
    /// The image to upload (max 4 MB, image/* only)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// Owner id used in the storage key (defaults to `user-<timestamp>`)
    #[schema(example = "user-42")]
    pub user_id: Option<String>,
    /// URL of the image this upload replaces; the old file is deleted
    #[schema(example = "https://utfs.io/f/old-key.jpg")]
    pub old_image_url: Option<String>,
}

/// Text fields accompanying the image in a multipart upload
#[derive(Debug, Default, Validate)]
pub struct ProfileImageFieldsDto {
    #[validate(regex(
        path = *OWNER_ID_REGEX,
        message = "userId may only contain letters, digits, '_' or '-' (max 128)"
    ))]
    pub user_id: Option<String>,
    #[validate(url(message = "oldImageUrl must be a valid URL"))]
    pub old_image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageUploadResponseDto {
    #[schema(example = "Image uploaded successfully")]
    pub message: String,
    pub file_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesResponseDto {
    #[schema(example = "Files retrieved successfully")]
    pub message: String,
    pub file_count: usize,
    pub files: Vec<FileListingEntry>,
}

/// Query string of web SDK requests
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct WebUploadQueryDto {
    /// SDK action, e.g. `upload`
    pub action_type: Option<String>,
    /// File route slug, e.g. `profileImage`
    pub slug: Option<String>,
}

/// Web SDK request announcing the files it wants to upload
#[derive(Debug, Deserialize, ToSchema)]
pub struct WebUploadRequestDto {
    pub files: Vec<FileDescriptor>,
}

/// Metadata echoed back by the provider in completion callbacks
#[derive(Debug, Deserialize)]
pub struct UploadCallbackMetadataDto {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadCallbackFileDto {
    pub url: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Completion callback sent by the provider after a browser upload
#[derive(Debug, Deserialize)]
pub struct UploadCallbackDto {
    pub metadata: UploadCallbackMetadataDto,
    pub file: UploadCallbackFileDto,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadCompleteResponseDto {
    pub file_url: String,
}
