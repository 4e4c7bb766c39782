use axum::{
    extract::{
        multipart::MultipartError, rejection::QueryRejection, FromRequest, Multipart, Query,
        Request, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::BytesMut;
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, UploadRejection};
use crate::features::auth::CredentialClaim;
use crate::features::files::dtos::{
    ListFilesResponseDto, ProfileImageFieldsDto, ProfileImageUploadDto,
    ProfileImageUploadResponseDto, WebUploadQueryDto,
};
use crate::features::files::models::{FileListingEntry, FilePayload, UploadMethod};
use crate::features::files::routes::FilesState;
use crate::features::files::services::{classify, UploadRoute, WEB_SDK_FORBIDDEN_MESSAGE};
use crate::shared::constants::{IMAGE_MIME_PREFIX, MAX_PROFILE_IMAGE_SIZE};
use crate::shared::types::ErrorResponse;

/// Upper bound for web SDK JSON bodies
const WEB_BODY_LIMIT: usize = 1024 * 1024;

/// Upload a profile image
///
/// Mobile clients send `multipart/form-data` with:
/// - `file`: The image to upload (required, max 4 MB, image/* only)
/// - `userId`: Owner id used in the storage key (optional)
/// - `oldImageUrl`: URL of the image being replaced, deleted after upload (optional)
///
/// Any other content type is treated as a web SDK request, which requires the
/// admin role. Web SDK actions are selected with `actionType` and `slug`.
#[utoipa::path(
    post,
    path = "/api/files/profile-image",
    tag = "files",
    params(WebUploadQueryDto),
    request_body(
        content = ProfileImageUploadDto,
        content_type = "multipart/form-data",
        description = "Profile image form (mobile clients)",
    ),
    responses(
        (status = 200, description = "Image uploaded successfully (web SDK actions return their own JSON)", body = ProfileImageUploadResponseDto),
        (status = 400, description = "Rejected file or upload request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Web SDK used without admin role", body = ErrorResponse),
        (status = 500, description = "Error uploading image", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_profile_image(
    claim: CredentialClaim,
    State(state): State<FilesState>,
    query: Result<Query<WebUploadQueryDto>, QueryRejection>,
    request: Request,
) -> Result<Response, AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    match classify(content_type, claim.role) {
        UploadRoute::Rejected => Err(AppError::Forbidden(WEB_SDK_FORBIDDEN_MESSAGE.to_string())),
        UploadRoute::WebSdk => {
            // Only web SDK requests carry meaningful query parameters
            let Query(query) = query.map_err(|e| {
                debug!("Rejected web upload query: {}", e);
                AppError::BadRequest(format!("Invalid query string: {}", e.body_text()))
            })?;

            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, WEB_BODY_LIMIT)
                .await
                .map_err(|e| {
                    debug!("Failed to read web upload body: {}", e);
                    AppError::UploadRejected(UploadRejection::Malformed)
                })?;

            let response = state
                .upload_router
                .handle(&claim, &query, &parts.headers, &body)
                .await?;

            Ok(Json(response).into_response())
        }
        UploadRoute::MobileMultipart => {
            let mut multipart = Multipart::from_request(request, &state).await.map_err(|e| {
                debug!("Rejected multipart body: {}", e);
                AppError::UploadRejected(UploadRejection::Malformed)
            })?;

            let (payload, fields) = read_profile_image(&mut multipart).await?;

            fields
                .validate()
                .map_err(|e| AppError::Validation(e.to_string()))?;

            let result = state
                .file_service
                .upload_profile_image(payload, claim.role, fields.user_id, fields.old_image_url)
                .await
                .map_err(|e| e.in_context("Error uploading image"))?;

            let message = match result.method {
                UploadMethod::Direct => "Image uploaded successfully".to_string(),
                UploadMethod::PresignedUrl => {
                    "Image uploaded successfully (using presigned URL)".to_string()
                }
            };

            Ok(Json(ProfileImageUploadResponseDto {
                message,
                file_url: result.file_url,
            })
            .into_response())
        }
    }
}

fn multipart_rejection(e: MultipartError) -> AppError {
    debug!("Failed to read multipart data: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadRejected(UploadRejection::SizeLimit)
    } else {
        AppError::UploadRejected(UploadRejection::Malformed)
    }
}

/// Read exactly one image from field `file` plus the optional text fields
async fn read_profile_image(
    multipart: &mut Multipart,
) -> Result<(FilePayload, ProfileImageFieldsDto), AppError> {
    let mut payload: Option<FilePayload> = None;
    let mut fields = ProfileImageFieldsDto::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_rejection)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                if payload.is_some() {
                    return Err(AppError::UploadRejected(UploadRejection::UnexpectedField));
                }

                let mime_type = field.content_type().unwrap_or("").to_string();
                if !mime_type.starts_with(IMAGE_MIME_PREFIX) {
                    return Err(AppError::UploadRejected(UploadRejection::InvalidType));
                }

                let original_name = field.file_name().map(str::to_string);
                let file_name = original_name
                    .as_deref()
                    .and_then(|name| name.rsplit(['/', '\\']).next())
                    .filter(|name| !name.is_empty())
                    .unwrap_or("image")
                    .to_string();

                let mut bytes = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(multipart_rejection)? {
                    if bytes.len() + chunk.len() > MAX_PROFILE_IMAGE_SIZE {
                        return Err(AppError::UploadRejected(UploadRejection::SizeLimit));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                payload = Some(FilePayload {
                    size: Some(bytes.len() as u64),
                    bytes: bytes.freeze(),
                    mime_type,
                    file_name,
                    original_name,
                });
            }
            "userId" | "oldImageUrl" => {
                let text = field.text().await.map_err(multipart_rejection)?;
                let value = Some(text.trim().to_string()).filter(|v| !v.is_empty());
                if field_name == "userId" {
                    fields.user_id = value;
                } else {
                    fields.old_image_url = value;
                }
            }
            _ if field.file_name().is_some() => {
                return Err(AppError::UploadRejected(UploadRejection::UnexpectedField));
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let payload = payload.ok_or(AppError::UploadRejected(UploadRejection::NoFile))?;
    Ok((payload, fields))
}

/// List stored files
#[utoipa::path(
    get,
    path = "/api/files/list-files",
    tag = "files",
    responses(
        (status = 200, description = "Files retrieved successfully", body = ListFilesResponseDto),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Error listing files", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    _claim: CredentialClaim,
    State(state): State<FilesState>,
) -> Result<Json<ListFilesResponseDto>, AppError> {
    let files: Vec<FileListingEntry> = state
        .file_service
        .list_files()
        .await
        .map_err(|e| e.in_context("Error listing files"))?;

    Ok(Json(ListFilesResponseDto {
        message: "Files retrieved successfully".to_string(),
        file_count: files.len(),
        files,
    }))
}
