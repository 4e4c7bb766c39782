use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::files::{dtos as files_dtos, handlers as files_handlers, models as files_models};
use crate::modules::storage::{FileDescriptor, PresignedUpload};
use crate::shared::types::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Files
        files_handlers::upload_profile_image,
        files_handlers::list_files,
    ),
    components(
        schemas(
            // Shared
            ErrorResponse,
            // Auth
            auth::Role,
            // Files
            files_dtos::ProfileImageUploadDto,
            files_dtos::ProfileImageUploadResponseDto,
            files_dtos::ListFilesResponseDto,
            files_dtos::WebUploadRequestDto,
            files_dtos::UploadCompleteResponseDto,
            files_models::FileListingEntry,
            files_models::UploadMethod,
            FileDescriptor,
            PresignedUpload,
        )
    ),
    tags(
        (name = "files", description = "Profile image upload and listing"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Profile Image Gateway API",
        version = "0.1.0",
        description = "Authenticated profile image uploads backed by UploadThing",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
