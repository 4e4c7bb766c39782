use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{list_files, upload_profile_image};
use crate::features::files::services::{FileService, UploadRouter};
use crate::shared::constants::MAX_PROFILE_IMAGE_SIZE;

/// Shared state of the files feature
#[derive(Clone)]
pub struct FilesState {
    pub file_service: Arc<FileService>,
    pub upload_router: Arc<UploadRouter>,
}

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>, upload_router: Arc<UploadRouter>) -> Router {
    let state = FilesState {
        file_service,
        upload_router,
    };

    Router::new()
        .route(
            "/api/files/profile-image",
            // Allow body size up to MAX_PROFILE_IMAGE_SIZE + buffer for multipart overhead
            post(upload_profile_image)
                .layer(DefaultBodyLimit::max(MAX_PROFILE_IMAGE_SIZE + 1024 * 1024)),
        )
        .route("/api/files/list-files", get(list_files))
        .with_state(state)
}
