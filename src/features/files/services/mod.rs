mod file_service;
pub mod request_classifier;
mod upload_router;

pub use file_service::FileService;
pub use request_classifier::{classify, UploadRoute, WEB_SDK_FORBIDDEN_MESSAGE};
pub use upload_router::UploadRouter;
