//! Profile image uploads backed by the storage provider.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/files/profile-image` | Upload a profile image (mobile multipart or admin web SDK) |
//! | GET | `/api/files/list-files` | List stored files |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::{routes, FilesState};
pub use services::{FileService, UploadRouter};
