//! Storage module for profile images
//!
//! Provides the storage provider abstraction and its UploadThing
//! implementation.

mod provider;
mod uploadthing_client;

pub use provider::{
    FileDescriptor, FileUrl, PrepareUploadRequest, PresignedUpload, StorageProvider, StoredFile,
    UploadFile, UploadFileResult, UploadMetadata, UploadedFile,
};
pub use uploadthing_client::UploadThingClient;
