mod file;

pub use file::{FileListingEntry, FilePayload, UploadMethod, UploadResult};
