pub mod file_handler;

pub use file_handler::{
    __path_list_files, __path_upload_profile_image, list_files, upload_profile_image,
};
