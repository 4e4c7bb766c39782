/// Maximum accepted profile image size in bytes (4 MiB)
pub const MAX_PROFILE_IMAGE_SIZE: usize = 4 * 1024 * 1024;

/// Maximum number of files per profile image upload
pub const MAX_PROFILE_IMAGE_COUNT: usize = 1;

/// MIME type prefix accepted for profile images
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Prefix of every profile image storage key
pub const PROFILE_KEY_PREFIX: &str = "profiles";

/// Metadata `fileType` attached to profile image uploads
pub const PROFILE_IMAGE_FILE_TYPE: &str = "profile-image";

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// The only role string that maps to administrator access
pub const ROLE_ADMIN: &str = "admin";
