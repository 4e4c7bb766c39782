use crate::features::auth::Role;

/// Upload path a request is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadRoute {
    MobileMultipart,
    WebSdk,
    Rejected,
}

/// Message returned to non-admin callers of the web SDK path
pub const WEB_SDK_FORBIDDEN_MESSAGE: &str =
    "Access denied. Administrator role required to use the web SDK.";

/// Decide the upload path from the request content type and caller role.
///
/// Multipart bodies always take the mobile path. Anything else is a web SDK
/// request, which only administrators may use.
pub fn classify(content_type: Option<&str>, role: Role) -> UploadRoute {
    let is_multipart = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("multipart/form-data"))
        .unwrap_or(false);

    if is_multipart {
        UploadRoute::MobileMultipart
    } else if role == Role::Admin {
        UploadRoute::WebSdk
    } else {
        UploadRoute::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_is_mobile_for_any_role() {
        let ct = Some("multipart/form-data; boundary=----abc");
        assert_eq!(classify(ct, Role::User), UploadRoute::MobileMultipart);
        assert_eq!(classify(ct, Role::Admin), UploadRoute::MobileMultipart);
        assert_eq!(
            classify(Some("Multipart/Form-Data; boundary=x"), Role::User),
            UploadRoute::MobileMultipart
        );
    }

    #[test]
    fn test_non_multipart_requires_admin() {
        assert_eq!(classify(Some("application/json"), Role::Admin), UploadRoute::WebSdk);
        assert_eq!(classify(None, Role::Admin), UploadRoute::WebSdk);
        assert_eq!(classify(Some("application/json"), Role::User), UploadRoute::Rejected);
        assert_eq!(classify(None, Role::User), UploadRoute::Rejected);
    }
}
