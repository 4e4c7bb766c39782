use super::model::{CredentialClaim, Role};
use crate::core::error::AppError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::Duration;

const BEARER_PREFIX: &str = "Bearer ";

/// Verifies HS256 bearer tokens signed with the process-wide secret
pub struct JwtValidator {
    decoding_key: DecodingKey,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    email: Option<String>,
    /// Subject id of the caller
    #[serde(default)]
    uuid: Option<String>,
}

impl JwtValidator {
    pub fn new(secret: &str, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway: leeway.as_secs(),
        }
    }

    /// Parse an `Authorization` header value and verify the bearer token in it
    pub fn verify_authorization(&self, header: Option<&str>) -> Result<CredentialClaim, AppError> {
        let header =
            header.ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

        let token = header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;

        self.validate_token(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<CredentialClaim, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        // `exp` is checked when present but not required
        validation.required_spec_claims.clear();

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Token has expired".to_string())
                    }
                    _ => {
                        tracing::debug!("Token verification failed: {}", e);
                        AppError::Unauthorized("Invalid token".to_string())
                    }
                }
            })?;

        let claims = token_data.claims;

        let role = required_claim(claims.role, "role")?;
        let email = required_claim(claims.email, "email")?;
        let subject_id = required_claim(claims.uuid, "uuid")?;

        Ok(CredentialClaim {
            role: Role::from_claim(&role),
            email,
            subject_id,
        })
    }
}

fn required_claim(value: Option<String>, name: &str) -> Result<String, AppError> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| {
        tracing::debug!("Token is missing required claim '{}'", name);
        AppError::Unauthorized("Invalid token payload".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{create_token, TEST_JWT_SECRET};
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;
    use serde_json::json;

    fn validator() -> JwtValidator {
        JwtValidator::new(TEST_JWT_SECRET, Duration::from_secs(0))
    }

    fn exp_in(secs: i64) -> i64 {
        chrono::Utc::now().timestamp() + secs
    }

    fn assert_unauthorized(result: Result<CredentialClaim, AppError>) {
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_valid_token() {
        let email: String = SafeEmail().fake();
        let token = create_token(
            TEST_JWT_SECRET,
            json!({ "role": "user", "email": email, "uuid": "123456789101", "exp": exp_in(3600) }),
        );

        let claim = validator().validate_token(&token).unwrap();
        assert_eq!(claim.role, Role::User);
        assert_eq!(claim.email, email);
        assert_eq!(claim.subject_id, "123456789101");
    }

    #[test]
    fn test_admin_role_preserved() {
        let token = create_token(
            TEST_JWT_SECRET,
            json!({ "role": "admin", "email": "a@example.com", "uuid": "1", "exp": exp_in(3600) }),
        );

        let claim = validator().validate_token(&token).unwrap();
        assert!(claim.is_admin());
    }

    #[test]
    fn test_unknown_role_normalized_to_user() {
        for role in ["invalidRole", "ADMIN", "root", "moderator"] {
            let token = create_token(
                TEST_JWT_SECRET,
                json!({ "role": role, "email": "a@example.com", "uuid": "1", "exp": exp_in(3600) }),
            );

            let claim = validator().validate_token(&token).unwrap();
            assert_eq!(claim.role, Role::User, "role {} should normalize", role);
        }
    }

    #[test]
    fn test_missing_required_claims() {
        let payloads = [
            json!({ "email": "a@example.com", "uuid": "1", "exp": exp_in(3600) }),
            json!({ "role": "user", "uuid": "1", "exp": exp_in(3600) }),
            json!({ "role": "user", "email": "a@example.com", "exp": exp_in(3600) }),
            json!({ "role": "user", "email": "", "uuid": "1", "exp": exp_in(3600) }),
        ];

        for payload in payloads {
            let token = create_token(TEST_JWT_SECRET, payload);
            assert_unauthorized(validator().validate_token(&token));
        }
    }

    #[test]
    fn test_token_without_exp_accepted() {
        let token = create_token(
            TEST_JWT_SECRET,
            json!({ "role": "user", "email": "a@example.com", "uuid": "1" }),
        );

        let claim = validator().validate_token(&token).unwrap();
        assert_eq!(claim.role, Role::User);
        assert_eq!(claim.subject_id, "1");
    }

    #[test]
    fn test_expired_token() {
        let token = create_token(
            TEST_JWT_SECRET,
            json!({ "role": "user", "email": "a@example.com", "uuid": "1", "exp": exp_in(-3600) }),
        );

        match validator().validate_token(&token) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token has expired"),
            other => panic!("expected expired token error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_secret_and_garbage() {
        let token = create_token(
            "another-secret",
            json!({ "role": "user", "email": "a@example.com", "uuid": "1", "exp": exp_in(3600) }),
        );
        assert_unauthorized(validator().validate_token(&token));
        assert_unauthorized(validator().validate_token("invalidToken"));
    }

    #[test]
    fn test_authorization_header_parsing() {
        let v = validator();
        match v.verify_authorization(None) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "No token provided"),
            other => panic!("unexpected: {:?}", other),
        }
        for header in ["Basic abc", "Bearer ", "Bearer    ", "bearer token"] {
            match v.verify_authorization(Some(header)) {
                Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Invalid token format"),
                other => panic!("unexpected for {:?}: {:?}", header, other),
            }
        }

        let token = create_token(
            TEST_JWT_SECRET,
            json!({ "role": "admin", "email": "a@example.com", "uuid": "1", "exp": exp_in(3600) }),
        );
        let claim = v
            .verify_authorization(Some(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(claim.role, Role::Admin);
    }
}
