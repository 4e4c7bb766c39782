use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::ROLE_ADMIN;

/// Caller role, closed to two values at the trust boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Normalize a raw token role: only the literal `admin` grants admin access
    pub fn from_claim(raw: &str) -> Self {
        if raw == ROLE_ADMIN {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verified identity of the caller, inserted into request extensions by the
/// auth middleware and extracted by handlers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialClaim {
    pub role: Role,
    pub email: String,
    pub subject_id: String,
}

impl CredentialClaim {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_normalization() {
        assert_eq!(Role::from_claim("admin"), Role::Admin);
        assert_eq!(Role::from_claim("user"), Role::User);
        assert_eq!(Role::from_claim("Admin"), Role::User);
        assert_eq!(Role::from_claim("superuser"), Role::User);
        assert_eq!(Role::from_claim(""), Role::User);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::User.to_string(), "user");
    }
}
