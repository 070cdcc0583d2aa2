use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role, fixed at registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Admin => "Admin",
        }
    }

    /// Parses a requested role; a missing or blank value means `User`.
    pub fn parse_requested(raw: Option<&str>) -> Result<Self, UnknownRole> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Role::User),
            Some(s) if s.eq_ignore_ascii_case("user") => Ok(Role::User),
            Some(s) if s.eq_ignore_ascii_case("admin") => Ok(Role::Admin),
            Some(s) => Err(UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "User" => Ok(Role::User),
            "Admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(value)),
        }
    }
}

/// JWT payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    pub email: String,  // normalized email
    pub role: Role,
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_role_defaults_to_user() {
        assert_eq!(Role::parse_requested(None).unwrap(), Role::User);
        assert_eq!(Role::parse_requested(Some("  ")).unwrap(), Role::User);
    }

    #[test]
    fn requested_role_is_case_insensitive() {
        assert_eq!(Role::parse_requested(Some("admin")).unwrap(), Role::Admin);
        assert_eq!(Role::parse_requested(Some("USER")).unwrap(), Role::User);
    }

    #[test]
    fn requested_role_rejects_unknown_values() {
        let err = Role::parse_requested(Some("Superuser")).unwrap_err();
        assert_eq!(err.0, "Superuser");
    }

    #[test]
    fn stored_role_round_trips_through_text() {
        assert_eq!(Role::try_from(Role::Admin.as_str().to_string()).unwrap(), Role::Admin);
        assert!(Role::try_from("admin".to_string()).is_err());
    }
}
