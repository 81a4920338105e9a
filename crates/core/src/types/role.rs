//! User roles.

use serde::{Deserialize, Serialize};

/// The role a user account holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shopper. Can browse, rate, favorite, and open a first comercio.
    #[default]
    Cliente,
    /// Owner of a comercio and its products.
    Emprendedor,
    /// Platform administrator.
    Admin,
}

impl UserRole {
    /// Roles a visitor may pick when registering through the API.
    pub const SELF_REGISTRABLE: [Self; 2] = [Self::Cliente, Self::Emprendedor];

    /// Wire and database spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cliente => "cliente",
            Self::Emprendedor => "emprendedor",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cliente" => Ok(Self::Cliente),
            "emprendedor" => Ok(Self::Emprendedor),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_from_str() {
        for role in [UserRole::Cliente, UserRole::Emprendedor, UserRole::Admin] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("Emprendedor".parse::<UserRole>(), Ok(UserRole::Emprendedor));
        assert!("vendedor".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&UserRole::Emprendedor).unwrap(),
            "\"emprendedor\""
        );
    }

    #[test]
    fn test_admin_is_not_self_registrable() {
        assert!(!UserRole::SELF_REGISTRABLE.contains(&UserRole::Admin));
    }
}
