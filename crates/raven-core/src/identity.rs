//! Authenticated identity and faction roles
//!
//! The host supplies an already-authenticated identity at mount time;
//! the core never performs authentication itself. Identities are
//! immutable values, replaced wholesale on user switch.

use crate::identifiers::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Faction label driving mutual visibility restrictions
///
/// Red and Blue are mutually invisible; White sees and is seen by
/// everyone. See [`crate::visibility`] for the full policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Red faction
    Red,
    /// Blue faction
    Blue,
    /// Neutral faction, visible to all
    White,
}

impl Role {
    /// Decode a loosely-typed role label from host props.
    ///
    /// Unrecognized labels fall back to [`Role::Red`], the most
    /// restrictive viewer role under the visibility policy.
    pub fn from_label(label: &str) -> Self {
        match label {
            "BLUE" => Self::Blue,
            "WHITE" => Self::White,
            _ => Self::Red,
        }
    }

    /// Wire label for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::White => "WHITE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated user as handed down by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Faction role used for visibility filtering
    pub role: Role,
}

impl Identity {
    /// Create a new identity value
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}

/// A read-only directory listing entry supplied by the injected
/// directory capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// User identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Organizational department
    pub department: String,
    /// Faction role of the listed user
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_labels_round_trip() {
        for role in [Role::Red, Role::Blue, Role::White] {
            assert_eq!(Role::from_label(role.as_str()), role);
        }
    }

    #[test]
    fn unknown_label_defaults_to_red() {
        assert_eq!(Role::from_label("GREEN"), Role::Red);
        assert_eq!(Role::from_label(""), Role::Red);
    }

    #[test]
    fn role_serde_uses_uppercase_tags() {
        assert_eq!(serde_json::to_string(&Role::White).unwrap(), "\"WHITE\"");
        let role: Role = serde_json::from_str("\"BLUE\"").unwrap();
        assert_eq!(role, Role::Blue);
    }
}
