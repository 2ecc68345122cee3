//! Shared primitive types used across the entire core.

use serde::{Deserialize, Serialize};

/// A stable, unique identifier for a user. Supplied by the identity layer.
pub type UserId = String;

/// A complaint identifier (uuid v4, assigned at creation).
pub type ComplaintId = String;

/// A redemption identifier (uuid v4, assigned at creation).
pub type RedemptionId = String;

/// The closed set of roles the core authorizes against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citizen,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citizen" => Ok(Role::Citizen),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// An already-authenticated caller. The identity layer vouches for the id
/// and role; the core only performs ownership and role checks against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn citizen(id: impl Into<UserId>) -> Self {
        Self { id: id.into(), role: Role::Citizen }
    }

    pub fn admin(id: impl Into<UserId>) -> Self {
        Self { id: id.into(), role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
