use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
        }
    }

    /// Only faculty and admins may compose notifications.
    pub fn can_compose(&self) -> bool {
        matches!(self, Role::Faculty | Role::Admin)
    }

    /// Roles this sender may address as a broadcast group. Admins may
    /// additionally reach the faculty cohort; nobody broadcasts to admins.
    pub fn broadcast_targets(&self) -> &'static [Role] {
        match self {
            Role::Student => &[],
            Role::Faculty => &[Role::Student],
            Role::Admin => &[Role::Student, Role::Faculty],
        }
    }

    pub fn can_broadcast_to(&self, target: Role) -> bool {
        self.broadcast_targets().contains(&target)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            other => Err(anyhow!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: String,
    pub role: Role,
}

impl Profile {
    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

/// The identity a notification list is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<&Profile> for Viewer {
    fn from(profile: &Profile) -> Self {
        profile.viewer()
    }
}
