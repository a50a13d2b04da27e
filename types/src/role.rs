//! Capability roles checked before privileged operations.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A role an account can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Grants and revokes every role, including itself.
    Admin,
    /// Slashes stakes and tunes the withdrawal delay and window.
    Slasher,
    /// Adds and removes yield plugins.
    PluginEditor,
    /// Rescues tokens sent to the module by mistake.
    Recovery,
    /// Stakes on behalf of others and moves stakes out during a migration.
    Migrator,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Slasher,
        Role::PluginEditor,
        Role::Recovery,
        Role::Migrator,
    ];

    /// Human-readable name of this role.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Slasher => "slasher",
            Self::PluginEditor => "plugin_editor",
            Self::Recovery => "recovery",
            Self::Migrator => "migrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| TypesError::UnknownRole(s.to_string()))
    }
}
