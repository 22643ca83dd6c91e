use serde::{Deserialize, Serialize};

use super::Permissions;

snowflake_id!(
    /// Unique identifier for a guild role.
    RoleId
);

/// A guild role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    /// Role ID. Equals the guild ID for `@everyone`.
    pub id: RoleId,
    /// Role name.
    pub name: String,
    /// Position in the role hierarchy.
    #[serde(default)]
    pub position: i32,
    /// Guild-wide permissions granted.
    #[serde(default)]
    pub permissions: Permissions,
    /// Whether members may mention the role.
    #[serde(default)]
    pub mentionable: bool,
}

impl Role {
    /// Creates a mentionable role with no permissions.
    #[must_use]
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: 0,
            permissions: Permissions::empty(),
            mentionable: true,
        }
    }

    /// Sets the permissions.
    #[must_use]
    pub const fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Returns the role ID.
    #[must_use]
    pub const fn id(&self) -> RoleId {
        self.id
    }
}
