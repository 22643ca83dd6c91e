use serde::{Deserialize, Serialize};

use super::{RoleId, User, UserId};

/// A user's membership in a guild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    /// The member's user.
    pub user: User,
    /// Guild nickname.
    #[serde(default)]
    pub nick: Option<String>,
    /// Roles held in the guild, without `@everyone`.
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl Member {
    /// Creates a member with no nickname or roles.
    #[must_use]
    pub fn new(user: User) -> Self {
        Self {
            user,
            nick: None,
            roles: Vec::new(),
        }
    }

    /// Sets the nickname.
    #[must_use]
    pub fn with_nick(mut self, nick: impl Into<String>) -> Self {
        self.nick = Some(nick.into());
        self
    }

    /// Sets the roles.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<RoleId>) -> Self {
        self.roles = roles;
        self
    }

    /// Returns the member's user ID.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.id()
    }

    /// Returns the roles held in the guild.
    #[must_use]
    pub fn roles(&self) -> &[RoleId] {
        &self.roles
    }

    /// Nickname if one is set and non-empty.
    #[must_use]
    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref().filter(|nick| !nick.is_empty())
    }

    /// Returns true if the member holds any of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[RoleId]) -> bool {
        roles.iter().any(|role| self.roles.contains(role))
    }
}
