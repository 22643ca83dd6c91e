//! Custom guild emoji.

use serde::{Deserialize, Serialize};

use super::RoleId;

snowflake_id!(
    /// Unique identifier for a custom emoji.
    EmojiId
);

/// A custom emoji from a guild's catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Emoji {
    /// Emoji ID.
    pub id: EmojiId,
    /// Name used in `:name:` shortcodes.
    pub name: String,
    /// Whether the emoji is animated.
    #[serde(default)]
    pub animated: bool,
    /// Roles allowed to use the emoji. Empty means everyone.
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl Emoji {
    /// Creates a static emoji usable by everyone.
    #[must_use]
    pub fn new(id: impl Into<EmojiId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            animated: false,
            roles: Vec::new(),
        }
    }

    /// Marks the emoji as animated.
    #[must_use]
    pub const fn animated(mut self) -> Self {
        self.animated = true;
        self
    }

    /// Restricts the emoji to the given roles.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<RoleId>) -> Self {
        self.roles = roles;
        self
    }

    /// Returns true if only some roles may use the emoji.
    #[must_use]
    pub fn is_role_gated(&self) -> bool {
        !self.roles.is_empty()
    }

    /// Wire form, `<:name:id>` or `<a:name:id>`.
    #[must_use]
    pub fn wire_token(&self) -> String {
        if self.animated {
            format!("<a:{}:{}>", self.name, self.id)
        } else {
            format!("<:{}:{}>", self.name, self.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_token() {
        assert_eq!(Emoji::new(5_u64, "blob").wire_token(), "<:blob:5>");
        assert_eq!(Emoji::new(6_u64, "party").animated().wire_token(), "<a:party:6>");
    }
}
