//! Discord relationship entity.

use serde::{Deserialize, Serialize};

use super::{User, UserId};

/// Discord relationship types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum RelationshipType {
    None,
    Friend,
    Blocked,
    PendingIncoming,
    PendingOutgoing,
}

impl From<u8> for RelationshipType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Friend,
            2 => Self::Blocked,
            3 => Self::PendingIncoming,
            4 => Self::PendingOutgoing,
            _ => Self::None,
        }
    }
}

impl RelationshipType {
    /// Returns true for friends.
    #[must_use]
    pub const fn is_friend(self) -> bool {
        matches!(self, Self::Friend)
    }

    /// Returns true for blocked users.
    #[must_use]
    pub const fn is_blocked(self) -> bool {
        matches!(self, Self::Blocked)
    }
}

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// The other user.
    pub user: User,
    /// Relationship type.
    pub kind: RelationshipType,
}

impl Relationship {
    /// Creates a relationship.
    #[must_use]
    pub const fn new(user: User, kind: RelationshipType) -> Self {
        Self { user, kind }
    }

    /// Returns the other user's ID.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.id()
    }

    /// Returns true if the other user is a friend.
    #[must_use]
    pub const fn is_friend(&self) -> bool {
        self.kind.is_friend()
    }
}
