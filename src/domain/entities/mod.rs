//! Domain entity definitions.

/// Declares a snowflake identifier newtype with the usual conversions.
macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(#[serde(with = "crate::domain::serde_utils::snowflake")] pub u64);

        impl $name {
            /// Returns the underlying u64 value.
            #[must_use]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

mod channel;
mod emoji;
mod guild;
mod member;
mod message;
mod permissions;
mod read_state;
mod relationship;
mod role;
mod user;

pub use channel::{Channel, ChannelId, ChannelKind, OverwriteKind, PermissionOverwrite};
pub use emoji::{Emoji, EmojiId};
pub use guild::{Guild, GuildId};
pub use member::Member;
pub use message::{Message, MessageEdit, MessageId};
pub use permissions::Permissions;
pub use read_state::{MuteConfig, ReadState};
pub use relationship::{Relationship, RelationshipType};
pub use role::{Role, RoleId};
pub use user::{PremiumType, User, UserId};
