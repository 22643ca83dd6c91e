use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Guild permission bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Permissions: u64 {
        /// Create invites.
        const CREATE_INSTANT_INVITE = 1 << 0;
        /// Kick members.
        const KICK_MEMBERS = 1 << 1;
        /// Ban members.
        const BAN_MEMBERS = 1 << 2;
        /// Every permission, overwrites ignored.
        const ADMINISTRATOR = 1 << 3;
        /// Edit and delete channels.
        const MANAGE_CHANNELS = 1 << 4;
        /// Edit guild settings.
        const MANAGE_GUILD = 1 << 5;
        /// Add reactions.
        const ADD_REACTIONS = 1 << 6;
        /// See the channel and read its messages.
        const VIEW_CHANNEL = 1 << 10;
        /// Post messages.
        const SEND_MESSAGES = 1 << 11;
        /// Delete other users' messages.
        const MANAGE_MESSAGES = 1 << 13;
        /// Links get embeds.
        const EMBED_LINKS = 1 << 14;
        /// Upload files.
        const ATTACH_FILES = 1 << 15;
        /// Read older messages.
        const READ_MESSAGE_HISTORY = 1 << 16;
        /// Use `@everyone` and `@here`.
        const MENTION_EVERYONE = 1 << 17;
        /// Use emojis from other guilds.
        const USE_EXTERNAL_EMOJIS = 1 << 18;
    }
}

impl Permissions {
    /// Returns true if these permissions allow seeing the channel's messages.
    #[must_use]
    pub const fn can_read(self) -> bool {
        self.contains(Self::ADMINISTRATOR) || self.contains(Self::VIEW_CHANNEL)
    }
}
