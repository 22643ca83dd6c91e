//! Discord channel entity.

use serde::{Deserialize, Serialize};

use super::{GuildId, MessageId, Permissions, User};

snowflake_id!(
    /// Unique identifier for a Discord channel.
    ChannelId
);

/// Discord channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Guild text channel.
    #[default]
    Text,
    /// Direct message channel.
    Dm,
    /// Voice channel.
    Voice,
    /// Group direct message channel.
    GroupDm,
    /// Category channel.
    Category,
    /// Announcement channel.
    Announcement,
}

impl ChannelKind {
    /// Returns true for one-to-one and group direct messages.
    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(self, Self::Dm | Self::GroupDm)
    }

    /// Returns true for guild channels that hold a message stream.
    #[must_use]
    pub const fn is_guild_text(self) -> bool {
        matches!(self, Self::Text | Self::Announcement)
    }

    /// Returns true if this is a category channel.
    #[must_use]
    pub const fn is_category(self) -> bool {
        matches!(self, Self::Category)
    }
}

impl From<u8> for ChannelKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Dm,
            2 => Self::Voice,
            3 => Self::GroupDm,
            4 => Self::Category,
            5 => Self::Announcement,
            _ => Self::Text,
        }
    }
}

/// Target of a permission overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwriteKind {
    /// Overwrite for a role.
    Role,
    /// Overwrite for a single member.
    Member,
}

/// Per-channel permission overwrite for a role or a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    /// Role or user id, depending on `kind`.
    #[serde(with = "crate::domain::serde_utils::snowflake")]
    pub id: u64,
    /// What `id` refers to.
    pub kind: OverwriteKind,
    /// Permissions granted.
    #[serde(default)]
    pub allow: Permissions,
    /// Permissions revoked.
    #[serde(default)]
    pub deny: Permissions,
}

/// Discord channel information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    id: ChannelId,
    #[serde(default)]
    guild_id: Option<GuildId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    kind: ChannelKind,
    #[serde(default)]
    parent_id: Option<ChannelId>,
    #[serde(default)]
    position: i32,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    last_message_id: Option<MessageId>,
    #[serde(default)]
    recipients: Vec<User>,
    #[serde(default)]
    permission_overwrites: Vec<PermissionOverwrite>,
}

impl Channel {
    /// Creates a new channel with the given ID, name and type.
    #[must_use]
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>, kind: ChannelKind) -> Self {
        Self {
            id: id.into(),
            guild_id: None,
            name: name.into(),
            kind,
            parent_id: None,
            position: 0,
            topic: None,
            last_message_id: None,
            recipients: Vec::new(),
            permission_overwrites: Vec::new(),
        }
    }

    /// Sets the guild ID for this channel.
    #[must_use]
    pub fn with_guild(mut self, guild_id: impl Into<GuildId>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Sets the parent category ID for this channel.
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<ChannelId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Sets the position of this channel in the channel list.
    #[must_use]
    pub const fn with_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    /// Sets the topic for this channel.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the newest message ID.
    #[must_use]
    pub fn with_last_message(mut self, message_id: impl Into<MessageId>) -> Self {
        self.last_message_id = Some(message_id.into());
        self
    }

    /// Sets the recipients of a private channel.
    #[must_use]
    pub fn with_recipients(mut self, recipients: Vec<User>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Sets the permission overwrites.
    #[must_use]
    pub fn with_overwrites(mut self, overwrites: Vec<PermissionOverwrite>) -> Self {
        self.permission_overwrites = overwrites;
        self
    }

    /// Returns the channel ID.
    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    /// Returns the guild ID, if this is a guild channel.
    #[must_use]
    pub const fn guild_id(&self) -> Option<GuildId> {
        self.guild_id
    }

    /// Returns the channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the channel type.
    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Returns true for DMs and group DMs.
    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.kind.is_private()
    }

    /// Returns the parent category ID, if any.
    #[must_use]
    pub const fn parent_id(&self) -> Option<ChannelId> {
        self.parent_id
    }

    /// Returns the channel position in the channel list.
    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    /// Returns the channel topic, if set and not empty.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref().filter(|topic| !topic.is_empty())
    }

    /// Returns the newest message ID, if known.
    #[must_use]
    pub const fn last_message_id(&self) -> Option<MessageId> {
        self.last_message_id
    }

    /// Advances the last-message marker. Older identities are ignored.
    pub fn advance_last_message(&mut self, message_id: MessageId) {
        if self.last_message_id.is_none_or(|current| message_id > current) {
            self.last_message_id = Some(message_id);
        }
    }

    /// Returns the recipients of a private channel.
    #[must_use]
    pub fn recipients(&self) -> &[User] {
        &self.recipients
    }

    /// Returns the permission overwrites.
    #[must_use]
    pub fn permission_overwrites(&self) -> &[PermissionOverwrite] {
        &self.permission_overwrites
    }

    /// Name shown for a private chat: its own name if set, else the recipients.
    #[must_use]
    pub fn private_display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.recipients
            .iter()
            .map(User::username)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Title for the chat header.
    #[must_use]
    pub fn header_title(&self) -> String {
        match self.kind {
            ChannelKind::Dm => self
                .recipients
                .first()
                .map_or_else(|| self.private_display_name(), |user| user.username().to_string()),
            ChannelKind::GroupDm => self.private_display_name(),
            _ => match self.topic() {
                Some(topic) => format!("{} - {}", self.name, topic),
                None => self.name.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_title_for_guild_channel() {
        let plain = Channel::new(1_u64, "general", ChannelKind::Text);
        let with_topic = plain.clone().with_topic("chit chat");

        assert_eq!(plain.header_title(), "general");
        assert_eq!(with_topic.header_title(), "general - chit chat");
    }

    #[test]
    fn test_header_title_for_private_channels() {
        let alice = User::new(1_u64, "alice", "0001");
        let bob = User::new(2_u64, "bob", "0002");

        let dm = Channel::new(10_u64, "", ChannelKind::Dm).with_recipients(vec![alice.clone()]);
        let group = Channel::new(11_u64, "", ChannelKind::GroupDm).with_recipients(vec![alice, bob]);
        let named = group.clone().with_topic("ignored");

        assert_eq!(dm.header_title(), "alice");
        assert_eq!(group.header_title(), "alice, bob");
        assert_eq!(named.header_title(), "alice, bob");
    }

    #[test]
    fn test_last_message_only_moves_forward() {
        let mut channel = Channel::new(1_u64, "general", ChannelKind::Text).with_last_message(5_u64);

        channel.advance_last_message(MessageId(3));
        assert_eq!(channel.last_message_id(), Some(MessageId(5)));

        channel.advance_last_message(MessageId(9));
        assert_eq!(channel.last_message_id(), Some(MessageId(9)));
    }

    #[test]
    fn test_channel_kind_from_u8() {
        assert_eq!(ChannelKind::from(1), ChannelKind::Dm);
        assert_eq!(ChannelKind::from(3), ChannelKind::GroupDm);
        assert_eq!(ChannelKind::from(99), ChannelKind::Text);
        assert!(ChannelKind::Announcement.is_guild_text());
        assert!(!ChannelKind::Voice.is_guild_text());
    }
}
