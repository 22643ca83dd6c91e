//! Discord message entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChannelId, GuildId, RoleId, User, UserId};

snowflake_id!(
    /// Unique identifier for a Discord message. Ordered by creation time.
    MessageId
);

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    channel_id: ChannelId,
    #[serde(default)]
    guild_id: Option<GuildId>,
    author: User,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    edited_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    mentions: Vec<User>,
    #[serde(default)]
    mention_roles: Vec<RoleId>,
    #[serde(default)]
    mention_everyone: bool,
}

impl Message {
    /// Creates a message without mentions.
    #[must_use]
    pub fn new(
        id: impl Into<MessageId>,
        channel_id: impl Into<ChannelId>,
        author: User,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            guild_id: None,
            author,
            timestamp,
            edited_timestamp: None,
            content: content.into(),
            mentions: Vec::new(),
            mention_roles: Vec::new(),
            mention_everyone: false,
        }
    }

    /// Sets the guild ID.
    #[must_use]
    pub fn with_guild(mut self, guild_id: impl Into<GuildId>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Sets the mentioned users.
    #[must_use]
    pub fn with_mentions(mut self, mentions: Vec<User>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Sets the mentioned roles.
    #[must_use]
    pub fn with_mention_roles(mut self, roles: Vec<RoleId>) -> Self {
        self.mention_roles = roles;
        self
    }

    /// Sets whether `@everyone` or `@here` was used.
    #[must_use]
    pub const fn with_mention_everyone(mut self, everyone: bool) -> Self {
        self.mention_everyone = everyone;
        self
    }

    /// Returns the message ID.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the channel ID.
    #[must_use]
    pub const fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Returns the guild ID, if sent in a guild.
    #[must_use]
    pub const fn guild_id(&self) -> Option<GuildId> {
        self.guild_id
    }

    /// Sets the guild ID.
    pub fn set_guild_id(&mut self, guild_id: Option<GuildId>) {
        self.guild_id = guild_id;
    }

    /// Returns the author.
    #[must_use]
    pub const fn author(&self) -> &User {
        &self.author
    }

    /// Returns the creation time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the last edit time, if edited.
    #[must_use]
    pub const fn edited_timestamp(&self) -> Option<DateTime<Utc>> {
        self.edited_timestamp
    }

    /// Returns the raw content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the mentioned users.
    #[must_use]
    pub fn mentions(&self) -> &[User] {
        &self.mentions
    }

    /// Returns true if `user_id` is mentioned directly.
    #[must_use]
    pub fn mentions_user(&self, user_id: UserId) -> bool {
        self.mentions.iter().any(|user| user.id() == user_id)
    }

    /// Returns the mentioned roles.
    #[must_use]
    pub fn mention_roles(&self) -> &[RoleId] {
        &self.mention_roles
    }

    /// Returns true if `@everyone` or `@here` was used.
    #[must_use]
    pub const fn mention_everyone(&self) -> bool {
        self.mention_everyone
    }

    /// Display order: server timestamp, then identity for ties.
    #[must_use]
    pub const fn ordering_key(&self) -> (DateTime<Utc>, MessageId) {
        (self.timestamp, self.id)
    }

    /// Replaces the editable fields with the ones carried by `edit`.
    ///
    /// Returns false for embed-only edits, which leave the message untouched.
    pub fn apply_edit(&mut self, edit: &MessageEdit) -> bool {
        let Some(content) = &edit.content else {
            return false;
        };
        self.content.clone_from(content);
        if let Some(mentions) = &edit.mentions {
            self.mentions.clone_from(mentions);
        }
        if let Some(roles) = &edit.mention_roles {
            self.mention_roles.clone_from(roles);
        }
        if let Some(everyone) = edit.mention_everyone {
            self.mention_everyone = everyone;
        }
        if edit.edited_timestamp.is_some() {
            self.edited_timestamp = edit.edited_timestamp;
        }
        true
    }
}

/// Partial update carried by a message edit event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageEdit {
    /// Edited message.
    pub id: MessageId,
    /// Channel of the edited message.
    pub channel_id: ChannelId,
    /// Missing when the update only touched embeds.
    #[serde(default)]
    pub content: Option<String>,
    /// New user mentions.
    #[serde(default)]
    pub mentions: Option<Vec<User>>,
    /// New role mentions.
    #[serde(default)]
    pub mention_roles: Option<Vec<RoleId>>,
    /// New `@everyone` flag.
    #[serde(default)]
    pub mention_everyone: Option<bool>,
    /// Time of the edit.
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<Utc>>,
}

impl MessageEdit {
    /// Edit that replaces the content.
    #[must_use]
    pub fn content(
        id: impl Into<MessageId>,
        channel_id: impl Into<ChannelId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            content: Some(content.into()),
            mentions: None,
            mention_roles: None,
            mention_everyone: None,
            edited_timestamp: None,
        }
    }

    /// Edit that only touched embeds.
    #[must_use]
    pub fn embed_only(id: impl Into<MessageId>, channel_id: impl Into<ChannelId>) -> Self {
        Self {
            content: None,
            ..Self::content(id, channel_id, "")
        }
    }

    /// Returns true if the edit carries no content.
    #[must_use]
    pub const fn is_embed_only(&self) -> bool {
        self.content.is_none()
    }
}
