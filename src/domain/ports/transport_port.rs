//! Transport port for remote calls made by the sync core.

use async_trait::async_trait;

use crate::domain::entities::{
    ChannelId, GuildId, Member, Message, MessageId, Relationship, UserId,
};
use crate::domain::errors::TransportError;

/// Upper bound the service accepts for a single history fetch.
pub const MAX_FETCH_LIMIT: u8 = 100;

/// A new message to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageRequest {
    /// Destination channel.
    pub channel_id: ChannelId,
    /// Wire-form content.
    pub content: String,
}

impl SendMessageRequest {
    /// Creates a send request.
    #[must_use]
    pub fn new(channel_id: ChannelId, content: impl Into<String>) -> Self {
        Self {
            channel_id,
            content: content.into(),
        }
    }
}

/// Replacement content for an existing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditMessageRequest {
    /// Channel of the message.
    pub channel_id: ChannelId,
    /// Message to edit.
    pub message_id: MessageId,
    /// Wire-form content.
    pub content: String,
}

impl EditMessageRequest {
    /// Creates an edit request.
    #[must_use]
    pub fn new(channel_id: ChannelId, message_id: MessageId, content: impl Into<String>) -> Self {
        Self {
            channel_id,
            message_id,
            content: content.into(),
        }
    }
}

/// Port for remote calls (send, edit, delete, fetch, acknowledge).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransportPort: Send + Sync {
    /// Sends a message to a channel.
    async fn send_message(&self, request: SendMessageRequest) -> Result<Message, TransportError>;

    /// Edits an existing message.
    async fn edit_message(&self, request: EditMessageRequest) -> Result<Message, TransportError>;

    /// Deletes a message.
    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), TransportError>;

    /// Fetches the most recent messages of a channel.
    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        limit: u8,
    ) -> Result<Vec<Message>, TransportError>;

    /// Fetches the member roster of a guild.
    async fn fetch_members(&self, guild_id: GuildId) -> Result<Vec<Member>, TransportError>;

    /// Fetches a single guild member.
    async fn fetch_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Member, TransportError>;

    /// Fetches the local user's relationships.
    async fn fetch_relationships(&self) -> Result<Vec<Relationship>, TransportError>;

    /// Acknowledges a message (marks as read remotely).
    async fn acknowledge_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), TransportError>;
}
