//! Remote events delivered by the transport layer.

use serde::{Deserialize, Serialize};

use super::entities::{
    Channel, ChannelId, Emoji, Guild, GuildId, Member, Message, MessageEdit, MessageId,
    ReadState, Relationship, Role, User, UserId,
};

/// Removal of one or many messages from a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageDeletion {
    /// One message was deleted.
    Single {
        /// Channel the message was in.
        channel_id: ChannelId,
        /// Deleted message.
        message_id: MessageId,
    },
    /// A batch of messages was deleted at once.
    Bulk {
        /// Channel the messages were in.
        channel_id: ChannelId,
        /// Deleted messages.
        message_ids: Vec<MessageId>,
    },
}

impl MessageDeletion {
    /// Channel the deletion applies to.
    #[must_use]
    pub const fn channel_id(&self) -> ChannelId {
        match self {
            Self::Single { channel_id, .. } | Self::Bulk { channel_id, .. } => *channel_id,
        }
    }

    /// Every deleted id, one for a single deletion.
    #[must_use]
    pub fn message_ids(&self) -> Vec<MessageId> {
        match self {
            Self::Single { message_id, .. } => vec![*message_id],
            Self::Bulk { message_ids, .. } => message_ids.clone(),
        }
    }
}

/// Partial guild update. Absent fields are left as cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildPatch {
    /// Guild being updated.
    pub id: GuildId,
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// Full replacement of the custom emoji list.
    #[serde(default)]
    pub emojis: Option<Vec<Emoji>>,
    /// Full replacement of the role list.
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
}

/// Guild, channel, membership and relationship changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralEvent {
    /// The local user joined a guild, or a guild became available.
    GuildCreate {
        /// The guild.
        guild: Guild,
        /// Channels of the guild.
        #[serde(default)]
        channels: Vec<Channel>,
    },
    /// Guild settings changed.
    GuildUpdate(GuildPatch),
    /// The local user left the guild or it was deleted.
    GuildDelete {
        /// Removed guild.
        guild_id: GuildId,
    },
    /// A guild or private channel was created.
    ChannelCreate(Channel),
    /// A channel changed.
    ChannelUpdate(Channel),
    /// A channel was deleted.
    ChannelDelete(Channel),
    /// A user joined a guild.
    MemberAdd {
        /// Guild joined.
        guild_id: GuildId,
        /// New member.
        member: Member,
    },
    /// A member's nickname or roles changed.
    MemberUpdate {
        /// Guild of the member.
        guild_id: GuildId,
        /// Updated member.
        member: Member,
    },
    /// A user left a guild.
    MemberRemove {
        /// Guild left.
        guild_id: GuildId,
        /// User who left.
        user_id: UserId,
    },
    /// A page of members requested for a guild.
    MembersChunk {
        /// Guild the members belong to.
        guild_id: GuildId,
        /// Members in this page.
        members: Vec<Member>,
    },
    /// A relationship was added or changed type.
    RelationshipAdd(Relationship),
    /// A relationship was removed.
    RelationshipRemove {
        /// The other user.
        user_id: UserId,
    },
}

impl StructuralEvent {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GuildCreate { .. } => "guild_create",
            Self::GuildUpdate(_) => "guild_update",
            Self::GuildDelete { .. } => "guild_delete",
            Self::ChannelCreate(_) => "channel_create",
            Self::ChannelUpdate(_) => "channel_update",
            Self::ChannelDelete(_) => "channel_delete",
            Self::MemberAdd { .. } => "member_add",
            Self::MemberUpdate { .. } => "member_update",
            Self::MemberRemove { .. } => "member_remove",
            Self::MembersChunk { .. } => "members_chunk",
            Self::RelationshipAdd(_) => "relationship_add",
            Self::RelationshipRemove { .. } => "relationship_remove",
        }
    }
}

/// Authoritative read acknowledgement from another session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadAck {
    /// Channel that was read.
    pub channel_id: ChannelId,
    /// Last read message.
    pub message_id: MessageId,
}

/// Event queues. Each family is consumed by one serial worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFamily {
    /// New messages.
    MessageCreate,
    /// Message edits.
    MessageUpdate,
    /// Single and bulk deletions.
    MessageDelete,
    /// Guild, channel, member and relationship changes.
    Structural,
    /// Read acknowledgements from other sessions.
    ReadAck,
}

impl EventFamily {
    /// Queue name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MessageCreate => "message_create",
            Self::MessageUpdate => "message_update",
            Self::MessageDelete => "message_delete",
            Self::Structural => "structural",
            Self::ReadAck => "read_ack",
        }
    }
}

/// A typed remote event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "snake_case")]
pub enum RemoteEvent {
    /// A message was posted.
    MessageCreate(Message),
    /// A message was edited.
    MessageUpdate(MessageEdit),
    /// Messages were deleted.
    MessageDelete(MessageDeletion),
    /// Guild, channel, member or relationship change.
    Structural(StructuralEvent),
    /// A channel was read in another session.
    ReadAck(ReadAck),
}

impl RemoteEvent {
    /// Queue the event is routed to.
    #[must_use]
    pub const fn family(&self) -> EventFamily {
        match self {
            Self::MessageCreate(_) => EventFamily::MessageCreate,
            Self::MessageUpdate(_) => EventFamily::MessageUpdate,
            Self::MessageDelete(_) => EventFamily::MessageDelete,
            Self::Structural(_) => EventFamily::Structural,
            Self::ReadAck(_) => EventFamily::ReadAck,
        }
    }
}

/// A guild with its channels, as delivered at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSnapshot {
    /// The guild with its roles, members and emojis.
    pub guild: Guild,
    /// Channels of the guild.
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// Initial session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadySnapshot {
    /// The local user.
    pub user: User,
    /// Guilds the local user is in.
    #[serde(default)]
    pub guilds: Vec<GuildSnapshot>,
    /// DMs and group DMs.
    #[serde(default)]
    pub private_channels: Vec<Channel>,
    /// Friends, blocks and pending requests. Fetched separately when empty.
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    /// Server-side read markers.
    #[serde(default)]
    pub read_state: Vec<ReadState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_bulk_delete() {
        let json = r#"{"op":"message_delete","d":{"kind":"bulk","channel_id":"5","message_ids":["1",2]}}"#;
        let event: RemoteEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.family(), EventFamily::MessageDelete);
        let RemoteEvent::MessageDelete(deletion) = event else {
            panic!("expected deletion");
        };
        assert_eq!(deletion.channel_id(), ChannelId(5));
        assert_eq!(deletion.message_ids(), vec![MessageId(1), MessageId(2)]);
    }

    #[test]
    fn test_deserialize_structural_guild_delete() {
        let json = r#"{"op":"structural","d":{"kind":"guild_delete","guild_id":"9"}}"#;
        let event: RemoteEvent = serde_json::from_str(json).unwrap();

        assert_eq!(
            event,
            RemoteEvent::Structural(StructuralEvent::GuildDelete {
                guild_id: GuildId(9)
            })
        );
    }
}
