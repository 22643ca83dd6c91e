//! Authoritative in-memory copy of remote session state.
//!
//! Every mutation goes through one merge function per entity kind, so the
//! field-level update rules live in one place:
//! - a deleted message identity is tombstoned and can never come back,
//! - an edit that overtakes its create is parked and applied on arrival,
//! - a repeated create never overwrites edited content,
//! - channel `last_message_id` only moves forward.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::domain::entities::{
    Channel, ChannelId, Guild, GuildId, Member, Message, MessageEdit, MessageId, Relationship,
    User, UserId,
};
use crate::domain::errors::SyncError;
use crate::domain::events::GuildPatch;

const DEFAULT_TOMBSTONE_CAPACITY: usize = 4096;
const DEFAULT_PENDING_EDIT_CAPACITY: usize = 256;

/// Outcome of merging a created message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageMerge {
    /// Stored; carries the message as cached, parked edits included.
    Inserted(Message),
    /// Already cached; the cached copy was kept.
    Duplicate,
    /// The identity was deleted earlier.
    Tombstoned,
}

/// Outcome of merging an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMerge {
    /// Applied to the cached message; carries the updated copy.
    Applied(Message),
    /// The message is not cached yet; the edit waits for its create.
    Deferred,
    /// Embed-only edit or deleted identity.
    Discarded,
}

struct CacheState {
    local_user: Option<User>,
    guild_order: Vec<GuildId>,
    guilds: HashMap<GuildId, Guild>,
    channels: HashMap<ChannelId, Channel>,
    private_order: Vec<ChannelId>,
    messages: HashMap<ChannelId, Vec<Message>>,
    relationships: HashMap<UserId, Relationship>,
    tombstones: LruCache<MessageId, ()>,
    pending_edits: LruCache<MessageId, MessageEdit>,
}

impl CacheState {
    fn drop_channel(&mut self, channel_id: ChannelId) -> Option<Channel> {
        let channel = self.channels.remove(&channel_id)?;
        self.messages.remove(&channel_id);
        self.private_order.retain(|id| *id != channel_id);
        if let Some(guild) = channel.guild_id().and_then(|g| self.guilds.get_mut(&g)) {
            guild.detach_channel(channel_id);
        }
        Some(channel)
    }

    fn insert_sorted(&mut self, message: Message) {
        let list = self.messages.entry(message.channel_id()).or_default();
        let key = message.ordering_key();
        let index = list.partition_point(|m| m.ordering_key() < key);
        list.insert(index, message);
    }

    fn contains_message(&self, channel_id: ChannelId, message_id: MessageId) -> bool {
        self.messages
            .get(&channel_id)
            .is_some_and(|list| list.iter().any(|m| m.id() == message_id))
    }
}

/// Shared session cache. Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct SessionCache {
    inner: Arc<RwLock<CacheState>>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacities(DEFAULT_TOMBSTONE_CAPACITY, DEFAULT_PENDING_EDIT_CAPACITY)
    }

    /// Creates a cache remembering up to `tombstones` deleted identities and
    /// `pending_edits` edits waiting for their create.
    #[must_use]
    pub fn with_capacities(tombstones: usize, pending_edits: usize) -> Self {
        let tombstones = NonZeroUsize::new(tombstones).unwrap_or(NonZeroUsize::MIN);
        let pending_edits = NonZeroUsize::new(pending_edits).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(RwLock::new(CacheState {
                local_user: None,
                guild_order: Vec::new(),
                guilds: HashMap::new(),
                channels: HashMap::new(),
                private_order: Vec::new(),
                messages: HashMap::new(),
                relationships: HashMap::new(),
                tombstones: LruCache::new(tombstones),
                pending_edits: LruCache::new(pending_edits),
            })),
        }
    }

    /// Records the user this session belongs to.
    pub fn set_local_user(&self, user: User) {
        self.inner.write().local_user = Some(user);
    }

    /// The user this session belongs to.
    #[must_use]
    pub fn local_user(&self) -> Option<User> {
        self.inner.read().local_user.clone()
    }

    /// Id of the user this session belongs to.
    #[must_use]
    pub fn local_user_id(&self) -> Option<UserId> {
        self.inner.read().local_user.as_ref().map(User::id)
    }

    // Guilds

    /// Cached guild by id.
    #[must_use]
    pub fn guild(&self, guild_id: GuildId) -> Option<Guild> {
        self.inner.read().guilds.get(&guild_id).cloned()
    }

    /// All guilds in list order.
    #[must_use]
    pub fn guilds(&self) -> Vec<Guild> {
        let state = self.inner.read();
        state
            .guild_order
            .iter()
            .filter_map(|id| state.guilds.get(id).cloned())
            .collect()
    }

    /// Inserts or replaces a guild together with its channels.
    ///
    /// Channels are attached in position order; replaced guilds keep their
    /// place in the list.
    pub fn insert_guild(&self, guild: Guild, mut channels: Vec<Channel>) {
        let mut state = self.inner.write();
        let guild_id = guild.id();

        if let Some(old) = state.guilds.remove(&guild_id) {
            for channel_id in old.channel_ids() {
                if !channels.iter().any(|c| c.id() == *channel_id) {
                    state.channels.remove(channel_id);
                    state.messages.remove(channel_id);
                }
            }
        } else {
            state.guild_order.push(guild_id);
        }

        channels.sort_by_key(|c| (c.position(), c.id()));
        let mut guild = guild;
        for mut channel in channels {
            if channel.guild_id().is_none() {
                channel = channel.with_guild(guild_id);
            }
            if let Some(existing) = state.channels.get(&channel.id())
                && let Some(last) = existing.last_message_id()
            {
                channel.advance_last_message(last);
            }
            guild.attach_channel(channel.id());
            state.channels.insert(channel.id(), channel);
        }
        state.guilds.insert(guild_id, guild);
        debug!(guild_id = %guild_id, "Guild cached");
    }

    /// Applies the fields present in `patch`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownGuild` if the guild is not cached.
    pub fn update_guild(&self, patch: &GuildPatch) -> Result<Guild, SyncError> {
        let mut state = self.inner.write();
        let guild = state
            .guilds
            .get_mut(&patch.id)
            .ok_or(SyncError::UnknownGuild(patch.id))?;

        if let Some(name) = &patch.name {
            guild.set_name(name.clone());
        }
        if let Some(emojis) = &patch.emojis {
            guild.set_emojis(emojis.clone());
        }
        if let Some(roles) = &patch.roles {
            guild.set_roles(roles.clone());
        }
        Ok(guild.clone())
    }

    /// Removes a guild with all its channels and their messages.
    pub fn remove_guild(&self, guild_id: GuildId) -> Option<Guild> {
        let mut state = self.inner.write();
        let guild = state.guilds.remove(&guild_id)?;
        state.guild_order.retain(|id| *id != guild_id);
        for channel_id in guild.channel_ids() {
            state.channels.remove(channel_id);
            state.messages.remove(channel_id);
        }
        Some(guild)
    }

    // Channels

    /// Cached channel by id.
    #[must_use]
    pub fn channel(&self, channel_id: ChannelId) -> Option<Channel> {
        self.inner.read().channels.get(&channel_id).cloned()
    }

    /// Channels of a guild in display order.
    #[must_use]
    pub fn guild_channels(&self, guild_id: GuildId) -> Vec<Channel> {
        let state = self.inner.read();
        state
            .guilds
            .get(&guild_id)
            .map(|guild| {
                guild
                    .channel_ids()
                    .iter()
                    .filter_map(|id| state.channels.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Private channels, most recently active first.
    #[must_use]
    pub fn private_channels(&self) -> Vec<Channel> {
        let state = self.inner.read();
        state
            .private_order
            .iter()
            .filter_map(|id| state.channels.get(id).cloned())
            .collect()
    }

    /// Inserts or replaces a channel. Returns the previous copy.
    ///
    /// The cached `last_message_id` survives an update carrying an older one.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownGuild` for a guild channel whose guild is not cached.
    pub fn upsert_channel(&self, mut channel: Channel) -> Result<Option<Channel>, SyncError> {
        let mut state = self.inner.write();
        let channel_id = channel.id();

        match channel.guild_id() {
            Some(guild_id) => {
                let guild = state
                    .guilds
                    .get_mut(&guild_id)
                    .ok_or(SyncError::UnknownGuild(guild_id))?;
                guild.attach_channel(channel_id);
            }
            None => {
                if !state.private_order.contains(&channel_id) {
                    state.private_order.insert(0, channel_id);
                }
            }
        }

        if let Some(last) = state
            .channels
            .get(&channel_id)
            .and_then(Channel::last_message_id)
        {
            channel.advance_last_message(last);
        }

        Ok(state.channels.insert(channel_id, channel))
    }

    /// Removes a channel and its messages.
    pub fn remove_channel(&self, channel_id: ChannelId) -> Option<Channel> {
        self.inner.write().drop_channel(channel_id)
    }

    /// Moves a private channel to the top of the private list.
    pub fn touch_private_channel(&self, channel_id: ChannelId) {
        let mut state = self.inner.write();
        if let Some(index) = state.private_order.iter().position(|id| *id == channel_id) {
            let id = state.private_order.remove(index);
            state.private_order.insert(0, id);
        }
    }

    // Messages

    /// Cached messages of a channel in display order.
    #[must_use]
    pub fn messages(&self, channel_id: ChannelId) -> Vec<Message> {
        self.inner
            .read()
            .messages
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether any message of the channel is cached.
    #[must_use]
    pub fn has_messages(&self, channel_id: ChannelId) -> bool {
        self.inner
            .read()
            .messages
            .get(&channel_id)
            .is_some_and(|list| !list.is_empty())
    }

    /// Cached message by id.
    #[must_use]
    pub fn message(&self, channel_id: ChannelId, message_id: MessageId) -> Option<Message> {
        self.inner
            .read()
            .messages
            .get(&channel_id)
            .and_then(|list| list.iter().find(|m| m.id() == message_id).cloned())
    }

    /// Merges a created message.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownChannel` if the channel is not cached.
    pub fn merge_message(&self, mut message: Message) -> Result<MessageMerge, SyncError> {
        let mut guard = self.inner.write();
        let state = &mut *guard;
        let channel_id = message.channel_id();
        let message_id = message.id();

        let channel = state
            .channels
            .get_mut(&channel_id)
            .ok_or(SyncError::UnknownChannel(channel_id))?;

        if message.guild_id().is_none() {
            message.set_guild_id(channel.guild_id());
        }

        if state.tombstones.contains(&message_id) {
            trace!(message_id = %message_id, "Create for deleted message dropped");
            return Ok(MessageMerge::Tombstoned);
        }

        channel.advance_last_message(message_id);

        if state.contains_message(channel_id, message_id) {
            return Ok(MessageMerge::Duplicate);
        }

        if let Some(edit) = state.pending_edits.pop(&message_id) {
            debug!(message_id = %message_id, "Applying edit that arrived before its message");
            message.apply_edit(&edit);
        }

        state.insert_sorted(message.clone());
        Ok(MessageMerge::Inserted(message))
    }

    /// Merges fetched history, skipping deleted and already cached messages.
    /// Returns the channel's full message list afterwards.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownChannel` if the channel is not cached.
    pub fn merge_history(
        &self,
        channel_id: ChannelId,
        history: Vec<Message>,
    ) -> Result<Vec<Message>, SyncError> {
        let mut state = self.inner.write();
        let guild_id = state
            .channels
            .get(&channel_id)
            .ok_or(SyncError::UnknownChannel(channel_id))?
            .guild_id();

        for mut message in history {
            if message.channel_id() != channel_id
                || state.tombstones.contains(&message.id())
                || state.contains_message(channel_id, message.id())
            {
                continue;
            }
            if message.guild_id().is_none() {
                message.set_guild_id(guild_id);
            }
            state.insert_sorted(message);
        }

        Ok(state.messages.get(&channel_id).cloned().unwrap_or_default())
    }

    /// Merges an edit into the cached message.
    pub fn apply_edit(&self, edit: &MessageEdit) -> EditMerge {
        if edit.is_embed_only() {
            return EditMerge::Discarded;
        }

        let mut state = self.inner.write();
        if state.tombstones.contains(&edit.id) {
            return EditMerge::Discarded;
        }

        let cached = state
            .messages
            .get_mut(&edit.channel_id)
            .and_then(|list| list.iter_mut().find(|m| m.id() == edit.id));

        if let Some(message) = cached {
            message.apply_edit(edit);
            return EditMerge::Applied(message.clone());
        }

        state.pending_edits.put(edit.id, edit.clone());
        EditMerge::Deferred
    }

    /// Removes messages and tombstones every given identity.
    /// Returns the identities that were actually cached.
    pub fn remove_messages(&self, channel_id: ChannelId, message_ids: &[MessageId]) -> Vec<MessageId> {
        let mut state = self.inner.write();

        for id in message_ids {
            state.tombstones.put(*id, ());
            state.pending_edits.pop(id);
        }

        let Some(list) = state.messages.get_mut(&channel_id) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        list.retain(|m| {
            if message_ids.contains(&m.id()) {
                removed.push(m.id());
                false
            } else {
                true
            }
        });
        removed
    }

    // Members

    /// Cached member of a guild.
    #[must_use]
    pub fn member(&self, guild_id: GuildId, user_id: UserId) -> Option<Member> {
        self.inner
            .read()
            .guilds
            .get(&guild_id)
            .and_then(|guild| guild.member(user_id).cloned())
    }

    /// The local user's membership in a guild, if cached.
    #[must_use]
    pub fn local_member(&self, guild_id: GuildId) -> Option<Member> {
        let user_id = self.local_user_id()?;
        self.member(guild_id, user_id)
    }

    /// Cached roster of a guild.
    #[must_use]
    pub fn guild_members(&self, guild_id: GuildId) -> Vec<Member> {
        self.inner
            .read()
            .guilds
            .get(&guild_id)
            .map(|guild| guild.members().to_vec())
            .unwrap_or_default()
    }

    /// Inserts or replaces members of a guild.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UnknownGuild` if the guild is not cached.
    pub fn upsert_members(&self, guild_id: GuildId, members: Vec<Member>) -> Result<(), SyncError> {
        let mut state = self.inner.write();
        let guild = state
            .guilds
            .get_mut(&guild_id)
            .ok_or(SyncError::UnknownGuild(guild_id))?;
        for member in members {
            guild.upsert_member(member);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SyncError::UnknownGuild` if the guild is not cached.
    pub fn remove_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Option<Member>, SyncError> {
        let mut state = self.inner.write();
        let guild = state
            .guilds
            .get_mut(&guild_id)
            .ok_or(SyncError::UnknownGuild(guild_id))?;
        Ok(guild.remove_member(user_id))
    }

    // Relationships

    /// Adds or replaces a relationship, returning the previous one.
    pub fn upsert_relationship(&self, relationship: Relationship) -> Option<Relationship> {
        self.inner
            .write()
            .relationships
            .insert(relationship.user_id(), relationship)
    }

    /// Removes a relationship, returning it if it was cached.
    pub fn remove_relationship(&self, user_id: UserId) -> Option<Relationship> {
        self.inner.write().relationships.remove(&user_id)
    }

    /// Every cached relationship.
    #[must_use]
    pub fn relationships(&self) -> Vec<Relationship> {
        self.inner.read().relationships.values().cloned().collect()
    }

    /// Users with a friend relationship.
    #[must_use]
    pub fn friends(&self) -> Vec<User> {
        self.inner
            .read()
            .relationships
            .values()
            .filter(|r| r.is_friend())
            .map(|r| r.user.clone())
            .collect()
    }
}
