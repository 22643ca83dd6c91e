//! Discord guild entity.

use serde::{Deserialize, Serialize};

use super::{ChannelId, Emoji, Member, Role, UserId};

snowflake_id!(
    /// Unique identifier for a Discord guild (server).
    GuildId
);

/// Discord guild (server) information.
///
/// Channels are stored by ID in display order; the channel entities
/// themselves live in the session cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Guild {
    id: GuildId,
    name: String,
    #[serde(default)]
    channels: Vec<ChannelId>,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    emojis: Vec<Emoji>,
    #[serde(default)]
    roles: Vec<Role>,
}

impl Guild {
    /// Creates a new guild with the given ID and name.
    #[must_use]
    pub fn new(id: impl Into<GuildId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            channels: Vec::new(),
            members: Vec::new(),
            emojis: Vec::new(),
            roles: Vec::new(),
        }
    }

    /// Sets the member roster.
    #[must_use]
    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    /// Sets the custom emoji catalog.
    #[must_use]
    pub fn with_emojis(mut self, emojis: Vec<Emoji>) -> Self {
        self.emojis = emojis;
        self
    }

    /// Sets the roles.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    /// Returns the guild ID.
    #[must_use]
    pub const fn id(&self) -> GuildId {
        self.id
    }

    /// Returns the guild name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the guild.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the channel IDs in display order.
    #[must_use]
    pub fn channel_ids(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Appends a channel to the ordered list unless already present.
    pub fn attach_channel(&mut self, channel_id: ChannelId) {
        if !self.channels.contains(&channel_id) {
            self.channels.push(channel_id);
        }
    }

    /// Removes a channel from the list.
    pub fn detach_channel(&mut self, channel_id: ChannelId) {
        self.channels.retain(|id| *id != channel_id);
    }

    /// Returns the cached members.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Returns the member with the given user ID.
    #[must_use]
    pub fn member(&self, user_id: UserId) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id() == user_id)
    }

    /// Inserts or replaces a member, keeping roster order for existing entries.
    pub fn upsert_member(&mut self, member: Member) {
        match self
            .members
            .iter_mut()
            .find(|m| m.user_id() == member.user_id())
        {
            Some(existing) => *existing = member,
            None => self.members.push(member),
        }
    }

    /// Removes a member, returning it if it was present.
    pub fn remove_member(&mut self, user_id: UserId) -> Option<Member> {
        let index = self.members.iter().position(|m| m.user_id() == user_id)?;
        Some(self.members.remove(index))
    }

    /// Returns the custom emoji catalog.
    #[must_use]
    pub fn emojis(&self) -> &[Emoji] {
        &self.emojis
    }

    /// Replaces the custom emoji catalog.
    pub fn set_emojis(&mut self, emojis: Vec<Emoji>) {
        self.emojis = emojis;
    }

    /// Returns the roles.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Replaces the roles.
    pub fn set_roles(&mut self, roles: Vec<Role>) {
        self.roles = roles;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;

    #[test]
    fn test_guild_creation() {
        let guild = Guild::new(123_u64, "Test Server");

        assert_eq!(guild.id().as_u64(), 123);
        assert_eq!(guild.name(), "Test Server");
        assert!(guild.channel_ids().is_empty());
    }

    #[test]
    fn test_guild_id_display() {
        let id = GuildId(123_456_789);
        assert_eq!(format!("{id}"), "123456789");
    }

    #[test]
    fn test_upsert_member_replaces_in_place() {
        let alice = User::new(1_u64, "alice", "0001");
        let bob = User::new(2_u64, "bob", "0002");
        let mut guild = Guild::new(1_u64, "g")
            .with_members(vec![Member::new(alice.clone()), Member::new(bob)]);

        guild.upsert_member(Member::new(alice).with_nick("ally"));

        assert_eq!(guild.members().len(), 2);
        assert_eq!(guild.members()[0].nick(), Some("ally"));
    }

    #[test]
    fn test_attach_channel_is_idempotent() {
        let mut guild = Guild::new(1_u64, "g");
        guild.attach_channel(ChannelId(5));
        guild.attach_channel(ChannelId(5));
        assert_eq!(guild.channel_ids(), &[ChannelId(5)]);

        guild.detach_channel(ChannelId(5));
        assert!(guild.channel_ids().is_empty());
    }
}
