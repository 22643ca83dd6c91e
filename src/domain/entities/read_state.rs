//! Read state and mute configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Channel, ChannelId, GuildId, MessageId};

/// Read marker for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadState {
    /// Channel ID.
    pub channel_id: ChannelId,
    /// ID of the last read message.
    pub last_read_message_id: MessageId,
}

impl ReadState {
    /// Creates a new read state.
    #[must_use]
    pub const fn new(channel_id: ChannelId, last_read_message_id: MessageId) -> Self {
        Self {
            channel_id,
            last_read_message_id,
        }
    }
}

/// User-configured mute settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteConfig {
    /// Channels muted one by one.
    #[serde(default)]
    pub muted_channels: BTreeSet<ChannelId>,
    /// Guilds muted as a whole.
    #[serde(default)]
    pub muted_guilds: BTreeSet<GuildId>,
    /// Guilds whose `@everyone` and `@here` pings are ignored.
    #[serde(default)]
    pub suppress_everyone_guilds: BTreeSet<GuildId>,
}

impl MuteConfig {
    /// A channel is muted when it or its guild is muted.
    #[must_use]
    pub fn is_channel_muted(&self, channel: &Channel) -> bool {
        self.muted_channels.contains(&channel.id())
            || channel
                .guild_id()
                .is_some_and(|guild_id| self.muted_guilds.contains(&guild_id))
    }

    /// Returns true if `@everyone` pings in the guild are ignored.
    #[must_use]
    pub fn suppresses_everyone(&self, guild_id: GuildId) -> bool {
        self.suppress_everyone_guilds.contains(&guild_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ChannelKind;

    #[test]
    fn test_guild_mute_covers_channels() {
        let mut config = MuteConfig::default();
        config.muted_guilds.insert(GuildId(1));

        let inside = Channel::new(10_u64, "a", ChannelKind::Text).with_guild(1_u64);
        let outside = Channel::new(11_u64, "b", ChannelKind::Text).with_guild(2_u64);

        assert!(config.is_channel_muted(&inside));
        assert!(!config.is_channel_muted(&outside));
    }

    #[test]
    fn test_channel_mute() {
        let mut config = MuteConfig::default();
        config.muted_channels.insert(ChannelId(7));

        let dm = Channel::new(7_u64, "", ChannelKind::Dm);
        assert!(config.is_channel_muted(&dm));
    }
}
