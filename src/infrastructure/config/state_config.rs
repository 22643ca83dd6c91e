//! Navigation state persisted between runs.

use serde::{Deserialize, Serialize};

use crate::domain::Selection;
use crate::domain::entities::{ChannelId, GuildId};

/// Navigation state kept between runs.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Last opened channel.
    #[serde(default)]
    pub last_channel_id: Option<ChannelId>,

    /// Guild of the last opened channel, or the last selected guild.
    #[serde(default)]
    pub last_guild_id: Option<GuildId>,
}

impl StateConfig {
    /// Captures the current selection, falling back to the selected guild.
    #[must_use]
    pub fn from_navigation(current: Option<Selection>, selected_guild: Option<GuildId>) -> Self {
        Self {
            last_channel_id: current.map(|s| s.channel),
            last_guild_id: current.and_then(|s| s.guild).or(selected_guild),
        }
    }
}
