//! Channel navigation state.
//!
//! Holds identities only; entities stay owned by the session cache and are
//! looked up on use, so a removed guild or channel can never be dereferenced
//! through a stale selection.

use super::entities::{ChannelId, GuildId};

/// A channel together with the guild it belongs to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The channel.
    pub channel: ChannelId,
    /// Its guild, `None` for private channels.
    pub guild: Option<GuildId>,
}

impl Selection {
    /// Creates a selection.
    #[must_use]
    pub const fn new(channel: ChannelId, guild: Option<GuildId>) -> Self {
        Self { channel, guild }
    }
}

/// Observable navigation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    /// Nothing is open.
    NoSelection,
    /// A guild channel is open.
    #[allow(missing_docs)]
    GuildChannelSelected { guild: GuildId, channel: ChannelId },
    /// A DM or group DM is open.
    #[allow(missing_docs)]
    PrivateChannelSelected { channel: ChannelId },
}

/// What a channel selection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelTransition {
    /// Channel that was open before, if it differs from the new one.
    pub left_channel: Option<Selection>,
    /// Guild that was selected before, if it differs from the new channel's guild.
    pub left_guild: Option<GuildId>,
}

/// What a guild removal cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuildRemoval {
    /// The removed guild was the selected one.
    pub was_selected: bool,
    /// The open channel belonged to the removed guild.
    pub closed_channel: Option<ChannelId>,
}

/// Selected guild plus the current and previous channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    selected_guild: Option<GuildId>,
    current: Option<Selection>,
    previous: Option<Selection>,
}

impl NavigationState {
    /// Creates a state with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Guild highlighted in the guild list.
    #[must_use]
    pub const fn selected_guild(&self) -> Option<GuildId> {
        self.selected_guild
    }

    /// Channel currently open.
    #[must_use]
    pub const fn current(&self) -> Option<Selection> {
        self.current
    }

    /// Channel open before the current one.
    #[must_use]
    pub const fn previous(&self) -> Option<Selection> {
        self.previous
    }

    /// Whether `guild_id` is highlighted in the guild list.
    #[must_use]
    pub fn is_guild_selected(&self, guild_id: GuildId) -> bool {
        self.selected_guild == Some(guild_id)
    }

    /// Phase derived from the current selection.
    #[must_use]
    pub const fn phase(&self) -> NavigationPhase {
        match self.current {
            None => NavigationPhase::NoSelection,
            Some(Selection {
                channel,
                guild: Some(guild),
            }) => NavigationPhase::GuildChannelSelected { guild, channel },
            Some(Selection {
                channel,
                guild: None,
            }) => NavigationPhase::PrivateChannelSelected { channel },
        }
    }

    /// Selects a guild in the guild list. Returns the previously selected one.
    pub fn select_guild(&mut self, guild_id: GuildId) -> Option<GuildId> {
        self.selected_guild.replace(guild_id)
    }

    /// Records a channel selection and pushes history.
    ///
    /// The first selection seeds `previous` with itself so switching back is a
    /// no-op; re-selecting the open channel leaves history untouched.
    pub fn select_channel(&mut self, selection: Selection) -> ChannelTransition {
        let mut transition = ChannelTransition::default();

        match self.current {
            None => self.previous = Some(selection),
            Some(current) if current.channel != selection.channel => {
                self.previous = Some(current);
                transition.left_channel = Some(current);
            }
            Some(_) => {}
        }

        if let Some(old_guild) = self.selected_guild
            && selection.guild != Some(old_guild)
        {
            transition.left_guild = Some(old_guild);
        }

        self.selected_guild = selection.guild;
        self.current = Some(selection);
        transition
    }

    /// The selection `switch to previous` would go to, unless that is a no-op.
    #[must_use]
    pub fn previous_target(&self) -> Option<Selection> {
        let previous = self.previous?;
        if self.current.is_some_and(|c| c.channel == previous.channel) {
            return None;
        }
        Some(previous)
    }

    /// Forgets the previous channel.
    pub fn clear_previous(&mut self) {
        self.previous = None;
    }

    /// Drops every reference to a removed guild.
    pub fn on_guild_removed(&mut self, guild_id: GuildId) -> GuildRemoval {
        let mut removal = GuildRemoval::default();

        if self.previous.is_some_and(|p| p.guild == Some(guild_id)) {
            self.previous = None;
        }

        if self.selected_guild == Some(guild_id) {
            self.selected_guild = None;
            removal.was_selected = true;
        }

        if let Some(current) = self.current
            && current.guild == Some(guild_id)
        {
            self.current = None;
            removal.closed_channel = Some(current.channel);
        }

        removal
    }

    /// Drops every reference to a removed channel. Returns true if it was open.
    pub fn on_channel_removed(&mut self, channel_id: ChannelId) -> bool {
        if self.previous.is_some_and(|p| p.channel == channel_id) {
            self.previous = None;
        }

        if self.current.is_some_and(|c| c.channel == channel_id) {
            self.current = None;
            return true;
        }
        false
    }
}
