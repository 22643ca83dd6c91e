//! Navigation error types.

use thiserror::Error;

use crate::domain::entities::ChannelKind;

/// Errors raised while switching channels. The texts are shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum NavigationError {
    #[error("Channel {channel} not found")]
    ChannelNotFound { channel: String },

    #[error("Unable to load guild: {guild}")]
    GuildNotFound { guild: String },

    #[error("No read permissions for channel: {channel}")]
    MissingReadPermission { channel: String },

    #[error("Invalid channel type")]
    InvalidChannelKind { kind: ChannelKind },

    #[error("user interface is no longer running")]
    UiClosed,
}

impl NavigationError {
    /// Channel that is not cached or no longer exists.
    #[must_use]
    pub fn channel_not_found(channel: impl ToString) -> Self {
        Self::ChannelNotFound {
            channel: channel.to_string(),
        }
    }

    /// Guild that is not cached or no longer exists.
    #[must_use]
    pub fn guild_not_found(guild: impl ToString) -> Self {
        Self::GuildNotFound {
            guild: guild.to_string(),
        }
    }

    /// Channel the local user may not view.
    #[must_use]
    pub fn missing_read_permission(channel: impl ToString) -> Self {
        Self::MissingReadPermission {
            channel: channel.to_string(),
        }
    }
}
