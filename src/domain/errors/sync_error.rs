//! Errors raised inside the event pipeline.

use thiserror::Error;

use crate::domain::entities::{ChannelId, GuildId};

/// Pipeline and cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SyncError {
    #[error("channel {0} is not cached")]
    UnknownChannel(ChannelId),

    #[error("guild {0} is not cached")]
    UnknownGuild(GuildId),

    #[error("{family} queue is closed")]
    QueueClosed { family: &'static str },

    #[error("user interface is no longer running")]
    UiClosed,
}

impl SyncError {
    /// Events hitting a cache miss are dropped without telling the user.
    #[must_use]
    pub const fn is_cache_miss(&self) -> bool {
        matches!(self, Self::UnknownChannel(_) | Self::UnknownGuild(_))
    }
}

impl From<SyncError> for super::NavigationError {
    fn from(error: SyncError) -> Self {
        match error {
            SyncError::UnknownChannel(id) => Self::channel_not_found(id),
            SyncError::UnknownGuild(id) => Self::guild_not_found(id),
            SyncError::QueueClosed { .. } | SyncError::UiClosed => Self::UiClosed,
        }
    }
}
