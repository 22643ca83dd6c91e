//! Guild and channel selection driven by the user.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::application::context::SyncContext;
use crate::domain::Selection;
use crate::domain::entities::{Channel, ChannelId, GuildId};
use crate::domain::errors::NavigationError;
use crate::domain::ports::{ChannelIndicator, FocusTarget, GuildIndicator, Page};
use crate::domain::services::PermissionCalculator;

/// Loads guilds and channels into the UI and keeps navigation history.
#[derive(Clone)]
pub struct NavigationService {
    ctx: SyncContext,
}

impl NavigationService {
    /// Creates the service over the shared context.
    #[must_use]
    pub const fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }

    /// Opens a guild: its channel tree, member roster and selected indicator.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::GuildNotFound` for an uncached guild.
    pub async fn select_guild(&self, guild_id: GuildId) -> Result<(), NavigationError> {
        let ctx = &self.ctx;
        if ctx.cache.guild(guild_id).is_none() {
            return Err(NavigationError::guild_not_found(guild_id));
        }
        let previous = ctx.navigation.lock().select_guild(guild_id);

        if ctx.cache.guild_members(guild_id).is_empty() {
            match ctx.transport.fetch_members(guild_id).await {
                Ok(members) => ctx.cache.upsert_members(guild_id, members)?,
                Err(e) => warn!(guild_id = %guild_id, error = %e, "Failed to fetch members"),
            }
        }

        let channels: Vec<(Channel, ChannelIndicator)> = ctx
            .readable_channels(guild_id)
            .into_iter()
            .map(|channel| {
                let indicator = ctx.channel_indicator(&channel);
                (channel, indicator)
            })
            .collect();
        let members = ctx.cache.guild_members(guild_id);
        debug!(guild_id = %guild_id, channels = channels.len(), members = members.len(), "Guild loaded");

        ctx.ui
            .enqueue_and_wait(move |ui| {
                ui.set_channels(guild_id, &channels);
                ui.set_members(&members);
                ui.set_guild_indicator(guild_id, GuildIndicator::Selected);
            })
            .await?;

        match previous {
            Some(old) if old != guild_id => Ok(ctx.refresh_guild_indicator(old).await?),
            _ => Ok(()),
        }
    }

    /// Opens a channel in the chat view and marks it read.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::ChannelNotFound` for an uncached channel and
    /// `NavigationError::InvalidChannelKind` for channels without messages.
    pub async fn select_channel(&self, channel_id: ChannelId) -> Result<(), NavigationError> {
        let ctx = &self.ctx;
        let channel = ctx
            .cache
            .channel(channel_id)
            .ok_or_else(|| NavigationError::channel_not_found(channel_id))?;
        if !channel.kind().is_guild_text() && !channel.is_private() {
            return Err(NavigationError::InvalidChannelKind {
                kind: channel.kind(),
            });
        }

        // History is fetched before taking the chat lock so message workers
        // keep running during the round trip.
        if !ctx.cache.has_messages(channel_id) && channel.last_message_id().is_some() {
            match ctx
                .transport
                .fetch_messages(channel_id, ctx.settings.message_fetch_limit)
                .await
            {
                Ok(history) => {
                    ctx.cache.merge_history(channel_id, history)?;
                }
                Err(e) => warn!(channel_id = %channel_id, error = %e, "Failed to fetch messages"),
            }
        }

        let mut chat = ctx.open_chat.lock().await;
        let Some(channel) = ctx.cache.channel(channel_id) else {
            debug!(channel_id = %channel_id, "Channel deleted while loading");
            return Err(NavigationError::channel_not_found(channel_id));
        };

        let transition = ctx
            .navigation
            .lock()
            .select_channel(Selection::new(channel_id, channel.guild_id()));

        let messages = ctx.cache.messages(channel_id);
        chat.channel_id = Some(channel_id);
        chat.rows = messages.iter().map(|m| m.id()).collect::<HashSet<_>>();

        let last = channel.last_message_id();
        if let Some(last) = last {
            ctx.read_state.mark_read(channel_id, last);
        }

        let header = channel.header_title();
        let private = channel.is_private();
        let focus = ctx.settings.focus_message_input_after_channel_selection;
        info!(channel_id = %channel_id, messages = messages.len(), "Channel opened");
        ctx.ui
            .enqueue_and_wait(move |ui| {
                ui.set_messages(channel_id, &messages);
                ui.set_chat_header(&header);
                if private {
                    ui.set_private_indicator(channel_id, ChannelIndicator::Read);
                } else {
                    ui.set_channel_indicator(channel_id, ChannelIndicator::Read);
                }
                if focus {
                    ui.focus(FocusTarget::MessageInput);
                }
            })
            .await?;
        drop(chat);

        if let Some(left) = transition.left_channel
            && let Some(left_channel) = ctx.cache.channel(left.channel)
        {
            if let Some(left_last) = left_channel.last_message_id() {
                ctx.read_state.mark_read(left.channel, left_last);
            }
            ctx.show_channel_indicator(&left_channel, ChannelIndicator::Read)
                .await?;
        }
        if let Some(left_guild) = transition.left_guild {
            ctx.refresh_guild_indicator(left_guild).await?;
        }

        if let Some(last) = last {
            let tracker = ctx.read_state.clone();
            tokio::spawn(async move {
                if let Err(e) = tracker.update_read(channel_id, last).await {
                    warn!(channel_id = %channel_id, error = %e, "Failed to acknowledge channel");
                }
            });
        }
        Ok(())
    }

    /// Jumps back to the previously open channel.
    ///
    /// Returns false when there is nowhere to go. A target that no longer
    /// exists or became unreadable is forgotten and reported to the user.
    ///
    /// # Errors
    ///
    /// Returns the reason the previous channel cannot be opened.
    pub async fn switch_to_previous(&self) -> Result<bool, NavigationError> {
        let Some(target) = self.ctx.navigation.lock().previous_target() else {
            return Ok(false);
        };

        if let Err(e) = self.validate(target) {
            info!(channel_id = %target.channel, error = %e, "Previous channel unavailable");
            self.ctx.navigation.lock().clear_previous();
            let text = e.to_string();
            self.ctx
                .ui
                .enqueue_and_wait(move |ui| ui.show_error(&text))
                .await?;
            return Err(e);
        }

        let page = if target.guild.is_some() {
            Page::Guilds
        } else {
            Page::Private
        };
        self.ctx
            .ui
            .enqueue_and_wait(move |ui| ui.show_page(page))
            .await?;
        if let Some(guild_id) = target.guild {
            self.select_guild(guild_id).await?;
        }
        self.select_channel(target.channel).await?;
        Ok(true)
    }

    fn validate(&self, target: Selection) -> Result<(), NavigationError> {
        let channel = self
            .ctx
            .cache
            .channel(target.channel)
            .ok_or_else(|| NavigationError::channel_not_found(target.channel))?;

        let Some(guild_id) = target.guild else {
            return if channel.is_private() {
                Ok(())
            } else {
                Err(NavigationError::channel_not_found(target.channel))
            };
        };

        let guild = self
            .ctx
            .cache
            .guild(guild_id)
            .ok_or_else(|| NavigationError::guild_not_found(guild_id))?;
        if let Some(member) = self.ctx.cache.local_member(guild_id)
            && !PermissionCalculator::can_read(&guild, &channel, &member)
        {
            return Err(NavigationError::missing_read_permission(channel.name()));
        }
        Ok(())
    }
}
