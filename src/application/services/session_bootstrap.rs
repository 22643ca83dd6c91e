use tracing::{info, warn};

use crate::application::context::SyncContext;
use crate::domain::entities::{Channel, Guild, User};
use crate::domain::errors::SyncError;
use crate::domain::events::ReadySnapshot;
use crate::domain::ports::{ChannelIndicator, GuildIndicator, Page};

/// Seeds the cache, read state and UI from the session's ready snapshot.
#[derive(Clone)]
pub struct SessionBootstrap {
    ctx: SyncContext,
}

impl SessionBootstrap {
    /// Creates the bootstrapper over the shared context.
    #[must_use]
    pub const fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }

    /// # Errors
    ///
    /// Returns `SyncError::UiClosed` if the UI loop has stopped.
    pub async fn apply(&self, ready: ReadySnapshot) -> Result<(), SyncError> {
        let ctx = &self.ctx;
        let ReadySnapshot {
            user,
            guilds,
            mut private_channels,
            mut relationships,
            read_state,
        } = ready;

        info!(user = %user.tag(), guilds = guilds.len(), "Session ready");
        ctx.cache.set_local_user(user);
        for snapshot in guilds {
            ctx.cache.insert_guild(snapshot.guild, snapshot.channels);
        }

        // Each insert lands on top, so the most recent goes last.
        private_channels.sort_by_key(Channel::last_message_id);
        for channel in private_channels {
            let channel_id = channel.id();
            if let Err(e) = ctx.cache.upsert_channel(channel) {
                warn!(channel_id = %channel_id, error = %e, "Skipping private channel");
            }
        }

        if relationships.is_empty() {
            match ctx.transport.fetch_relationships().await {
                Ok(fetched) => relationships = fetched,
                Err(e) => warn!(error = %e, "Failed to fetch relationships"),
            }
        }
        for relationship in relationships {
            ctx.cache.upsert_relationship(relationship);
        }

        if let Err(e) = ctx.read_state.load() {
            warn!(error = %e, "Persisted read state unavailable");
        }
        ctx.read_state.seed(&read_state);

        let guilds: Vec<(Guild, GuildIndicator)> = ctx
            .cache
            .guilds()
            .into_iter()
            .map(|guild| {
                let indicator = ctx.guild_indicator(guild.id());
                (guild, indicator)
            })
            .collect();
        let private: Vec<(Channel, ChannelIndicator)> = ctx
            .cache
            .private_channels()
            .into_iter()
            .map(|channel| {
                let indicator = ctx.channel_indicator(&channel);
                (channel, indicator)
            })
            .collect();
        let friends: Vec<User> = ctx.cache.friends();

        ctx.ui
            .enqueue_and_wait(move |ui| {
                for (guild, indicator) in &guilds {
                    ui.add_guild(guild);
                    ui.set_guild_indicator(guild.id(), *indicator);
                }
                for (channel, indicator) in &private {
                    ui.upsert_private_channel(channel);
                    ui.set_private_indicator(channel.id(), *indicator);
                }
                for friend in &friends {
                    ui.add_friend(friend);
                }
                ui.show_page(Page::Guilds);
            })
            .await
    }
}
