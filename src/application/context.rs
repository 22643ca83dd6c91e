//! Explicit application context handed to every worker and service.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::application::pipeline::QueueCapacities;
use crate::application::services::{
    ActivityMonitor, MessageComposer, ReadStateTracker,
};
use crate::application::session_cache::SessionCache;
use crate::application::ui_gateway::UiHandle;
use crate::domain::entities::{Channel, ChannelId, GuildId, MessageId, RoleId};
use crate::domain::errors::SyncError;
use crate::domain::ports::{
    ChannelIndicator, GuildIndicator, NotificationPort, ReadStateStore, ScriptHook, TransportPort,
};
use crate::domain::services::PermissionCalculator;
use crate::domain::{NavigationState, Selection};

/// Runtime knobs of the sync core.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Prefix of desktop notification titles.
    pub app_name: String,
    /// Whether desktop notifications are sent at all.
    pub enable_desktop_notifications: bool,
    /// Focus the input box after opening a channel.
    pub focus_message_input_after_channel_selection: bool,
    /// Messages fetched when opening a channel with an empty cache.
    pub message_fetch_limit: u8,
    /// Idle time after which the user counts as away.
    pub user_inactive: Duration,
    /// Interval between flushes of buffered read acknowledgements.
    pub read_ack_interval: Duration,
    /// Capacity of each event queue.
    pub queues: QueueCapacities,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            app_name: "Oxicord".to_string(),
            enable_desktop_notifications: true,
            focus_message_input_after_channel_selection: true,
            message_fetch_limit: crate::domain::ports::MAX_FETCH_LIMIT,
            user_inactive: Duration::from_secs(10),
            read_ack_interval: Duration::from_secs(1),
            queues: QueueCapacities::default(),
        }
    }
}

/// Collaborators supplied by the outer layers.
#[derive(Clone)]
pub struct SyncPorts {
    /// Remote service.
    pub transport: Arc<dyn TransportPort>,
    /// Persistent read markers and mutes.
    pub store: Arc<dyn ReadStateStore>,
    /// Desktop notification sink.
    pub notifier: Arc<dyn NotificationPort>,
    /// Rewrites applied to outgoing text.
    pub hook: Arc<dyn ScriptHook>,
}

/// The channel whose messages are on screen and the rows it shows.
#[derive(Debug, Default)]
pub struct OpenChat {
    /// Open channel, if any.
    pub channel_id: Option<ChannelId>,
    /// Messages currently shown as rows.
    pub rows: HashSet<MessageId>,
}

impl OpenChat {
    /// Whether `channel_id` is the open channel.
    #[must_use]
    pub fn is_open(&self, channel_id: ChannelId) -> bool {
        self.channel_id == Some(channel_id)
    }

    /// Forgets the open channel and its rows.
    pub fn close(&mut self) {
        self.channel_id = None;
        self.rows.clear();
    }
}

/// Shared state and ports handed to every worker and service.
#[derive(Clone)]
pub struct SyncContext {
    /// Cache of remote state.
    pub cache: SessionCache,
    /// Read markers and acknowledgement buffering.
    pub read_state: ReadStateTracker,
    /// Current and previous selection.
    pub navigation: Arc<Mutex<NavigationState>>,
    /// Held by whoever changes the visible message list.
    pub open_chat: Arc<tokio::sync::Mutex<OpenChat>>,
    /// Queue into the UI thread.
    pub ui: UiHandle,
    /// Remote service.
    pub transport: Arc<dyn TransportPort>,
    /// Desktop notification sink.
    pub notifier: Arc<dyn NotificationPort>,
    /// Outgoing text preparation.
    pub composer: Arc<MessageComposer>,
    /// Tracks when the user last typed.
    pub activity: ActivityMonitor,
    /// Runtime knobs.
    pub settings: SyncSettings,
}

impl SyncContext {
    /// Wires the services on top of the given ports.
    #[must_use]
    pub fn new(cache: SessionCache, ui: UiHandle, ports: SyncPorts, settings: SyncSettings) -> Self {
        let read_state = ReadStateTracker::new(ports.transport.clone(), ports.store);
        let composer = Arc::new(MessageComposer::new(
            cache.clone(),
            ports.hook,
            ports.transport.clone(),
        ));
        Self {
            cache,
            read_state,
            navigation: Arc::new(Mutex::new(NavigationState::new())),
            open_chat: Arc::new(tokio::sync::Mutex::new(OpenChat::default())),
            ui,
            transport: ports.transport,
            notifier: ports.notifier,
            composer,
            activity: ActivityMonitor::new(settings.user_inactive),
            settings,
        }
    }

    /// Channel currently open, if any.
    #[must_use]
    pub fn current_selection(&self) -> Option<Selection> {
        self.navigation.lock().current()
    }

    /// Whether `guild_id` is the guild currently open.
    #[must_use]
    pub fn is_guild_selected(&self, guild_id: GuildId) -> bool {
        self.navigation.lock().is_guild_selected(guild_id)
    }

    /// Roles the local user holds in a guild, empty when unknown.
    #[must_use]
    pub fn local_roles(&self, guild_id: GuildId) -> Vec<RoleId> {
        self.cache
            .local_member(guild_id)
            .map(|member| member.roles)
            .unwrap_or_default()
    }

    /// Guild channels the local user can see. Without a cached membership
    /// every channel is assumed visible.
    #[must_use]
    pub fn readable_channels(&self, guild_id: GuildId) -> Vec<Channel> {
        let channels = self.cache.guild_channels(guild_id);
        let (Some(guild), Some(member)) = (
            self.cache.guild(guild_id),
            self.cache.local_member(guild_id),
        ) else {
            return channels;
        };
        channels
            .into_iter()
            .filter(|c| c.kind().is_category() || PermissionCalculator::can_read(&guild, c, &member))
            .collect()
    }

    /// Indicator a channel should show given its read and mute state.
    #[must_use]
    pub fn channel_indicator(&self, channel: &Channel) -> ChannelIndicator {
        if self.read_state.is_muted(channel) || self.read_state.is_read(channel) {
            ChannelIndicator::Read
        } else {
            ChannelIndicator::Unread
        }
    }

    /// Aggregate indicator of a guild.
    #[must_use]
    pub fn guild_indicator(&self, guild_id: GuildId) -> GuildIndicator {
        if self.is_guild_selected(guild_id) {
            GuildIndicator::Selected
        } else if self
            .read_state
            .has_guild_been_read(&self.readable_channels(guild_id))
        {
            GuildIndicator::Read
        } else {
            GuildIndicator::Unread
        }
    }

    /// Recomputes and shows the aggregate indicator of a guild.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UiClosed` if the UI loop has stopped.
    pub async fn refresh_guild_indicator(&self, guild_id: GuildId) -> Result<(), SyncError> {
        let indicator = self.guild_indicator(guild_id);
        self.ui
            .enqueue_and_wait(move |ui| ui.set_guild_indicator(guild_id, indicator))
            .await
    }

    /// Shows `indicator` wherever the channel is listed.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UiClosed` if the UI loop has stopped.
    pub async fn show_channel_indicator(
        &self,
        channel: &Channel,
        indicator: ChannelIndicator,
    ) -> Result<(), SyncError> {
        let channel_id = channel.id();
        if channel.is_private() {
            return self
                .ui
                .enqueue_and_wait(move |ui| ui.set_private_indicator(channel_id, indicator))
                .await;
        }
        match channel.guild_id() {
            Some(guild_id) if self.is_guild_selected(guild_id) => {
                self.ui
                    .enqueue_and_wait(move |ui| ui.set_channel_indicator(channel_id, indicator))
                    .await
            }
            Some(guild_id) => self.refresh_guild_indicator(guild_id).await,
            None => Ok(()),
        }
    }
}
