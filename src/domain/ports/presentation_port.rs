//! Port implemented by the rendering layer.
//!
//! Every method runs on the UI thread; workers reach it only through the
//! UI gateway.

use uuid::Uuid;

use crate::domain::entities::{
    Channel, ChannelId, Guild, GuildId, Member, Message, MessageId, User, UserId,
};

/// Read indicator of a channel node or private-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelIndicator {
    /// No unread messages.
    Read,
    /// Unread messages without a mention.
    Unread,
    /// An unread message mentions the local user.
    Mentioned,
}

/// Aggregate indicator of a guild in the guild list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuildIndicator {
    /// The guild is the one currently open.
    Selected,
    /// Another channel of the guild has unread messages.
    Unread,
    /// Every readable channel is read.
    Read,
}

/// Left-hand page of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Guild list with the channel tree of the open guild.
    Guilds,
    /// Private channels and friends.
    Private,
}

/// Widget that takes keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    /// Guild list.
    GuildList,
    /// Channel tree of the open guild.
    ChannelTree,
    /// Private channel list.
    PrivateList,
    /// Message input box.
    MessageInput,
}

/// A failed send or edit waiting for the user's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailure {
    /// Key the user's answer is resolved by.
    pub id: Uuid,
    /// Whether the failed request was an edit.
    pub is_edit: bool,
    /// Transport error text.
    pub reason: String,
}

impl SendFailure {
    /// Dialog text shown above the Retry sending / Edit / Cancel buttons.
    #[must_use]
    pub fn dialog_text(&self) -> String {
        let action = if self.is_edit { "editing" } else { "sending" };
        format!(
            "Error {action} message: {}.\n\nWhat do you want to do?",
            self.reason
        )
    }
}

/// Port implemented by the rendering layer.
pub trait PresentationPort: Send {
    /// Replaces the chat with the channel's history.
    fn set_messages(&mut self, channel_id: ChannelId, messages: &[Message]);
    /// Adds a row at the bottom of the chat.
    fn append_message(&mut self, message: &Message);
    /// Refreshes the row of an edited message.
    fn update_message(&mut self, message: &Message);
    /// Removes the rows of deleted messages.
    fn remove_messages(&mut self, message_ids: &[MessageId]);
    /// Empties the chat view.
    fn clear_chat(&mut self);
    /// Sets the title above the chat.
    fn set_chat_header(&mut self, title: &str);

    /// Adds a guild to the guild list.
    fn add_guild(&mut self, guild: &Guild);
    /// Refreshes a guild entry after a rename.
    fn update_guild(&mut self, guild: &Guild);
    /// Removes a guild from the guild list.
    fn remove_guild(&mut self, guild_id: GuildId);
    /// Sets the aggregate read indicator of a guild.
    fn set_guild_indicator(&mut self, guild_id: GuildId, indicator: GuildIndicator);

    /// Replaces the channel tree with the given channels.
    fn set_channels(&mut self, guild_id: GuildId, channels: &[(Channel, ChannelIndicator)]);
    /// Adds or refreshes a node in the channel tree.
    fn upsert_channel(&mut self, channel: &Channel);
    /// Removes a node from the channel tree.
    fn remove_channel(&mut self, channel_id: ChannelId);
    /// Empties the channel tree.
    fn clear_channels(&mut self);
    /// Sets the read indicator of a guild channel.
    fn set_channel_indicator(&mut self, channel_id: ChannelId, indicator: ChannelIndicator);

    /// Adds or refreshes an entry in the private list.
    fn upsert_private_channel(&mut self, channel: &Channel);
    /// Removes an entry from the private list.
    fn remove_private_channel(&mut self, channel_id: ChannelId);
    /// Moves a private channel to the top of its list.
    fn move_private_channel_to_top(&mut self, channel_id: ChannelId);
    /// Sets the read indicator of a private channel.
    fn set_private_indicator(&mut self, channel_id: ChannelId, indicator: ChannelIndicator);
    /// Adds a user to the friend list.
    fn add_friend(&mut self, user: &User);
    /// Removes a user from the friend list.
    fn remove_friend(&mut self, user_id: UserId);

    /// Replaces the member roster.
    fn set_members(&mut self, members: &[Member]);
    /// Adds or refreshes members in the roster.
    fn upsert_members(&mut self, members: &[Member]);
    /// Removes a member from the roster.
    fn remove_member(&mut self, user_id: UserId);
    /// Empties the member roster.
    fn clear_members(&mut self);

    /// Switches the left-hand page.
    fn show_page(&mut self, page: Page);
    /// Shows a one-button error dialog.
    fn show_error(&mut self, text: &str);
    /// Shows the Retry sending / Edit / Cancel dialog.
    fn show_send_failure(&mut self, failure: &SendFailure);
    /// Asks whether the message should be deleted. The answer goes back
    /// through `MessageSender::resolve_deletion`.
    fn confirm_message_deletion(&mut self, channel_id: ChannelId, message_id: MessageId);
    /// Replaces the content of the input box.
    fn set_input_text(&mut self, text: &str);
    /// Moves keyboard focus.
    fn focus(&mut self, target: FocusTarget);

    /// Called once after every applied mutation.
    fn redraw(&mut self);
}

#[cfg(test)]
#[allow(dead_code)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// One recorded presentation call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum UiCall {
        SetMessages(ChannelId, Vec<MessageId>),
        Append(MessageId),
        Update(MessageId, String),
        Remove(Vec<MessageId>),
        ClearChat,
        Header(String),
        AddGuild(GuildId),
        UpdateGuild(GuildId, String),
        RemoveGuild(GuildId),
        GuildIndicator(GuildId, GuildIndicator),
        SetChannels(GuildId, Vec<(ChannelId, ChannelIndicator)>),
        UpsertChannel(ChannelId),
        RemoveChannel(ChannelId),
        ClearChannels,
        ChannelIndicator(ChannelId, ChannelIndicator),
        UpsertPrivate(ChannelId),
        RemovePrivate(ChannelId),
        PrivateToTop(ChannelId),
        PrivateIndicator(ChannelId, ChannelIndicator),
        AddFriend(UserId),
        RemoveFriend(UserId),
        SetMembers(Vec<UserId>),
        UpsertMembers(Vec<UserId>),
        RemoveMember(UserId),
        ClearMembers,
        ShowPage(Page),
        Error(String),
        SendFailure(SendFailure),
        ConfirmDeletion(ChannelId, MessageId),
        InputText(String),
        Focus(FocusTarget),
    }

    /// Presenter that records every call for assertions.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingPresenter {
        pub calls: Arc<Mutex<Vec<UiCall>>>,
        pub redraws: Arc<Mutex<usize>>,
    }

    impl RecordingPresenter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<UiCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn redraws(&self) -> usize {
            *self.redraws.lock().unwrap()
        }

        pub fn clear(&self) {
            self.calls.lock().unwrap().clear();
        }

        fn record(&self, call: UiCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl PresentationPort for RecordingPresenter {
        fn set_messages(&mut self, channel_id: ChannelId, messages: &[Message]) {
            self.record(UiCall::SetMessages(
                channel_id,
                messages.iter().map(Message::id).collect(),
            ));
        }

        fn append_message(&mut self, message: &Message) {
            self.record(UiCall::Append(message.id()));
        }

        fn update_message(&mut self, message: &Message) {
            self.record(UiCall::Update(message.id(), message.content().to_string()));
        }

        fn remove_messages(&mut self, message_ids: &[MessageId]) {
            self.record(UiCall::Remove(message_ids.to_vec()));
        }

        fn clear_chat(&mut self) {
            self.record(UiCall::ClearChat);
        }

        fn set_chat_header(&mut self, title: &str) {
            self.record(UiCall::Header(title.to_string()));
        }

        fn add_guild(&mut self, guild: &Guild) {
            self.record(UiCall::AddGuild(guild.id()));
        }

        fn update_guild(&mut self, guild: &Guild) {
            self.record(UiCall::UpdateGuild(guild.id(), guild.name().to_string()));
        }

        fn remove_guild(&mut self, guild_id: GuildId) {
            self.record(UiCall::RemoveGuild(guild_id));
        }

        fn set_guild_indicator(&mut self, guild_id: GuildId, indicator: GuildIndicator) {
            self.record(UiCall::GuildIndicator(guild_id, indicator));
        }

        fn set_channels(&mut self, guild_id: GuildId, channels: &[(Channel, ChannelIndicator)]) {
            self.record(UiCall::SetChannels(
                guild_id,
                channels.iter().map(|(c, i)| (c.id(), *i)).collect(),
            ));
        }

        fn upsert_channel(&mut self, channel: &Channel) {
            self.record(UiCall::UpsertChannel(channel.id()));
        }

        fn remove_channel(&mut self, channel_id: ChannelId) {
            self.record(UiCall::RemoveChannel(channel_id));
        }

        fn clear_channels(&mut self) {
            self.record(UiCall::ClearChannels);
        }

        fn set_channel_indicator(&mut self, channel_id: ChannelId, indicator: ChannelIndicator) {
            self.record(UiCall::ChannelIndicator(channel_id, indicator));
        }

        fn upsert_private_channel(&mut self, channel: &Channel) {
            self.record(UiCall::UpsertPrivate(channel.id()));
        }

        fn remove_private_channel(&mut self, channel_id: ChannelId) {
            self.record(UiCall::RemovePrivate(channel_id));
        }

        fn move_private_channel_to_top(&mut self, channel_id: ChannelId) {
            self.record(UiCall::PrivateToTop(channel_id));
        }

        fn set_private_indicator(&mut self, channel_id: ChannelId, indicator: ChannelIndicator) {
            self.record(UiCall::PrivateIndicator(channel_id, indicator));
        }

        fn add_friend(&mut self, user: &User) {
            self.record(UiCall::AddFriend(user.id()));
        }

        fn remove_friend(&mut self, user_id: UserId) {
            self.record(UiCall::RemoveFriend(user_id));
        }

        fn set_members(&mut self, members: &[Member]) {
            self.record(UiCall::SetMembers(
                members.iter().map(Member::user_id).collect(),
            ));
        }

        fn upsert_members(&mut self, members: &[Member]) {
            self.record(UiCall::UpsertMembers(
                members.iter().map(Member::user_id).collect(),
            ));
        }

        fn remove_member(&mut self, user_id: UserId) {
            self.record(UiCall::RemoveMember(user_id));
        }

        fn clear_members(&mut self) {
            self.record(UiCall::ClearMembers);
        }

        fn show_page(&mut self, page: Page) {
            self.record(UiCall::ShowPage(page));
        }

        fn show_error(&mut self, text: &str) {
            self.record(UiCall::Error(text.to_string()));
        }

        fn show_send_failure(&mut self, failure: &SendFailure) {
            self.record(UiCall::SendFailure(failure.clone()));
        }

        fn confirm_message_deletion(&mut self, channel_id: ChannelId, message_id: MessageId) {
            self.record(UiCall::ConfirmDeletion(channel_id, message_id));
        }

        fn set_input_text(&mut self, text: &str) {
            self.record(UiCall::InputText(text.to_string()));
        }

        fn focus(&mut self, target: FocusTarget) {
            self.record(UiCall::Focus(target));
        }

        fn redraw(&mut self) {
            *self.redraws.lock().unwrap() += 1;
        }
    }
}
