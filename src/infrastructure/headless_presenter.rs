//! Presenter without a terminal: keeps a plain model of the screen and logs
//! every change.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::{debug, info, trace, warn};

use crate::domain::entities::{
    Channel, ChannelId, Guild, GuildId, Member, Message, MessageId, User, UserId,
};
use crate::domain::ports::{
    ChannelIndicator, FocusTarget, GuildIndicator, Page, PresentationPort, SendFailure,
};

/// Presenter that renders into an in-memory screen model.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    header: String,
    chat: Vec<(MessageId, String)>,
    guilds: Vec<(GuildId, String)>,
    guild_indicators: BTreeMap<GuildId, GuildIndicator>,
    channels: Vec<(ChannelId, String)>,
    channel_indicators: BTreeMap<ChannelId, ChannelIndicator>,
    private: Vec<(ChannelId, String)>,
    friends: Vec<(UserId, String)>,
    members: Vec<(UserId, String)>,
    input: String,
    page: Option<Page>,
    focus: Option<FocusTarget>,
    errors: Vec<String>,
    deletion_prompt: Option<(ChannelId, MessageId)>,
    redraws: usize,
}

fn row(message: &Message) -> String {
    format!("{}: {}", message.author().tag(), message.content())
}

const fn channel_mark(indicator: Option<&ChannelIndicator>) -> &'static str {
    match indicator {
        Some(ChannelIndicator::Mentioned) => "@",
        Some(ChannelIndicator::Unread) => "*",
        Some(ChannelIndicator::Read) | None => " ",
    }
}

impl HeadlessPresenter {
    /// Creates an empty screen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Title above the chat.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Chat rows in display order.
    #[must_use]
    pub fn chat(&self) -> &[(MessageId, String)] {
        &self.chat
    }

    /// Error dialogs shown so far, oldest first.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Message the user was last asked to confirm deleting.
    #[must_use]
    pub const fn deletion_prompt(&self) -> Option<(ChannelId, MessageId)> {
        self.deletion_prompt
    }

    /// Content of the input box.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Indicator last set for a guild.
    #[must_use]
    pub fn guild_indicator(&self, guild_id: GuildId) -> Option<GuildIndicator> {
        self.guild_indicators.get(&guild_id).copied()
    }

    /// Indicator last set for a guild or private channel.
    #[must_use]
    pub fn channel_indicator(&self, channel_id: ChannelId) -> Option<ChannelIndicator> {
        self.channel_indicators.get(&channel_id).copied()
    }

    /// Private list in display order.
    #[must_use]
    pub fn private_order(&self) -> Vec<ChannelId> {
        self.private.iter().map(|(id, _)| *id).collect()
    }

    /// Page last shown.
    #[must_use]
    pub const fn page(&self) -> Option<Page> {
        self.page
    }

    /// Widget that last took focus.
    #[must_use]
    pub const fn focus_target(&self) -> Option<FocusTarget> {
        self.focus
    }

    /// Number of redraws so far.
    #[must_use]
    pub const fn redraws(&self) -> usize {
        self.redraws
    }

    /// Plain-text dump of the screen model.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== guilds");
        for (id, name) in &self.guilds {
            let mark = match self.guild_indicators.get(id) {
                Some(GuildIndicator::Selected) => ">",
                Some(GuildIndicator::Unread) => "*",
                _ => " ",
            };
            let _ = writeln!(out, "{mark} {name}");
        }
        let _ = writeln!(out, "== channels");
        for (id, name) in &self.channels {
            let _ = writeln!(out, "{} #{name}", channel_mark(self.channel_indicators.get(id)));
        }
        let _ = writeln!(out, "== private");
        for (id, name) in &self.private {
            let _ = writeln!(out, "{} {name}", channel_mark(self.channel_indicators.get(id)));
        }
        let _ = writeln!(out, "== friends");
        for (_, name) in &self.friends {
            let _ = writeln!(out, "  {name}");
        }
        let _ = writeln!(out, "== members");
        for (_, name) in &self.members {
            let _ = writeln!(out, "  {name}");
        }
        let _ = writeln!(out, "== chat: {}", self.header);
        for (_, text) in &self.chat {
            let _ = writeln!(out, "  {text}");
        }
        for error in &self.errors {
            let _ = writeln!(out, "!! {error}");
        }
        out
    }

    fn upsert_named<K: PartialEq>(list: &mut Vec<(K, String)>, id: K, name: String) {
        match list.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = name,
            None => list.push((id, name)),
        }
    }
}

impl PresentationPort for HeadlessPresenter {
    fn set_messages(&mut self, channel_id: ChannelId, messages: &[Message]) {
        debug!(channel_id = %channel_id, count = messages.len(), "Chat loaded");
        self.chat = messages.iter().map(|m| (m.id(), row(m))).collect();
    }

    fn append_message(&mut self, message: &Message) {
        info!(message_id = %message.id(), "{}", row(message));
        self.chat.push((message.id(), row(message)));
    }

    fn update_message(&mut self, message: &Message) {
        if let Some(entry) = self.chat.iter_mut().find(|(id, _)| *id == message.id()) {
            entry.1 = row(message);
        }
    }

    fn remove_messages(&mut self, message_ids: &[MessageId]) {
        self.chat.retain(|(id, _)| !message_ids.contains(id));
    }

    fn clear_chat(&mut self) {
        self.chat.clear();
    }

    fn set_chat_header(&mut self, title: &str) {
        self.header = title.to_string();
    }

    fn add_guild(&mut self, guild: &Guild) {
        Self::upsert_named(&mut self.guilds, guild.id(), guild.name().to_string());
    }

    fn update_guild(&mut self, guild: &Guild) {
        Self::upsert_named(&mut self.guilds, guild.id(), guild.name().to_string());
    }

    fn remove_guild(&mut self, guild_id: GuildId) {
        self.guilds.retain(|(id, _)| *id != guild_id);
        self.guild_indicators.remove(&guild_id);
    }

    fn set_guild_indicator(&mut self, guild_id: GuildId, indicator: GuildIndicator) {
        trace!(guild_id = %guild_id, ?indicator, "Guild indicator");
        self.guild_indicators.insert(guild_id, indicator);
    }

    fn set_channels(&mut self, guild_id: GuildId, channels: &[(Channel, ChannelIndicator)]) {
        debug!(guild_id = %guild_id, count = channels.len(), "Channel tree loaded");
        self.channels = channels
            .iter()
            .map(|(c, _)| (c.id(), c.name().to_string()))
            .collect();
        for (channel, indicator) in channels {
            self.channel_indicators.insert(channel.id(), *indicator);
        }
    }

    fn upsert_channel(&mut self, channel: &Channel) {
        Self::upsert_named(&mut self.channels, channel.id(), channel.name().to_string());
    }

    fn remove_channel(&mut self, channel_id: ChannelId) {
        self.channels.retain(|(id, _)| *id != channel_id);
    }

    fn clear_channels(&mut self) {
        self.channels.clear();
    }

    fn set_channel_indicator(&mut self, channel_id: ChannelId, indicator: ChannelIndicator) {
        self.channel_indicators.insert(channel_id, indicator);
    }

    fn upsert_private_channel(&mut self, channel: &Channel) {
        Self::upsert_named(&mut self.private, channel.id(), channel.header_title());
    }

    fn remove_private_channel(&mut self, channel_id: ChannelId) {
        self.private.retain(|(id, _)| *id != channel_id);
    }

    fn move_private_channel_to_top(&mut self, channel_id: ChannelId) {
        if let Some(index) = self.private.iter().position(|(id, _)| *id == channel_id) {
            let entry = self.private.remove(index);
            self.private.insert(0, entry);
        }
    }

    fn set_private_indicator(&mut self, channel_id: ChannelId, indicator: ChannelIndicator) {
        self.channel_indicators.insert(channel_id, indicator);
    }

    fn add_friend(&mut self, user: &User) {
        Self::upsert_named(&mut self.friends, user.id(), user.tag());
    }

    fn remove_friend(&mut self, user_id: UserId) {
        self.friends.retain(|(id, _)| *id != user_id);
    }

    fn set_members(&mut self, members: &[Member]) {
        self.members = members
            .iter()
            .map(|m| (m.user_id(), m.user.tag()))
            .collect();
    }

    fn upsert_members(&mut self, members: &[Member]) {
        for member in members {
            Self::upsert_named(&mut self.members, member.user_id(), member.user.tag());
        }
    }

    fn remove_member(&mut self, user_id: UserId) {
        self.members.retain(|(id, _)| *id != user_id);
    }

    fn clear_members(&mut self) {
        self.members.clear();
    }

    fn show_page(&mut self, page: Page) {
        self.page = Some(page);
    }

    fn show_error(&mut self, text: &str) {
        warn!(text, "Error dialog");
        self.errors.push(text.to_string());
    }

    fn show_send_failure(&mut self, failure: &SendFailure) {
        warn!(id = %failure.id, "{}", failure.dialog_text());
        self.errors.push(failure.dialog_text());
    }

    fn confirm_message_deletion(&mut self, channel_id: ChannelId, message_id: MessageId) {
        info!(channel_id = %channel_id, message_id = %message_id, "Delete this message?");
        self.deletion_prompt = Some((channel_id, message_id));
    }

    fn set_input_text(&mut self, text: &str) {
        self.input = text.to_string();
    }

    fn focus(&mut self, target: FocusTarget) {
        self.focus = Some(target);
    }

    fn redraw(&mut self) {
        self.redraws += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(id: u64, text: &str) -> Message {
        Message::new(id, 10_u64, User::new(2_u64, "bob", "0002"), text, Utc::now())
    }

    #[test]
    fn test_chat_model_follows_mutations() {
        let mut presenter = HeadlessPresenter::new();

        presenter.set_messages(ChannelId(10), &[message(1, "a"), message(2, "b")]);
        presenter.append_message(&message(3, "c"));
        presenter.update_message(&message(2, "edited"));
        presenter.remove_messages(&[MessageId(1)]);

        assert_eq!(
            presenter.chat(),
            &[
                (MessageId(2), "bob#0002: edited".to_string()),
                (MessageId(3), "bob#0002: c".to_string()),
            ]
        );
    }

    #[test]
    fn test_private_list_reorders() {
        let mut presenter = HeadlessPresenter::new();
        let bob = User::new(2_u64, "bob", "0002");
        let carol = User::new(3_u64, "carol", "0003");
        presenter.upsert_private_channel(
            &Channel::new(30_u64, "", crate::domain::entities::ChannelKind::Dm)
                .with_recipients(vec![bob]),
        );
        presenter.upsert_private_channel(
            &Channel::new(31_u64, "", crate::domain::entities::ChannelKind::Dm)
                .with_recipients(vec![carol]),
        );

        presenter.move_private_channel_to_top(ChannelId(31));

        assert_eq!(presenter.private_order(), vec![ChannelId(31), ChannelId(30)]);
        assert!(presenter.render().contains("carol"));
    }
}
