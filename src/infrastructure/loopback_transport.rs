//! In-process transport that acts as its own server.
//!
//! Sent, edited and deleted messages are echoed back as remote events so a
//! headless session sees the same traffic a connected client would.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::domain::RemoteEvent;
use crate::domain::entities::{
    ChannelId, GuildId, Member, Message, MessageEdit, MessageId, Relationship, User, UserId,
};
use crate::domain::errors::TransportError;
use crate::domain::events::MessageDeletion;
use crate::domain::ports::{EditMessageRequest, SendMessageRequest, TransportPort};

const FIRST_ID: u64 = 1_000_000;

struct LoopbackState {
    local_user: User,
    next_id: u64,
    history: HashMap<ChannelId, Vec<Message>>,
    members: HashMap<GuildId, Vec<Member>>,
    relationships: Vec<Relationship>,
    acknowledged: Vec<(ChannelId, MessageId)>,
    offline: bool,
}

/// Transport that serves seeded data and echoes writes back as remote events.
pub struct LoopbackTransport {
    state: Mutex<LoopbackState>,
    echo: Option<mpsc::UnboundedSender<RemoteEvent>>,
}

impl LoopbackTransport {
    /// Creates an online transport acting as `local_user`.
    #[must_use]
    pub fn new(local_user: User) -> Self {
        Self {
            state: Mutex::new(LoopbackState {
                local_user,
                next_id: FIRST_ID,
                history: HashMap::new(),
                members: HashMap::new(),
                relationships: Vec::new(),
                acknowledged: Vec::new(),
                offline: false,
            }),
            echo: None,
        }
    }

    /// Echoes every accepted change into `sender`.
    #[must_use]
    pub fn with_echo(mut self, sender: mpsc::UnboundedSender<RemoteEvent>) -> Self {
        self.echo = Some(sender);
        self
    }

    /// Replaces the user that authors echoed messages.
    pub fn set_local_user(&self, user: User) {
        self.state.lock().local_user = user;
    }

    /// Sets the history served by `fetch_messages`, sorted oldest first.
    pub fn seed_history(&self, channel_id: ChannelId, mut messages: Vec<Message>) {
        messages.sort_by_key(Message::ordering_key);
        self.state.lock().history.insert(channel_id, messages);
    }

    /// Sets the roster served by `fetch_members`.
    pub fn seed_members(&self, guild_id: GuildId, members: Vec<Member>) {
        self.state.lock().members.insert(guild_id, members);
    }

    /// Sets the list served by `fetch_relationships`.
    pub fn seed_relationships(&self, relationships: Vec<Relationship>) {
        self.state.lock().relationships = relationships;
    }

    /// While offline every call fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Acknowledgements received so far.
    #[must_use]
    pub fn acknowledged(&self) -> Vec<(ChannelId, MessageId)> {
        self.state.lock().acknowledged.clone()
    }

    fn check_online(&self) -> Result<(), TransportError> {
        if self.state.lock().offline {
            return Err(TransportError::network("loopback transport is offline"));
        }
        Ok(())
    }

    fn emit(&self, event: RemoteEvent) {
        if let Some(echo) = &self.echo
            && echo.send(event).is_err()
        {
            trace!("Echo receiver dropped");
        }
    }
}

#[async_trait]
impl TransportPort for LoopbackTransport {
    async fn send_message(&self, request: SendMessageRequest) -> Result<Message, TransportError> {
        self.check_online()?;
        let message = {
            let mut state = self.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            let message = Message::new(
                id,
                request.channel_id,
                state.local_user.clone(),
                request.content,
                Utc::now(),
            );
            state
                .history
                .entry(request.channel_id)
                .or_default()
                .push(message.clone());
            message
        };
        debug!(channel_id = %request.channel_id, message_id = %message.id(), "Loopback send");
        self.emit(RemoteEvent::MessageCreate(message.clone()));
        Ok(message)
    }

    async fn edit_message(&self, request: EditMessageRequest) -> Result<Message, TransportError> {
        self.check_online()?;
        let edit = MessageEdit::content(request.message_id, request.channel_id, request.content);
        let message = {
            let mut state = self.state.lock();
            let message = state
                .history
                .get_mut(&request.channel_id)
                .and_then(|list| list.iter_mut().find(|m| m.id() == request.message_id))
                .ok_or_else(|| TransportError::not_found("message"))?;
            message.apply_edit(&edit);
            message.clone()
        };
        self.emit(RemoteEvent::MessageUpdate(edit));
        Ok(message)
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.check_online()?;
        {
            let mut state = self.state.lock();
            let list = state
                .history
                .get_mut(&channel_id)
                .ok_or_else(|| TransportError::not_found("message"))?;
            let before = list.len();
            list.retain(|m| m.id() != message_id);
            if list.len() == before {
                return Err(TransportError::not_found("message"));
            }
        }
        self.emit(RemoteEvent::MessageDelete(MessageDeletion::Single {
            channel_id,
            message_id,
        }));
        Ok(())
    }

    async fn fetch_messages(
        &self,
        channel_id: ChannelId,
        limit: u8,
    ) -> Result<Vec<Message>, TransportError> {
        self.check_online()?;
        let state = self.state.lock();
        let history = state.history.get(&channel_id).map_or(&[][..], Vec::as_slice);
        let skip = history.len().saturating_sub(usize::from(limit));
        Ok(history[skip..].to_vec())
    }

    async fn fetch_members(&self, guild_id: GuildId) -> Result<Vec<Member>, TransportError> {
        self.check_online()?;
        Ok(self
            .state
            .lock()
            .members
            .get(&guild_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Member, TransportError> {
        self.check_online()?;
        self.state
            .lock()
            .members
            .get(&guild_id)
            .and_then(|members| members.iter().find(|m| m.user_id() == user_id).cloned())
            .ok_or_else(|| TransportError::not_found("member"))
    }

    async fn fetch_relationships(&self) -> Result<Vec<Relationship>, TransportError> {
        self.check_online()?;
        Ok(self.state.lock().relationships.clone())
    }

    async fn acknowledge_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.check_online()?;
        self.state.lock().acknowledged.push((channel_id, message_id));
        Ok(())
    }
}
