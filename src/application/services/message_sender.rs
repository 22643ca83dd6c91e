//! Outgoing messages: submit, dispatch and failure recovery.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::context::SyncContext;
use crate::domain::entities::{ChannelId, MessageId};
use crate::domain::errors::{ComposeError, SyncError, TransportError};
use crate::domain::ports::{EditMessageRequest, SendFailure, SendMessageRequest};

/// A prepared message on its way to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Destination channel.
    pub channel_id: ChannelId,
    /// Message being edited, if any.
    pub editing: Option<MessageId>,
    /// Wire form.
    pub content: String,
    /// Text as the user typed it.
    pub raw: String,
}

/// What [`MessageSender::submit`] did with the input.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Send or edit is running on the returned task.
    Dispatched(JoinHandle<()>),
    /// The input of an edit was emptied. The user is asked to confirm the
    /// deletion and answers through [`MessageSender::resolve_deletion`].
    DeleteRequested {
        /// Channel of the message.
        channel_id: ChannelId,
        /// Message to delete.
        message_id: MessageId,
    },
    /// Blank input was discarded.
    Cleared,
    /// No channel is open.
    NoChannel,
}

/// User's answer to a send failure dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureChoice {
    /// Send the same request again.
    Retry,
    /// Put the typed text back into the input box.
    Edit,
    /// Drop the message.
    Cancel,
}

/// Sends, edits and deletes messages on behalf of the input box.
#[derive(Clone)]
pub struct MessageSender {
    ctx: SyncContext,
    failures: Arc<Mutex<HashMap<Uuid, OutgoingMessage>>>,
}

impl MessageSender {
    /// Creates a sender with no pending failures.
    #[must_use]
    pub fn new(ctx: SyncContext) -> Self {
        Self {
            ctx,
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Handles the content of the input box for the open channel.
    ///
    /// # Errors
    ///
    /// Returns the `ComposeError` that kept the text from being sent. The
    /// error is also shown and the typed text is put back in the input.
    pub async fn submit(
        &self,
        raw: &str,
        editing: Option<MessageId>,
    ) -> Result<SubmitOutcome, ComposeError> {
        self.ctx.activity.record_input();
        let Some(channel) = self
            .ctx
            .current_selection()
            .and_then(|selection| self.ctx.cache.channel(selection.channel))
        else {
            return Ok(SubmitOutcome::NoChannel);
        };

        if let (true, Some(message_id)) = (raw.is_empty(), editing) {
            let channel_id = channel.id();
            if let Err(e) = self
                .ctx
                .ui
                .enqueue_and_wait(move |ui| ui.confirm_message_deletion(channel_id, message_id))
                .await
            {
                debug!(error = %e, "Deletion prompt not shown");
            }
            return Ok(SubmitOutcome::DeleteRequested {
                channel_id,
                message_id,
            });
        }

        if raw.trim().is_empty() {
            self.set_input(String::new()).await;
            return Ok(SubmitOutcome::Cleared);
        }

        let content = match self.ctx.composer.prepare(&channel, raw).await {
            Ok(content) => content,
            Err(e) => {
                self.show_error(e.to_string()).await;
                self.set_input(raw.to_string()).await;
                return Err(e);
            }
        };

        self.set_input(String::new()).await;
        let outgoing = OutgoingMessage {
            channel_id: channel.id(),
            editing,
            content,
            raw: raw.to_string(),
        };
        let sender = self.clone();
        Ok(SubmitOutcome::Dispatched(tokio::spawn(async move {
            sender.dispatch(outgoing).await;
        })))
    }

    /// Sends or edits a prepared message. A failure is parked and offered to
    /// the user as a Retry sending / Edit / Cancel dialog.
    pub async fn dispatch(&self, outgoing: OutgoingMessage) {
        let result = match outgoing.editing {
            Some(message_id) => self
                .ctx
                .transport
                .edit_message(EditMessageRequest::new(
                    outgoing.channel_id,
                    message_id,
                    outgoing.content.clone(),
                ))
                .await
                .map(|_| ()),
            None => self
                .ctx
                .transport
                .send_message(SendMessageRequest::new(
                    outgoing.channel_id,
                    outgoing.content.clone(),
                ))
                .await
                .map(|_| ()),
        };

        let Err(e) = result else {
            debug!(channel_id = %outgoing.channel_id, "Message delivered");
            return;
        };

        warn!(channel_id = %outgoing.channel_id, error = %e, "Message delivery failed");
        let failure = SendFailure {
            id: Uuid::new_v4(),
            is_edit: outgoing.editing.is_some(),
            reason: e.to_string(),
        };
        self.failures.lock().insert(failure.id, outgoing);
        if self
            .ctx
            .ui
            .enqueue(move |ui| ui.show_send_failure(&failure))
            .is_err()
        {
            debug!("UI closed before send failure could be shown");
        }
    }

    /// Applies the user's answer to a failure dialog. Unknown ids are ignored.
    ///
    /// A retry runs on the caller's task.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::UiClosed` if the text cannot be restored for editing.
    pub async fn resolve_failure(&self, id: Uuid, choice: FailureChoice) -> Result<(), SyncError> {
        let Some(outgoing) = self.failures.lock().remove(&id) else {
            debug!(%id, "Unknown send failure");
            return Ok(());
        };
        info!(%id, ?choice, "Send failure resolved");

        match choice {
            FailureChoice::Retry => {
                self.dispatch(outgoing).await;
                Ok(())
            }
            FailureChoice::Edit => {
                self.ctx
                    .ui
                    .enqueue_and_wait(move |ui| ui.set_input_text(&outgoing.raw))
                    .await
            }
            FailureChoice::Cancel => Ok(()),
        }
    }

    /// Applies the user's answer to a deletion prompt. A confirmed deletion
    /// runs on the caller's task and a failure is shown as an error dialog.
    pub async fn resolve_deletion(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        confirmed: bool,
    ) {
        if !confirmed {
            debug!(message_id = %message_id, "Deletion declined");
            return;
        }
        if let Err(e) = self.delete(channel_id, message_id).await {
            warn!(message_id = %message_id, error = %e, "Message deletion failed");
            self.show_error(format!("Error deleting message: {e}")).await;
        }
    }

    /// Deletes a message remotely. The delete event removes it locally.
    ///
    /// # Errors
    ///
    /// Returns the transport error.
    pub async fn delete(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.ctx
            .transport
            .delete_message(channel_id, message_id)
            .await
    }

    /// Number of failures waiting for the user's answer.
    #[must_use]
    pub fn pending_failures(&self) -> usize {
        self.failures.lock().len()
    }

    async fn set_input(&self, text: String) {
        if let Err(e) = self
            .ctx
            .ui
            .enqueue_and_wait(move |ui| ui.set_input_text(&text))
            .await
        {
            debug!(error = %e, "Input not updated");
        }
    }

    async fn show_error(&self, text: String) {
        if let Err(e) = self
            .ctx
            .ui
            .enqueue_and_wait(move |ui| ui.show_error(&text))
            .await
        {
            debug!(error = %e, "Error not shown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::harness::*;
    use crate::domain::Selection;
    use crate::domain::entities::Message;
    use crate::domain::ports::MockTransportPort;
    use crate::domain::ports::mocks::UiCall;
    use chrono::Utc;
    use mockall::Sequence;
    use mockall::predicate::eq;

    fn open_random(h: &Harness) -> MessageSender {
        h.ctx
            .navigation
            .lock()
            .select_channel(Selection::new(RANDOM.into(), Some(GUILD.into())));
        MessageSender::new(h.ctx.clone())
    }

    fn echo(request: &SendMessageRequest) -> Message {
        Message::new(9_u64, request.channel_id, me(), request.content.clone(), Utc::now())
    }

    fn last_failure(h: &Harness) -> SendFailure {
        match h.presenter.calls().last() {
            Some(UiCall::SendFailure(failure)) => failure.clone(),
            other => panic!("expected a send failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_submit_sends_and_clears_input() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_send_message()
            .with(eq(SendMessageRequest::new(RANDOM.into(), "hello")))
            .times(1)
            .returning(|request| Ok(echo(&request)));
        let h = harness(transport);
        let sender = open_random(&h);

        match sender.submit("hello", None).await.unwrap() {
            SubmitOutcome::Dispatched(task) => task.await.unwrap(),
            other => panic!("unexpected outcome {other:?}"),
        }

        assert_eq!(h.presenter.calls(), vec![UiCall::InputText(String::new())]);
        assert_eq!(sender.pending_failures(), 0);
    }

    #[tokio::test]
    async fn test_submit_edit_uses_edit_request() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_edit_message()
            .with(eq(EditMessageRequest::new(
                RANDOM.into(),
                MessageId(8),
                "fixed",
            )))
            .times(1)
            .returning(|request| {
                Ok(Message::new(
                    request.message_id,
                    request.channel_id,
                    me(),
                    request.content,
                    Utc::now(),
                ))
            });
        let h = harness(transport);
        let sender = open_random(&h);

        match sender.submit("fixed", Some(MessageId(8))).await.unwrap() {
            SubmitOutcome::Dispatched(task) => task.await.unwrap(),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_input_is_cleared() {
        let h = harness(MockTransportPort::new());
        let sender = open_random(&h);

        let outcome = sender.submit("   \n", None).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Cleared));
        assert_eq!(h.presenter.calls(), vec![UiCall::InputText(String::new())]);
    }

    #[tokio::test]
    async fn test_empty_edit_asks_before_deleting() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_delete_message()
            .with(eq(ChannelId(RANDOM)), eq(MessageId(8)))
            .times(1)
            .returning(|_, _| Ok(()));
        let h = harness(transport);
        let sender = open_random(&h);

        let outcome = sender.submit("", Some(MessageId(8))).await.unwrap();
        let SubmitOutcome::DeleteRequested {
            channel_id,
            message_id,
        } = outcome
        else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(
            h.presenter.calls(),
            vec![UiCall::ConfirmDeletion(ChannelId(RANDOM), MessageId(8))]
        );

        sender.resolve_deletion(channel_id, message_id, true).await;
    }

    #[tokio::test]
    async fn test_declined_deletion_keeps_message() {
        let mut transport = MockTransportPort::new();
        transport.expect_delete_message().never();
        let h = harness(transport);
        let sender = open_random(&h);

        sender
            .resolve_deletion(ChannelId(RANDOM), MessageId(8), false)
            .await;

        assert!(h.presenter.calls().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_edit_only_clears_input() {
        let mut transport = MockTransportPort::new();
        transport.expect_delete_message().never();
        transport.expect_edit_message().never();
        let h = harness(transport);
        let sender = open_random(&h);

        let outcome = sender.submit("   ", Some(MessageId(8))).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Cleared));
        assert_eq!(h.presenter.calls(), vec![UiCall::InputText(String::new())]);
    }

    #[tokio::test]
    async fn test_failed_deletion_is_shown() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_delete_message()
            .returning(|_, _| Err(TransportError::rejected("missing access")));
        let h = harness(transport);
        let sender = open_random(&h);

        sender
            .resolve_deletion(ChannelId(RANDOM), MessageId(8), true)
            .await;

        assert!(matches!(
            h.presenter.calls().last(),
            Some(UiCall::Error(text)) if text.starts_with("Error deleting message:")
        ));
    }

    #[tokio::test]
    async fn test_oversized_message_restores_input() {
        let h = harness(MockTransportPort::new());
        let sender = open_random(&h);
        let raw = "a".repeat(2001);

        let err = sender.submit(&raw, None).await.unwrap_err();

        assert_eq!(
            err,
            ComposeError::MessageTooLong {
                length: 2001,
                limit: 2000
            }
        );
        assert_eq!(
            h.presenter.calls(),
            vec![
                UiCall::Error("Messages must be 2000 characters or less to send".to_string()),
                UiCall::InputText(raw),
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_without_open_channel() {
        let h = harness(MockTransportPort::new());
        let sender = MessageSender::new(h.ctx.clone());

        let outcome = sender.submit("hello", None).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::NoChannel));
    }

    #[tokio::test]
    async fn test_failed_send_can_be_retried() {
        let mut transport = MockTransportPort::new();
        let mut seq = Sequence::new();
        transport
            .expect_send_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(TransportError::network("connection reset")));
        transport
            .expect_send_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| Ok(echo(&request)));
        let h = harness(transport);
        let sender = open_random(&h);

        match sender.submit("hello", None).await.unwrap() {
            SubmitOutcome::Dispatched(task) => task.await.unwrap(),
            other => panic!("unexpected outcome {other:?}"),
        }
        h.settle().await;

        let failure = last_failure(&h);
        assert!(!failure.is_edit);
        assert_eq!(failure.reason, "network error: connection reset");
        assert_eq!(sender.pending_failures(), 1);

        sender
            .resolve_failure(failure.id, FailureChoice::Retry)
            .await
            .unwrap();
        assert_eq!(sender.pending_failures(), 0);
    }

    #[tokio::test]
    async fn test_failed_send_edit_choice_restores_text() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_send_message()
            .returning(|_| Err(TransportError::rejected("forbidden")));
        let h = harness(transport);
        let sender = open_random(&h);

        sender
            .dispatch(OutgoingMessage {
                channel_id: RANDOM.into(),
                editing: None,
                content: "<@2> hi".to_string(),
                raw: "@bob#0002 hi".to_string(),
            })
            .await;
        h.settle().await;
        let failure = last_failure(&h);

        sender
            .resolve_failure(failure.id, FailureChoice::Edit)
            .await
            .unwrap();
        sender
            .resolve_failure(failure.id, FailureChoice::Cancel)
            .await
            .unwrap();

        assert_eq!(
            h.presenter.calls().last(),
            Some(&UiCall::InputText("@bob#0002 hi".to_string()))
        );
        assert_eq!(sender.pending_failures(), 0);
    }
}
