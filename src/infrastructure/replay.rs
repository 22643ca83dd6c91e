//! Scripted session driver.
//!
//! A script is JSON lines, one [`ReplayStep`] per line. Blank lines and lines
//! starting with `#` are skipped.

use std::io::BufRead;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::services::{
    MentionSuggester, MessageSender, NavigationService, SessionBootstrap, SubmitOutcome,
};
use crate::application::{EventPipeline, SyncContext};
use crate::domain::entities::{ChannelId, GuildId, Member, Message, MessageId};
use crate::domain::errors::SyncError;
use crate::domain::RemoteEvent;
use crate::domain::events::ReadySnapshot;
use crate::infrastructure::loopback_transport::LoopbackTransport;

/// One line of a replay script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplayStep {
    /// Starts the session from a snapshot.
    Ready(ReadySnapshot),
    /// Feeds a remote event into the pipeline.
    Event {
        /// The event.
        event: RemoteEvent,
    },
    /// Server-side history returned by later fetches.
    SeedHistory {
        /// Channel the history belongs to.
        channel_id: ChannelId,
        /// Messages in any order.
        messages: Vec<Message>,
    },
    /// Server-side roster returned by later member fetches.
    SeedMembers {
        /// Guild the roster belongs to.
        guild_id: GuildId,
        /// Members of the guild.
        members: Vec<Member>,
    },
    /// Opens a guild.
    SelectGuild {
        /// Guild to open.
        guild_id: GuildId,
    },
    /// Opens a channel.
    SelectChannel {
        /// Channel to open.
        channel_id: ChannelId,
    },
    /// Jumps back to the previously open channel.
    SwitchToPrevious,
    /// Replaces the input box content. With `accept`, the first mention
    /// suggestion is taken.
    Input {
        /// New input box content.
        text: String,
        /// Whether to take the first suggestion.
        #[serde(default)]
        accept: bool,
    },
    /// Submits `text`, or the input box content when absent.
    Send {
        /// Text to submit.
        #[serde(default)]
        text: Option<String>,
        /// Message being edited.
        #[serde(default)]
        editing: Option<MessageId>,
    },
    /// Answers the last deletion prompt.
    ConfirmDeletion {
        /// Whether the user agreed.
        confirmed: bool,
    },
    /// Makes every transport call fail, or succeed again.
    Offline {
        /// New connectivity.
        offline: bool,
    },
    /// Sends buffered read acknowledgements.
    FlushAcks,
}

/// Reasons a replay stops.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The script could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A line is not a valid step.
    #[error("line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The pipeline or UI loop stopped.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Parses a JSON-lines script.
///
/// # Errors
///
/// Returns `ReplayError::Parse` with the 1-based line of the first bad step.
pub fn parse_script(reader: impl BufRead) -> Result<Vec<ReplayStep>, ReplayError> {
    let mut steps = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let step = serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse {
            line: index + 1,
            source,
        })?;
        steps.push(step);
    }
    Ok(steps)
}

/// Runs steps against a live pipeline and loopback transport.
pub struct ReplayDriver {
    ctx: SyncContext,
    pipeline: EventPipeline,
    transport: Arc<LoopbackTransport>,
    echo: mpsc::UnboundedReceiver<RemoteEvent>,
    navigation: NavigationService,
    sender: MessageSender,
    bootstrap: SessionBootstrap,
    suggester: MentionSuggester,
    input: String,
    deletion_prompt: Option<(ChannelId, MessageId)>,
}

impl ReplayDriver {
    /// `echo` must be the receiver paired with the transport's echo sender.
    #[must_use]
    pub fn new(
        ctx: SyncContext,
        pipeline: EventPipeline,
        transport: Arc<LoopbackTransport>,
        echo: mpsc::UnboundedReceiver<RemoteEvent>,
    ) -> Self {
        Self {
            navigation: NavigationService::new(ctx.clone()),
            sender: MessageSender::new(ctx.clone()),
            bootstrap: SessionBootstrap::new(ctx.clone()),
            ctx,
            pipeline,
            transport,
            echo,
            suggester: MentionSuggester::new(),
            input: String::new(),
            deletion_prompt: None,
        }
    }

    /// Text the script has typed so far.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Runs every step in order.
    ///
    /// User-facing failures are shown and logged; only a stopped pipeline or
    /// UI aborts the run.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::Sync` if the pipeline or UI loop has stopped.
    pub async fn run(&mut self, steps: Vec<ReplayStep>) -> Result<(), ReplayError> {
        let total = steps.len();
        for (index, step) in steps.into_iter().enumerate() {
            debug!(step = index + 1, total, ?step, "Replaying");
            self.apply(step).await?;
            self.forward_echo().await?;
        }
        info!(steps = total, "Replay finished");
        Ok(())
    }

    /// Drains the pipeline and returns the context for shutdown work.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::Sync` if a worker stopped before the last echo.
    pub async fn finish(mut self) -> Result<SyncContext, ReplayError> {
        self.forward_echo().await?;
        self.pipeline.shutdown().await;
        Ok(self.ctx)
    }

    async fn apply(&mut self, step: ReplayStep) -> Result<(), ReplayError> {
        match step {
            ReplayStep::Ready(ready) => {
                self.transport.set_local_user(ready.user.clone());
                self.bootstrap.apply(ready).await?;
            }
            ReplayStep::Event { event } => self.pipeline.handle_remote_event(event).await?,
            ReplayStep::SeedHistory {
                channel_id,
                messages,
            } => self.transport.seed_history(channel_id, messages),
            ReplayStep::SeedMembers { guild_id, members } => {
                self.transport.seed_members(guild_id, members);
            }
            ReplayStep::SelectGuild { guild_id } => {
                if let Err(e) = self.navigation.select_guild(guild_id).await {
                    self.report(e.to_string()).await?;
                }
            }
            ReplayStep::SelectChannel { channel_id } => {
                if let Err(e) = self.navigation.select_channel(channel_id).await {
                    self.report(e.to_string()).await?;
                }
            }
            ReplayStep::SwitchToPrevious => {
                // Failures are already shown by the service.
                if let Err(e) = self.navigation.switch_to_previous().await {
                    warn!(error = %e, "Switch to previous failed");
                }
            }
            ReplayStep::Input { text, accept } => self.type_input(text, accept).await?,
            ReplayStep::Send { text, editing } => {
                let raw = text.unwrap_or_else(|| std::mem::take(&mut self.input));
                self.send(&raw, editing).await;
            }
            ReplayStep::ConfirmDeletion { confirmed } => match self.deletion_prompt.take() {
                Some((channel_id, message_id)) => {
                    self.sender
                        .resolve_deletion(channel_id, message_id, confirmed)
                        .await;
                }
                None => warn!("No deletion is waiting for an answer"),
            },
            ReplayStep::Offline { offline } => self.transport.set_offline(offline),
            ReplayStep::FlushAcks => {
                let sent = self.ctx.read_state.flush_pending().await;
                debug!(sent, "Flushed read acknowledgements");
            }
        }
        Ok(())
    }

    async fn type_input(&mut self, text: String, accept: bool) -> Result<(), SyncError> {
        self.ctx.activity.record_input();
        let mut text = text;
        let channel = self
            .ctx
            .current_selection()
            .and_then(|selection| self.ctx.cache.channel(selection.channel));

        if let Some(channel) = channel
            && self.suggester.process_input(&text, text.len())
        {
            let names = self
                .suggester
                .suggest(&channel, &self.ctx.cache)
                .iter()
                .map(|c| c.display.clone())
                .collect::<Vec<_>>();
            info!(query = %self.suggester.state().query, ?names, "Mention suggestions");

            if accept
                && let Some(candidate) = self.suggester.state().selected().cloned()
                && let Some((updated, _)) = self.suggester.apply_selection(&text, &candidate)
            {
                text = updated;
            }
        }

        self.input.clone_from(&text);
        self.ctx
            .ui
            .enqueue_and_wait(move |ui| ui.set_input_text(&text))
            .await
    }

    async fn send(&mut self, raw: &str, editing: Option<MessageId>) {
        match self.sender.submit(raw, editing).await {
            Ok(SubmitOutcome::Dispatched(task)) => {
                if let Err(e) = task.await {
                    warn!(error = %e, "Send task ended abnormally");
                }
            }
            Ok(SubmitOutcome::DeleteRequested {
                channel_id,
                message_id,
            }) => self.deletion_prompt = Some((channel_id, message_id)),
            Ok(SubmitOutcome::Cleared) => {}
            Ok(SubmitOutcome::NoChannel) => warn!("Nothing to send to, no channel is open"),
            Err(e) => {
                self.input = raw.to_string();
                warn!(error = %e, "Message rejected");
            }
        }
    }

    async fn report(&self, text: String) -> Result<(), SyncError> {
        warn!(%text, "Step failed");
        self.ctx
            .ui
            .enqueue_and_wait(move |ui| ui.show_error(&text))
            .await
    }

    async fn forward_echo(&mut self) -> Result<(), SyncError> {
        while let Ok(event) = self.echo.try_recv() {
            self.pipeline.handle_remote_event(event).await?;
        }
        Ok(())
    }
}
