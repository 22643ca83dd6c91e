//! Typed event bus: one bounded queue and one serial worker per event family.
//!
//! Events of the same family are handled in arrival order. Families run
//! independently, so the cache merge rules carry cross-family convergence.

mod ack_worker;
mod message_worker;
mod structural_worker;

pub use ack_worker::handle_read_ack;
pub use message_worker::{handle_message_create, handle_message_delete, handle_message_update};
pub use structural_worker::handle_structural;

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::context::SyncContext;
use crate::domain::entities::{Message, MessageEdit};
use crate::domain::errors::SyncError;
use crate::domain::events::{EventFamily, MessageDeletion, ReadAck, RemoteEvent, StructuralEvent};

/// Queue capacity per event family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueCapacities {
    /// Messages waiting to be merged.
    pub message_create: usize,
    /// Edits waiting to be merged.
    pub message_update: usize,
    /// Deletions waiting to be applied.
    pub message_delete: usize,
    /// Structural events waiting to be applied.
    pub structural: usize,
    /// Read acknowledgements from other sessions.
    pub read_ack: usize,
}

impl Default for QueueCapacities {
    fn default() -> Self {
        Self {
            message_create: 200,
            message_update: 50,
            message_delete: 50,
            structural: 3,
            read_ack: 50,
        }
    }
}

/// Running pipeline. Dropping it without [`EventPipeline::shutdown`] detaches the workers.
pub struct EventPipeline {
    creates: mpsc::Sender<Message>,
    updates: mpsc::Sender<MessageEdit>,
    deletes: mpsc::Sender<MessageDeletion>,
    structural: mpsc::Sender<StructuralEvent>,
    acks: mpsc::Sender<ReadAck>,
    workers: Vec<JoinHandle<()>>,
}

impl EventPipeline {
    /// Spawns one worker per family.
    #[must_use]
    pub fn start(ctx: &SyncContext, capacities: QueueCapacities) -> Self {
        let (creates, create_rx) = mpsc::channel(capacities.message_create.max(1));
        let (updates, update_rx) = mpsc::channel(capacities.message_update.max(1));
        let (deletes, delete_rx) = mpsc::channel(capacities.message_delete.max(1));
        let (structural, structural_rx) = mpsc::channel(capacities.structural.max(1));
        let (acks, ack_rx) = mpsc::channel(capacities.read_ack.max(1));

        let workers = vec![
            spawn_worker(ctx, EventFamily::MessageCreate, create_rx, handle_message_create),
            spawn_worker(ctx, EventFamily::MessageUpdate, update_rx, handle_message_update),
            spawn_worker(ctx, EventFamily::MessageDelete, delete_rx, handle_message_delete),
            spawn_worker(ctx, EventFamily::Structural, structural_rx, handle_structural),
            spawn_worker(ctx, EventFamily::ReadAck, ack_rx, handle_read_ack),
        ];

        info!(?capacities, "Event pipeline started");
        Self {
            creates,
            updates,
            deletes,
            structural,
            acks,
            workers,
        }
    }

    /// Routes an event into its family's queue.
    ///
    /// Waits for queue space, except for read acknowledgements, which are
    /// dropped when their queue is full since a later one supersedes them.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::QueueClosed` if the family's worker has stopped.
    pub async fn handle_remote_event(&self, event: RemoteEvent) -> Result<(), SyncError> {
        let family = event.family();
        let closed = || SyncError::QueueClosed {
            family: family.name(),
        };

        match event {
            RemoteEvent::MessageCreate(message) => {
                self.creates.send(message).await.map_err(|_| closed())
            }
            RemoteEvent::MessageUpdate(edit) => self.updates.send(edit).await.map_err(|_| closed()),
            RemoteEvent::MessageDelete(deletion) => {
                self.deletes.send(deletion).await.map_err(|_| closed())
            }
            RemoteEvent::Structural(event) => {
                self.structural.send(event).await.map_err(|_| closed())
            }
            RemoteEvent::ReadAck(ack) => match self.acks.try_send(ack) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(ack)) => {
                    warn!(channel_id = %ack.channel_id, "Read acknowledgement queue full, dropping");
                    Ok(())
                }
                Err(TrySendError::Closed(_)) => Err(closed()),
            },
        }
    }

    /// Closes every queue and waits for the workers to drain them.
    pub async fn shutdown(self) {
        let Self {
            creates,
            updates,
            deletes,
            structural,
            acks,
            workers,
        } = self;
        drop((creates, updates, deletes, structural, acks));

        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "Pipeline worker ended abnormally");
            }
        }
        info!("Event pipeline stopped");
    }
}

fn spawn_worker<T, F, Fut>(
    ctx: &SyncContext,
    family: EventFamily,
    mut queue: mpsc::Receiver<T>,
    handler: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Fn(SyncContext, T) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), SyncError>> + Send,
{
    let ctx = ctx.clone();
    tokio::spawn(async move {
        while let Some(event) = queue.recv().await {
            match handler(ctx.clone(), event).await {
                Ok(()) => {}
                Err(e) if e.is_cache_miss() => {
                    debug!(family = family.name(), error = %e, "Event dropped on cache miss");
                }
                Err(SyncError::UiClosed) => {
                    warn!(family = family.name(), "UI stopped, worker exiting");
                    break;
                }
                Err(e) => warn!(family = family.name(), error = %e, "Event handling failed"),
            }
        }
        debug!(family = family.name(), "Worker stopped");
    })
}
