//! Local read markers and their remote acknowledgement.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::entities::{Channel, ChannelId, GuildId, MessageId, MuteConfig, ReadState};
use crate::domain::errors::{PersistenceError, TransportError};
use crate::domain::ports::{ReadStateStore, TransportPort};

struct TrackerState {
    markers: RwLock<HashMap<ChannelId, MessageId>>,
    mutes: RwLock<MuteConfig>,
    /// Newest locally read message per channel not yet acknowledged remotely.
    pending: Mutex<HashMap<ChannelId, MessageId>>,
    transport: Arc<dyn TransportPort>,
    store: Arc<dyn ReadStateStore>,
}

/// Tracks the last read message per channel.
///
/// Local updates never move a marker backwards.
#[derive(Clone)]
pub struct ReadStateTracker {
    inner: Arc<TrackerState>,
}

impl ReadStateTracker {
    /// Creates a tracker with no markers.
    #[must_use]
    pub fn new(transport: Arc<dyn TransportPort>, store: Arc<dyn ReadStateStore>) -> Self {
        Self {
            inner: Arc::new(TrackerState {
                markers: RwLock::new(HashMap::new()),
                mutes: RwLock::new(MuteConfig::default()),
                pending: Mutex::new(HashMap::new()),
                transport,
                store,
            }),
        }
    }

    /// Restores persisted markers and the mute configuration.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the store cannot be read.
    pub fn load(&self) -> Result<(), PersistenceError> {
        let states = self.inner.store.load_read_state()?;
        let mutes = self.inner.store.load_mute_config()?;
        let restored = states.len();
        self.seed(&states);
        *self.inner.mutes.write() = mutes;
        info!(markers = restored, "Read state restored");
        Ok(())
    }

    /// Writes all markers to the store.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the store cannot be written.
    pub fn persist(&self) -> Result<(), PersistenceError> {
        let mut states: Vec<ReadState> = self
            .inner
            .markers
            .read()
            .iter()
            .map(|(channel, message)| ReadState::new(*channel, *message))
            .collect();
        states.sort_by_key(|s| s.channel_id);
        self.inner.store.save_read_state(&states)?;
        debug!(markers = states.len(), "Read state persisted");
        Ok(())
    }

    /// Merges markers from a session snapshot, keeping the newer of each pair.
    pub fn seed(&self, states: &[ReadState]) {
        for state in states {
            self.mark_read(state.channel_id, state.last_read_message_id);
        }
    }

    /// Replaces the mute settings.
    pub fn set_mute_config(&self, mutes: MuteConfig) {
        *self.inner.mutes.write() = mutes;
    }

    /// Last read message of a channel.
    #[must_use]
    pub fn marker(&self, channel_id: ChannelId) -> Option<MessageId> {
        self.inner.markers.read().get(&channel_id).copied()
    }

    /// Moves the marker to `message_id` if that is newer. Returns true if it moved.
    pub fn mark_read(&self, channel_id: ChannelId, message_id: MessageId) -> bool {
        let mut markers = self.inner.markers.write();
        match markers.get(&channel_id) {
            Some(current) if *current >= message_id => false,
            _ => {
                markers.insert(channel_id, message_id);
                true
            }
        }
    }

    /// Marks read locally and queues a coalesced remote acknowledgement.
    pub fn update_read_buffered(&self, channel_id: ChannelId, message_id: MessageId) {
        self.mark_read(channel_id, message_id);
        let mut pending = self.inner.pending.lock();
        let entry = pending.entry(channel_id).or_insert(message_id);
        if message_id > *entry {
            *entry = message_id;
        }
    }

    /// Marks read locally and acknowledges remotely right away.
    ///
    /// # Errors
    ///
    /// Returns the transport error of the acknowledgement.
    pub async fn update_read(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        self.mark_read(channel_id, message_id);
        {
            let mut pending = self.inner.pending.lock();
            if pending.get(&channel_id).is_some_and(|p| *p <= message_id) {
                pending.remove(&channel_id);
            }
        }
        self.inner
            .transport
            .acknowledge_message(channel_id, message_id)
            .await
    }

    /// Sends every buffered acknowledgement. Returns how many succeeded.
    ///
    /// Failed acknowledgements are requeued unless a newer one arrived meanwhile.
    pub async fn flush_pending(&self) -> usize {
        let batch: Vec<(ChannelId, MessageId)> = self.inner.pending.lock().drain().collect();
        let mut sent = 0;

        for (channel_id, message_id) in batch {
            match self
                .inner
                .transport
                .acknowledge_message(channel_id, message_id)
                .await
            {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!(channel_id = %channel_id, error = %e, "Read acknowledgement failed");
                    self.inner
                        .pending
                        .lock()
                        .entry(channel_id)
                        .or_insert(message_id);
                }
            }
        }

        if sent > 0 {
            debug!(count = sent, "Flushed read acknowledgements");
        }
        sent
    }

    /// Flushes buffered acknowledgements every `period` until `shutdown`
    /// turns true, then flushes once more.
    pub async fn run_flush_loop(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush_pending().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.flush_pending().await;
        debug!("Read acknowledgement loop stopped");
    }

    /// Applies an acknowledgement made by another session.
    ///
    /// Only moves the marker forward. Returns true if the ack was accepted.
    pub fn apply_remote_ack(&self, channel_id: ChannelId, message_id: MessageId) -> bool {
        {
            let mut markers = self.inner.markers.write();
            if markers.get(&channel_id).is_some_and(|current| *current > message_id) {
                debug!(channel_id = %channel_id, "Stale remote acknowledgement ignored");
                return false;
            }
            markers.insert(channel_id, message_id);
        }

        let mut pending = self.inner.pending.lock();
        if pending.get(&channel_id).is_some_and(|p| *p <= message_id) {
            pending.remove(&channel_id);
        }
        true
    }

    /// A channel is read when its last message is not newer than the marker.
    #[must_use]
    pub fn is_read(&self, channel: &Channel) -> bool {
        let Some(last) = channel.last_message_id() else {
            return true;
        };
        self.marker(channel.id()).is_some_and(|marker| marker >= last)
    }

    /// Whether the channel or its guild is muted.
    #[must_use]
    pub fn is_muted(&self, channel: &Channel) -> bool {
        self.inner.mutes.read().is_channel_muted(channel)
    }

    /// Whether `@everyone` mentions in the guild are ignored.
    #[must_use]
    pub fn suppresses_everyone(&self, guild_id: GuildId) -> bool {
        self.inner.mutes.read().suppresses_everyone(guild_id)
    }

    /// True when every unmuted text channel among `channels` is read.
    #[must_use]
    pub fn has_guild_been_read(&self, channels: &[Channel]) -> bool {
        channels
            .iter()
            .filter(|c| c.kind().is_guild_text() && !self.is_muted(c))
            .all(|c| self.is_read(c))
    }

    /// Forgets a deleted channel.
    pub fn clear_for(&self, channel_id: ChannelId) {
        self.inner.markers.write().remove(&channel_id);
        self.inner.pending.lock().remove(&channel_id);
    }

    /// Number of channels with a buffered acknowledgement.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ChannelKind;
    use crate::domain::ports::MockTransportPort;
    use crate::domain::ports::mocks::MemoryReadStateStore;
    use mockall::predicate::eq;

    fn tracker(transport: MockTransportPort) -> (ReadStateTracker, MemoryReadStateStore) {
        let store = MemoryReadStateStore::default();
        let tracker = ReadStateTracker::new(Arc::new(transport), Arc::new(store.clone()));
        (tracker, store)
    }

    fn channel(last: u64) -> Channel {
        Channel::new(1_u64, "general", ChannelKind::Text)
            .with_guild(9_u64)
            .with_last_message(last)
    }

    #[test]
    fn test_mark_read_is_monotonic() {
        let (tracker, _) = tracker(MockTransportPort::new());

        assert!(tracker.mark_read(ChannelId(1), MessageId(5)));
        assert!(!tracker.mark_read(ChannelId(1), MessageId(3)));
        assert!(!tracker.mark_read(ChannelId(1), MessageId(5)));
        assert_eq!(tracker.marker(ChannelId(1)), Some(MessageId(5)));
        assert!(tracker.mark_read(ChannelId(1), MessageId(8)));
        assert_eq!(tracker.marker(ChannelId(1)), Some(MessageId(8)));
    }

    #[test]
    fn test_remote_ack_only_moves_forward() {
        let (tracker, _) = tracker(MockTransportPort::new());
        tracker.mark_read(ChannelId(1), MessageId(5));

        assert!(!tracker.apply_remote_ack(ChannelId(1), MessageId(4)));
        assert_eq!(tracker.marker(ChannelId(1)), Some(MessageId(5)));
        assert!(tracker.apply_remote_ack(ChannelId(1), MessageId(5)));
        assert!(tracker.apply_remote_ack(ChannelId(1), MessageId(7)));
        assert_eq!(tracker.marker(ChannelId(1)), Some(MessageId(7)));
    }

    #[test]
    fn test_is_read() {
        let (tracker, _) = tracker(MockTransportPort::new());
        let empty = Channel::new(2_u64, "empty", ChannelKind::Text);

        assert!(tracker.is_read(&empty));
        assert!(!tracker.is_read(&channel(5)));
        tracker.mark_read(ChannelId(1), MessageId(5));
        assert!(tracker.is_read(&channel(5)));
        assert!(!tracker.is_read(&channel(6)));
    }

    #[test]
    fn test_guild_read_ignores_muted_and_non_text() {
        let (tracker, _) = tracker(MockTransportPort::new());
        let muted = Channel::new(3_u64, "spam", ChannelKind::Text)
            .with_guild(9_u64)
            .with_last_message(10_u64);
        let voice = Channel::new(4_u64, "voice", ChannelKind::Voice).with_last_message(10_u64);
        tracker.set_mute_config(MuteConfig {
            muted_channels: [ChannelId(3)].into(),
            ..MuteConfig::default()
        });
        tracker.mark_read(ChannelId(1), MessageId(5));

        assert!(tracker.is_muted(&muted));
        assert!(tracker.has_guild_been_read(&[channel(5), muted.clone(), voice]));
        assert!(!tracker.has_guild_been_read(&[channel(6), muted]));
    }

    #[tokio::test]
    async fn test_buffered_updates_coalesce_per_channel() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_acknowledge_message()
            .with(eq(ChannelId(1)), eq(MessageId(7)))
            .times(1)
            .returning(|_, _| Ok(()));
        let (tracker, _) = tracker(transport);

        tracker.update_read_buffered(ChannelId(1), MessageId(5));
        tracker.update_read_buffered(ChannelId(1), MessageId(7));
        tracker.update_read_buffered(ChannelId(1), MessageId(6));

        assert_eq!(tracker.marker(ChannelId(1)), Some(MessageId(7)));
        assert_eq!(tracker.flush_pending().await, 1);
        assert_eq!(tracker.flush_pending().await, 0);
    }

    #[tokio::test]
    async fn test_failed_flush_is_requeued() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_acknowledge_message()
            .times(1)
            .returning(|_, _| Err(TransportError::network("offline")));
        let (tracker, _) = tracker(transport);

        tracker.update_read_buffered(ChannelId(1), MessageId(5));

        assert_eq!(tracker.flush_pending().await, 0);
        assert_eq!(tracker.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_update_read_acknowledges_immediately() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_acknowledge_message()
            .with(eq(ChannelId(1)), eq(MessageId(9)))
            .times(1)
            .returning(|_, _| Ok(()));
        let (tracker, _) = tracker(transport);
        tracker.update_read_buffered(ChannelId(1), MessageId(4));

        tracker.update_read(ChannelId(1), MessageId(9)).await.unwrap();

        assert_eq!(tracker.pending_count(), 0);
        assert_eq!(tracker.marker(ChannelId(1)), Some(MessageId(9)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_loop_acknowledges_on_tick_and_shutdown() {
        let mut transport = MockTransportPort::new();
        transport
            .expect_acknowledge_message()
            .times(2)
            .returning(|_, _| Ok(()));
        let (tracker, _) = tracker(transport);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let running = tokio::spawn(tracker.clone().run_flush_loop(Duration::from_secs(1), shutdown_rx));

        tracker.update_read_buffered(ChannelId(1), MessageId(5));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(tracker.pending_count(), 0);

        tracker.update_read_buffered(ChannelId(2), MessageId(6));
        shutdown_tx.send(true).unwrap();
        running.await.unwrap();
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn test_load_and_persist() {
        let store = MemoryReadStateStore::new(
            vec![ReadState::new(ChannelId(1), MessageId(5))],
            MuteConfig {
                muted_guilds: [GuildId(9)].into(),
                ..MuteConfig::default()
            },
        );
        let tracker = ReadStateTracker::new(Arc::new(MockTransportPort::new()), Arc::new(store.clone()));

        tracker.load().unwrap();
        assert!(tracker.is_muted(&channel(1)));
        assert_eq!(tracker.marker(ChannelId(1)), Some(MessageId(5)));

        tracker.mark_read(ChannelId(2), MessageId(8));
        tracker.clear_for(ChannelId(1));
        tracker.persist().unwrap();

        assert_eq!(
            store.states.lock().unwrap().clone(),
            vec![ReadState::new(ChannelId(2), MessageId(8))]
        );
    }
}
