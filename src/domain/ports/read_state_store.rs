//! Persistence contract for read markers and mute settings.

use crate::domain::entities::{MuteConfig, ReadState};
use crate::domain::errors::PersistenceError;

/// Persistent storage of read markers and mute settings.
pub trait ReadStateStore: Send + Sync {
    /// Loads the persisted read markers.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the markers cannot be read.
    fn load_read_state(&self) -> Result<Vec<ReadState>, PersistenceError>;

    /// Replaces the persisted read markers.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the markers cannot be written.
    fn save_read_state(&self, states: &[ReadState]) -> Result<(), PersistenceError>;

    /// Loads the mute configuration.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the configuration cannot be read.
    fn load_mute_config(&self) -> Result<MuteConfig, PersistenceError>;
}

#[cfg(test)]
#[allow(dead_code)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    pub struct MemoryReadStateStore {
        pub states: Arc<Mutex<Vec<ReadState>>>,
        pub mutes: MuteConfig,
    }

    impl MemoryReadStateStore {
        pub fn new(states: Vec<ReadState>, mutes: MuteConfig) -> Self {
            Self {
                states: Arc::new(Mutex::new(states)),
                mutes,
            }
        }
    }

    impl ReadStateStore for MemoryReadStateStore {
        fn load_read_state(&self) -> Result<Vec<ReadState>, PersistenceError> {
            Ok(self.states.lock().unwrap().clone())
        }

        fn save_read_state(&self, states: &[ReadState]) -> Result<(), PersistenceError> {
            *self.states.lock().unwrap() = states.to_vec();
            Ok(())
        }

        fn load_mute_config(&self) -> Result<MuteConfig, PersistenceError> {
            Ok(self.mutes.clone())
        }
    }
}
