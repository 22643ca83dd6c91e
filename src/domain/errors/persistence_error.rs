use thiserror::Error;

/// Failure to load or store read state and mute settings.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum PersistenceError {
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("malformed {what}: {message}")]
    Malformed { what: String, message: String },
}
