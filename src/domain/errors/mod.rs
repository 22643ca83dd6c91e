//! Domain error types.

mod compose_error;
mod navigation_error;
mod persistence_error;
mod sync_error;
mod transport_error;

pub use compose_error::ComposeError;
pub use navigation_error::NavigationError;
pub use persistence_error::PersistenceError;
pub use sync_error::SyncError;
pub use transport_error::TransportError;
