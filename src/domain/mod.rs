//! Domain layer with core entities, events and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Remote event definitions.
pub mod events;
/// Navigation state machine.
pub mod navigation;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;
/// Pure domain services.
pub mod services;

pub use events::{EventFamily, RemoteEvent, StructuralEvent};
pub use navigation::{NavigationPhase, NavigationState, Selection};
