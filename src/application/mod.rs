//! Application layer: session cache, event pipeline, UI gateway and services.

/// Shared context handed to workers and services.
pub mod context;
/// Per-family event queues and their workers.
pub mod pipeline;
/// Application services.
pub mod services;
/// Convergent in-memory session state.
pub mod session_cache;
/// Serialized access to the presentation layer.
pub mod ui_gateway;

pub use context::{OpenChat, SyncContext, SyncPorts, SyncSettings};
pub use pipeline::{EventPipeline, QueueCapacities};
pub use session_cache::{EditMerge, MessageMerge, SessionCache};
pub use ui_gateway::{UiHandle, UiLoop, UiMutation};
