mod notification_port;
mod presentation_port;
mod read_state_store;
mod script_hook;
mod transport_port;

pub use notification_port::NotificationPort;
pub use presentation_port::{
    ChannelIndicator, FocusTarget, GuildIndicator, Page, PresentationPort, SendFailure,
};
pub use read_state_store::ReadStateStore;
pub use script_hook::{PassthroughHook, ScriptHook};
pub use transport_port::{
    EditMessageRequest, MAX_FETCH_LIMIT, SendMessageRequest, TransportPort,
};

#[cfg(test)]
pub use transport_port::MockTransportPort;

#[cfg(test)]
pub mod mocks {
    pub use super::notification_port::mock::MockNotificationPort;
    pub use super::presentation_port::mock::{RecordingPresenter, UiCall};
    pub use super::read_state_store::mock::MemoryReadStateStore;
}
