//! Application services built on the session cache and ports.

mod activity_monitor;
pub mod emoji_resolver;
mod fuzzy_matcher;
mod mention_suggestions;
mod message_composer;
mod message_sender;
mod navigation_service;
mod read_state_tracker;
mod session_bootstrap;

pub use activity_monitor::ActivityMonitor;
pub use fuzzy_matcher::{FuzzySearcher, Ranked};
pub use mention_suggestions::{
    MAX_SUGGESTIONS, MentionCandidate, MentionSuggester, MentionTarget, SuggestionState,
};
pub use message_composer::{MAX_MESSAGE_LENGTH, MessageComposer, render_mentions};
pub use message_sender::{FailureChoice, MessageSender, OutgoingMessage, SubmitOutcome};
pub use navigation_service::NavigationService;
pub use read_state_tracker::ReadStateTracker;
pub use session_bootstrap::SessionBootstrap;
