//! Infrastructure layer with adapters for the outer world.

/// Application configuration.
pub mod config;
/// Presenter keeping a plain-text screen model.
pub mod headless_presenter;
/// In-process transport with echo.
pub mod loopback_transport;
/// System notifications.
pub mod notifications;
/// Configured outgoing-text rewriting.
pub mod regex_hook;
/// Scripted session driver.
pub mod replay;

pub use config::{AppConfig, CliArgs, LogLevel, StateConfig, StorageManager};
pub use headless_presenter::HeadlessPresenter;
pub use loopback_transport::LoopbackTransport;
pub use notifications::DesktopNotificationService;
pub use regex_hook::RegexReplacementHook;
pub use replay::{ReplayDriver, ReplayError, ReplayStep, parse_script};
