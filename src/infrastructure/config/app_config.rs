//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use crate::application::{QueueCapacities, SyncSettings};
use crate::domain::ports::MAX_FETCH_LIMIT;

const APP_NAME: &str = "oxicord-sync";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration, read from `config.toml` and overridden by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Enable desktop notifications.
    #[serde(default = "default_true")]
    pub enable_desktop_notifications: bool,

    /// Move focus to the message input after opening a channel.
    #[serde(default = "default_true")]
    pub focus_message_input_after_channel_selection: bool,

    /// Event pipeline and read-state tuning.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Outgoing text rewriting.
    #[serde(default)]
    pub compose: ComposeConfig,
}

/// Event pipeline and read-state tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds without input after which the user counts as away.
    #[serde(default = "default_user_inactive_secs")]
    pub user_inactive_secs: u64,

    /// Interval between flushes of buffered read acknowledgements.
    #[serde(default = "default_read_ack_interval_ms")]
    pub read_ack_interval_ms: u64,

    /// Messages fetched when opening a channel with an empty cache.
    #[serde(default = "default_message_fetch_limit")]
    pub message_fetch_limit: u8,

    /// Event queue capacities.
    #[serde(default)]
    pub queues: QueueCapacities,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            user_inactive_secs: default_user_inactive_secs(),
            read_ack_interval_ms: default_read_ack_interval_ms(),
            message_fetch_limit: default_message_fetch_limit(),
            queues: QueueCapacities::default(),
        }
    }
}

/// A regex rewrite applied to outgoing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRule {
    /// Regex matched against the outgoing text.
    pub pattern: String,
    /// Replacement, with `$1`-style group references.
    pub replacement: String,
}

/// Outgoing message rewriting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Rules applied in order.
    #[serde(default)]
    pub replacements: Vec<ReplacementRule>,
}

const fn default_true() -> bool {
    true
}

const fn default_user_inactive_secs() -> u64 {
    10
}

const fn default_read_ack_interval_ms() -> u64 {
    1000
}

const fn default_message_fetch_limit() -> u8 {
    MAX_FETCH_LIMIT
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(notifications) = args.enable_desktop_notifications {
            self.enable_desktop_notifications = notifications;
        }
        if let Some(focus) = args.focus_message_input {
            self.focus_message_input_after_channel_selection = focus;
        }
        if let Some(secs) = args.user_inactive_secs {
            self.sync.user_inactive_secs = secs;
        }
        if let Some(limit) = args.message_fetch_limit {
            self.sync.message_fetch_limit = limit;
        }
    }

    /// Runtime settings for the sync core.
    #[must_use]
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            enable_desktop_notifications: self.enable_desktop_notifications,
            focus_message_input_after_channel_selection: self
                .focus_message_input_after_channel_selection,
            message_fetch_limit: self.sync.message_fetch_limit.clamp(1, MAX_FETCH_LIMIT),
            user_inactive: Duration::from_secs(self.sync.user_inactive_secs),
            read_ack_interval: Duration::from_millis(self.sync.read_ack_interval_ms.max(1)),
            queues: self.sync.queues,
            ..SyncSettings::default()
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("oxicord-sync.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            enable_desktop_notifications: true,
            focus_message_input_after_channel_selection: true,
            sync: SyncConfig::default(),
            compose: ComposeConfig::default(),
        }
    }
}
