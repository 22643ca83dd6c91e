//! Command-line arguments.

use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "oxicord-sync",
    version,
    about = "Replays a session script through the Oxicord sync core",
    long_about = None
)]
/// Command-line arguments.
pub struct CliArgs {
    /// Session script (JSON lines). Reads stdin when omitted.
    #[arg(value_name = "SCRIPT")]
    pub script: Option<PathBuf>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", env = "OXICORD_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, env = "OXICORD_SYNC_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Enable desktop notifications.
    #[arg(long)]
    pub enable_desktop_notifications: Option<bool>,

    /// Focus the message input after opening a channel.
    #[arg(long)]
    pub focus_message_input: Option<bool>,

    /// Seconds without input before the user counts as away.
    #[arg(long)]
    pub user_inactive_secs: Option<u64>,

    /// Messages fetched when opening an uncached channel.
    #[arg(long)]
    pub message_fetch_limit: Option<u8>,
}
