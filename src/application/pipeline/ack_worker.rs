use tracing::trace;

use crate::application::context::SyncContext;
use crate::domain::errors::SyncError;
use crate::domain::events::ReadAck;
use crate::domain::ports::ChannelIndicator;

/// Applies a read acknowledgement made from another session.
///
/// # Errors
///
/// Returns `SyncError::UnknownChannel` if the channel is not cached, or
/// `SyncError::UiClosed` if the UI loop has stopped.
pub async fn handle_read_ack(ctx: SyncContext, ack: ReadAck) -> Result<(), SyncError> {
    let channel = ctx
        .cache
        .channel(ack.channel_id)
        .ok_or(SyncError::UnknownChannel(ack.channel_id))?;

    if !ctx.read_state.apply_remote_ack(ack.channel_id, ack.message_id) {
        trace!(channel_id = %ack.channel_id, "Stale read acknowledgement ignored");
        return Ok(());
    }

    if channel.last_message_id() != Some(ack.message_id) {
        return Ok(());
    }
    ctx.show_channel_indicator(&channel, ChannelIndicator::Read)
        .await
}
