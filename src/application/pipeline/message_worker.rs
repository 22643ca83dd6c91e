use tracing::{debug, trace};

use crate::application::context::SyncContext;
use crate::application::session_cache::{EditMerge, MessageMerge};
use crate::domain::entities::{Channel, ChannelKind, Message, MessageEdit};
use crate::domain::errors::SyncError;
use crate::domain::events::MessageDeletion;
use crate::domain::ports::ChannelIndicator;
use crate::domain::services::MentionDetector;

/// Merges a new message and updates whatever shows its channel.
///
/// # Errors
///
/// Returns `SyncError::UnknownChannel` if the channel is not cached, or
/// `SyncError::UiClosed` if the UI loop has stopped.
pub async fn handle_message_create(ctx: SyncContext, message: Message) -> Result<(), SyncError> {
    let local_user = ctx.cache.local_user_id();
    let is_own = local_user == Some(message.author().id());

    // The chat lock covers the merge so a concurrent delete cannot slip
    // between the cache insert and the row append.
    let (message, channel, is_open) = {
        let mut chat = ctx.open_chat.lock().await;
        let message = match ctx.cache.merge_message(message)? {
            MessageMerge::Inserted(message) => message,
            MessageMerge::Duplicate | MessageMerge::Tombstoned => return Ok(()),
        };
        let channel = ctx
            .cache
            .channel(message.channel_id())
            .ok_or(SyncError::UnknownChannel(message.channel_id()))?;

        let is_open = chat.is_open(channel.id());
        if is_open {
            if !is_own {
                ctx.read_state
                    .update_read_buffered(channel.id(), message.id());
            }
            chat.rows.insert(message.id());
            let row = message.clone();
            ctx.ui
                .enqueue_and_wait(move |ui| ui.append_message(&row))
                .await?;
        }
        (message, channel, is_open)
    };

    if channel.is_private() {
        ctx.cache.touch_private_channel(channel.id());
        let channel_id = channel.id();
        ctx.ui
            .enqueue_and_wait(move |ui| ui.move_private_channel_to_top(channel_id))
            .await?;
    }

    if is_own {
        ctx.read_state.mark_read(channel.id(), message.id());
        if !is_open {
            ctx.show_channel_indicator(&channel, ChannelIndicator::Read)
                .await?;
        }
        return Ok(());
    }

    if is_open {
        return Ok(());
    }

    let mentioned = local_user.is_some_and(|user_id| match channel.guild_id() {
        Some(guild_id) => MentionDetector::mentions_local_user(
            &message,
            user_id,
            &ctx.local_roles(guild_id),
            ctx.read_state.suppresses_everyone(guild_id),
        ),
        None => MentionDetector::mentions_local_user(&message, user_id, &[], false),
    });

    if ctx.settings.enable_desktop_notifications
        && !ctx.activity.is_active()
        && (mentioned || channel.is_private())
    {
        notify(&ctx, &channel, &message);
    }

    let indicator = if mentioned && !channel.is_private() {
        Some(ChannelIndicator::Mentioned)
    } else if ctx.read_state.is_muted(&channel) {
        None
    } else {
        Some(ChannelIndicator::Unread)
    };

    match indicator {
        Some(indicator) => ctx.show_channel_indicator(&channel, indicator).await,
        None => {
            trace!(channel_id = %channel.id(), "Muted channel left unmarked");
            Ok(())
        }
    }
}

fn notify(ctx: &SyncContext, channel: &Channel, message: &Message) {
    let author = message.author().username();
    let location = match channel.kind() {
        ChannelKind::Dm => author.to_string(),
        ChannelKind::GroupDm => format!("{author} - {}", channel.private_display_name()),
        _ => {
            let guild = channel
                .guild_id()
                .and_then(|id| ctx.cache.guild(id))
                .map(|g| g.name().to_string())
                .unwrap_or_default();
            format!("{guild} - {} - {author}", channel.name())
        }
    };
    let title = format!("{} - {location}", ctx.settings.app_name);
    let body = ctx.composer.render_for_display(message);
    debug!(channel_id = %channel.id(), "Sending desktop notification");
    ctx.notifier.send(&title, &body);
}

/// Merges an edit and refreshes its row if shown.
///
/// # Errors
///
/// Returns `SyncError::UiClosed` if the UI loop has stopped.
pub async fn handle_message_update(ctx: SyncContext, edit: MessageEdit) -> Result<(), SyncError> {
    let chat = ctx.open_chat.lock().await;
    let message = match ctx.cache.apply_edit(&edit) {
        EditMerge::Applied(message) => message,
        EditMerge::Deferred => {
            trace!(message_id = %edit.id, "Edit parked until its message arrives");
            return Ok(());
        }
        EditMerge::Discarded => return Ok(()),
    };

    if chat.is_open(message.channel_id()) && chat.rows.contains(&message.id()) {
        ctx.ui
            .enqueue_and_wait(move |ui| ui.update_message(&message))
            .await?;
    }
    Ok(())
}

/// Removes deleted messages and their rows.
///
/// # Errors
///
/// Returns `SyncError::UiClosed` if the UI loop has stopped.
pub async fn handle_message_delete(
    ctx: SyncContext,
    deletion: MessageDeletion,
) -> Result<(), SyncError> {
    let channel_id = deletion.channel_id();
    let ids = deletion.message_ids();

    let mut chat = ctx.open_chat.lock().await;
    let removed = ctx.cache.remove_messages(channel_id, &ids);
    trace!(channel_id = %channel_id, removed = removed.len(), "Messages deleted");
    if !chat.is_open(channel_id) {
        return Ok(());
    }
    let rows: Vec<_> = ids.into_iter().filter(|id| chat.rows.remove(id)).collect();
    if rows.is_empty() {
        return Ok(());
    }
    ctx.ui
        .enqueue_and_wait(move |ui| ui.remove_messages(&rows))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::SyncSettings;
    use crate::application::context::harness::*;
    use crate::domain::entities::{ChannelId, MessageId, User};
    use crate::domain::ports::MockTransportPort;
    use crate::domain::ports::mocks::UiCall;
    use crate::domain::Selection;
    use chrono::Utc;
    use std::time::Duration;

    fn from(author: User, channel: u64, id: u64) -> Message {
        Message::new(id, channel, author, "hello", Utc::now())
    }

    async fn open(h: &Harness, channel: u64, guild: Option<u64>) {
        h.ctx
            .navigation
            .lock()
            .select_channel(Selection::new(channel.into(), guild.map(Into::into)));
        h.ctx.open_chat.lock().await.channel_id = Some(channel.into());
    }

    fn idle_settings() -> SyncSettings {
        SyncSettings {
            user_inactive: Duration::ZERO,
            ..SyncSettings::default()
        }
    }

    #[tokio::test]
    async fn test_create_in_open_channel_appends_and_buffers_read() {
        let h = harness(MockTransportPort::new());
        open(&h, GENERAL, Some(GUILD)).await;

        handle_message_create(h.ctx.clone(), from(bob(), GENERAL, 6))
            .await
            .unwrap();

        assert_eq!(h.presenter.calls(), vec![UiCall::Append(MessageId(6))]);
        assert_eq!(h.ctx.read_state.marker(GENERAL.into()), Some(MessageId(6)));
        assert_eq!(h.ctx.read_state.pending_count(), 1);
        assert!(h.ctx.open_chat.lock().await.rows.contains(&MessageId(6)));
    }

    #[tokio::test]
    async fn test_duplicate_create_is_ignored() {
        let h = harness(MockTransportPort::new());
        open(&h, GENERAL, Some(GUILD)).await;

        handle_message_create(h.ctx.clone(), from(bob(), GENERAL, 6))
            .await
            .unwrap();
        handle_message_create(h.ctx.clone(), from(bob(), GENERAL, 6))
            .await
            .unwrap();

        assert_eq!(h.presenter.calls(), vec![UiCall::Append(MessageId(6))]);
    }

    #[tokio::test]
    async fn test_create_in_unselected_guild_refreshes_aggregate() {
        let h = harness(MockTransportPort::new());
        open(&h, GENERAL, Some(GUILD)).await;

        handle_message_create(h.ctx.clone(), from(bob(), OTHER_TEXT, 6))
            .await
            .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![UiCall::GuildIndicator(
                OTHER_GUILD.into(),
                crate::domain::ports::GuildIndicator::Unread
            )]
        );
    }

    #[tokio::test]
    async fn test_mention_in_selected_guild_marks_channel() {
        let h = harness_with(seeded_cache(), MockTransportPort::new(), idle_settings());
        open(&h, GENERAL, Some(GUILD)).await;
        let mention = from(bob(), RANDOM, 6).with_mentions(vec![me()]);

        handle_message_create(h.ctx.clone(), mention).await.unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![UiCall::ChannelIndicator(
                ChannelId(RANDOM),
                ChannelIndicator::Mentioned
            )]
        );
        assert_eq!(
            h.notifier.sent(),
            vec![("Oxicord - home - random - bob".to_string(), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_private_message_moves_to_top_and_notifies() {
        let h = harness_with(seeded_cache(), MockTransportPort::new(), idle_settings());

        handle_message_create(h.ctx.clone(), from(bob(), DM, 6))
            .await
            .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![
                UiCall::PrivateToTop(ChannelId(DM)),
                UiCall::PrivateIndicator(ChannelId(DM), ChannelIndicator::Unread),
            ]
        );
        assert_eq!(
            h.notifier.sent(),
            vec![("Oxicord - bob".to_string(), "hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_active_user_gets_no_notification() {
        let h = harness(MockTransportPort::new());

        handle_message_create(h.ctx.clone(), from(bob(), DM, 6))
            .await
            .unwrap();

        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_own_message_marks_read() {
        let h = harness_with(seeded_cache(), MockTransportPort::new(), idle_settings());

        handle_message_create(h.ctx.clone(), from(me(), DM, 6))
            .await
            .unwrap();

        assert_eq!(h.ctx.read_state.marker(DM.into()), Some(MessageId(6)));
        assert_eq!(
            h.presenter.calls(),
            vec![
                UiCall::PrivateToTop(ChannelId(DM)),
                UiCall::PrivateIndicator(ChannelId(DM), ChannelIndicator::Read),
            ]
        );
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_muted_channel_stays_unmarked() {
        let h = harness(MockTransportPort::new());
        h.ctx
            .read_state
            .set_mute_config(crate::domain::entities::MuteConfig {
                muted_channels: [ChannelId(DM)].into(),
                ..Default::default()
            });

        handle_message_create(h.ctx.clone(), from(bob(), DM, 6))
            .await
            .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![UiCall::PrivateToTop(ChannelId(DM))]
        );
    }

    #[tokio::test]
    async fn test_edit_updates_only_visible_row() {
        let h = harness(MockTransportPort::new());
        open(&h, GENERAL, Some(GUILD)).await;
        handle_message_create(h.ctx.clone(), from(bob(), GENERAL, 6))
            .await
            .unwrap();
        h.presenter.clear();

        handle_message_update(h.ctx.clone(), MessageEdit::content(6_u64, GENERAL, "edited"))
            .await
            .unwrap();
        handle_message_update(h.ctx.clone(), MessageEdit::embed_only(6_u64, GENERAL))
            .await
            .unwrap();
        handle_message_update(h.ctx.clone(), MessageEdit::content(7_u64, GENERAL, "early"))
            .await
            .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![UiCall::Update(MessageId(6), "edited".to_string())]
        );
    }

    #[tokio::test]
    async fn test_delete_in_closed_channel_only_touches_cache() {
        let h = harness(MockTransportPort::new());
        handle_message_create(h.ctx.clone(), from(bob(), OTHER_TEXT, 6))
            .await
            .unwrap();
        h.presenter.clear();

        handle_message_delete(
            h.ctx.clone(),
            MessageDeletion::Single {
                channel_id: OTHER_TEXT.into(),
                message_id: MessageId(6),
            },
        )
        .await
        .unwrap();

        assert!(h.presenter.calls().is_empty());
        assert!(h.ctx.cache.messages(OTHER_TEXT.into()).is_empty());
    }

    #[tokio::test]
    async fn test_cache_changes_wait_for_chat_lock() {
        let h = harness(MockTransportPort::new());
        open(&h, GENERAL, Some(GUILD)).await;
        let chat = h.ctx.open_chat.lock().await;

        let create = tokio::spawn(handle_message_create(
            h.ctx.clone(),
            from(bob(), GENERAL, 6),
        ));
        let delete = tokio::spawn(handle_message_delete(
            h.ctx.clone(),
            MessageDeletion::Single {
                channel_id: GENERAL.into(),
                message_id: MessageId(6),
            },
        ));
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(h.ctx.cache.message(GENERAL.into(), MessageId(6)).is_none());
        drop(chat);

        create.await.unwrap().unwrap();
        delete.await.unwrap().unwrap();

        assert!(h.ctx.cache.message(GENERAL.into(), MessageId(6)).is_none());
        assert!(!h.ctx.open_chat.lock().await.rows.contains(&MessageId(6)));
        assert_eq!(
            h.presenter.calls(),
            vec![
                UiCall::Append(MessageId(6)),
                UiCall::Remove(vec![MessageId(6)]),
            ]
        );
    }
}
