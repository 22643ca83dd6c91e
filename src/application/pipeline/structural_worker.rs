use tracing::{debug, info, trace};

use crate::application::context::SyncContext;
use crate::domain::StructuralEvent;
use crate::domain::entities::{Channel, Guild, GuildId, Member, Relationship, UserId};
use crate::domain::errors::SyncError;
use crate::domain::events::GuildPatch;

/// Applies a guild, channel, member or relationship change.
///
/// # Errors
///
/// Returns a cache miss for entities of unknown guilds, or
/// `SyncError::UiClosed` if the UI loop has stopped.
pub async fn handle_structural(ctx: SyncContext, event: StructuralEvent) -> Result<(), SyncError> {
    debug!(event = event.name(), "Structural event");
    match event {
        StructuralEvent::GuildCreate { guild, channels } => guild_create(&ctx, guild, channels).await,
        StructuralEvent::GuildUpdate(patch) => guild_update(&ctx, &patch).await,
        StructuralEvent::GuildDelete { guild_id } => guild_delete(&ctx, guild_id).await,
        StructuralEvent::ChannelCreate(channel) | StructuralEvent::ChannelUpdate(channel) => {
            channel_upsert(&ctx, channel).await
        }
        StructuralEvent::ChannelDelete(channel) => channel_delete(&ctx, &channel).await,
        StructuralEvent::MemberAdd { guild_id, member }
        | StructuralEvent::MemberUpdate { guild_id, member } => {
            members_upsert(&ctx, guild_id, vec![member]).await
        }
        StructuralEvent::MembersChunk { guild_id, members } => {
            members_upsert(&ctx, guild_id, members).await
        }
        StructuralEvent::MemberRemove { guild_id, user_id } => {
            member_remove(&ctx, guild_id, user_id).await
        }
        StructuralEvent::RelationshipAdd(relationship) => relationship_add(&ctx, relationship).await,
        StructuralEvent::RelationshipRemove { user_id } => relationship_remove(&ctx, user_id).await,
    }
}

async fn guild_create(
    ctx: &SyncContext,
    guild: Guild,
    channels: Vec<Channel>,
) -> Result<(), SyncError> {
    let guild_id = guild.id();
    let known = ctx.cache.guild(guild_id).is_some();
    ctx.cache.insert_guild(guild, channels);
    let guild = ctx
        .cache
        .guild(guild_id)
        .ok_or(SyncError::UnknownGuild(guild_id))?;
    info!(guild_id = %guild_id, name = guild.name(), known, "Guild available");

    ctx.ui
        .enqueue_and_wait(move |ui| {
            if known {
                ui.update_guild(&guild);
            } else {
                ui.add_guild(&guild);
            }
        })
        .await?;
    ctx.refresh_guild_indicator(guild_id).await
}

async fn guild_update(ctx: &SyncContext, patch: &GuildPatch) -> Result<(), SyncError> {
    let guild = ctx.cache.update_guild(patch)?;
    ctx.ui
        .enqueue_and_wait(move |ui| ui.update_guild(&guild))
        .await
}

async fn guild_delete(ctx: &SyncContext, guild_id: GuildId) -> Result<(), SyncError> {
    let mut chat = ctx.open_chat.lock().await;
    ctx.cache.remove_guild(guild_id);
    let removal = ctx.navigation.lock().on_guild_removed(guild_id);
    info!(guild_id = %guild_id, was_selected = removal.was_selected, "Guild removed");

    let close_chat = removal
        .closed_channel
        .is_some_and(|channel_id| chat.is_open(channel_id));
    if close_chat {
        chat.close();
    }

    ctx.ui
        .enqueue_and_wait(move |ui| {
            ui.remove_guild(guild_id);
            if removal.was_selected {
                ui.clear_channels();
                ui.clear_members();
            }
            if close_chat {
                ui.clear_chat();
                ui.set_chat_header("");
            }
        })
        .await
}

async fn channel_upsert(ctx: &SyncContext, channel: Channel) -> Result<(), SyncError> {
    let chat = ctx.open_chat.lock().await;
    ctx.cache.upsert_channel(channel.clone())?;
    let channel = ctx.cache.channel(channel.id()).unwrap_or(channel);

    let visible = match channel.guild_id() {
        None => true,
        Some(guild_id) => ctx.is_guild_selected(guild_id),
    };
    if !visible {
        return match channel.guild_id() {
            Some(guild_id) => ctx.refresh_guild_indicator(guild_id).await,
            None => Ok(()),
        };
    }

    let indicator = ctx.channel_indicator(&channel);
    let is_open = chat.is_open(channel.id());
    let header = channel.header_title();
    ctx.ui
        .enqueue_and_wait(move |ui| {
            if channel.is_private() {
                ui.upsert_private_channel(&channel);
                ui.set_private_indicator(channel.id(), indicator);
            } else {
                ui.upsert_channel(&channel);
                if !channel.kind().is_category() {
                    ui.set_channel_indicator(channel.id(), indicator);
                }
            }
            if is_open {
                ui.set_chat_header(&header);
            }
        })
        .await
}

async fn channel_delete(ctx: &SyncContext, channel: &Channel) -> Result<(), SyncError> {
    let channel_id = channel.id();
    let mut chat = ctx.open_chat.lock().await;
    let cached = ctx.cache.remove_channel(channel_id);
    ctx.read_state.clear_for(channel_id);
    ctx.navigation.lock().on_channel_removed(channel_id);
    info!(channel_id = %channel_id, "Channel removed");

    let close_chat = chat.is_open(channel_id);
    if close_chat {
        chat.close();
    }

    let removed = cached.unwrap_or_else(|| channel.clone());
    let private = removed.is_private();
    ctx.ui
        .enqueue_and_wait(move |ui| {
            if private {
                ui.remove_private_channel(channel_id);
            } else {
                ui.remove_channel(channel_id);
            }
            if close_chat {
                ui.clear_chat();
                ui.set_chat_header("");
            }
        })
        .await?;

    match removed.guild_id() {
        Some(guild_id) if !ctx.is_guild_selected(guild_id) => {
            ctx.refresh_guild_indicator(guild_id).await
        }
        _ => Ok(()),
    }
}

async fn members_upsert(
    ctx: &SyncContext,
    guild_id: GuildId,
    members: Vec<Member>,
) -> Result<(), SyncError> {
    ctx.cache.upsert_members(guild_id, members.clone())?;
    if !ctx.is_guild_selected(guild_id) {
        return Ok(());
    }
    ctx.ui
        .enqueue_and_wait(move |ui| ui.upsert_members(&members))
        .await
}

async fn member_remove(
    ctx: &SyncContext,
    guild_id: GuildId,
    user_id: UserId,
) -> Result<(), SyncError> {
    ctx.cache.remove_member(guild_id, user_id)?;
    if !ctx.is_guild_selected(guild_id) {
        return Ok(());
    }
    ctx.ui
        .enqueue_and_wait(move |ui| ui.remove_member(user_id))
        .await
}

async fn relationship_add(ctx: &SyncContext, relationship: Relationship) -> Result<(), SyncError> {
    ctx.cache.upsert_relationship(relationship.clone());
    if !relationship.is_friend() {
        return Ok(());
    }
    ctx.ui
        .enqueue_and_wait(move |ui| ui.add_friend(&relationship.user))
        .await
}

async fn relationship_remove(ctx: &SyncContext, user_id: UserId) -> Result<(), SyncError> {
    match ctx.cache.remove_relationship(user_id) {
        Some(relationship) if relationship.is_friend() => {
            ctx.ui
                .enqueue_and_wait(move |ui| ui.remove_friend(user_id))
                .await
        }
        _ => {
            trace!(user_id = %user_id, "Removed relationship was not a friend");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::harness::*;
    use crate::domain::Selection;
    use crate::domain::entities::{ChannelId, ChannelKind, MessageId, RelationshipType, User};
    use crate::domain::ports::mocks::UiCall;
    use crate::domain::ports::{ChannelIndicator, GuildIndicator, MockTransportPort};

    async fn open_general(h: &Harness) {
        h.ctx
            .navigation
            .lock()
            .select_channel(Selection::new(GENERAL.into(), Some(GUILD.into())));
        let mut chat = h.ctx.open_chat.lock().await;
        chat.channel_id = Some(GENERAL.into());
        chat.rows.insert(MessageId(5));
    }

    #[tokio::test]
    async fn test_deleting_selected_guild_closes_everything() {
        let h = harness(MockTransportPort::new());
        open_general(&h).await;

        handle_structural(
            h.ctx.clone(),
            StructuralEvent::GuildDelete {
                guild_id: GUILD.into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![
                UiCall::RemoveGuild(GUILD.into()),
                UiCall::ClearChannels,
                UiCall::ClearMembers,
                UiCall::ClearChat,
                UiCall::Header(String::new()),
            ]
        );
        assert!(h.ctx.cache.guild(GUILD.into()).is_none());
        assert!(h.ctx.current_selection().is_none());
        assert!(!h.ctx.open_chat.lock().await.is_open(GENERAL.into()));
    }

    #[tokio::test]
    async fn test_deleting_other_guild_leaves_chat_open() {
        let h = harness(MockTransportPort::new());
        open_general(&h).await;

        handle_structural(
            h.ctx.clone(),
            StructuralEvent::GuildDelete {
                guild_id: OTHER_GUILD.into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![UiCall::RemoveGuild(OTHER_GUILD.into())]
        );
        assert!(h.ctx.open_chat.lock().await.is_open(GENERAL.into()));
    }

    #[tokio::test]
    async fn test_guild_create_adds_then_updates() {
        let h = harness(MockTransportPort::new());
        let event = || StructuralEvent::GuildCreate {
            guild: Guild::new(300_u64, "new"),
            channels: vec![Channel::new(31_u64, "hall", ChannelKind::Text)],
        };

        handle_structural(h.ctx.clone(), event()).await.unwrap();
        handle_structural(h.ctx.clone(), event()).await.unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![
                UiCall::AddGuild(300_u64.into()),
                UiCall::GuildIndicator(300_u64.into(), GuildIndicator::Read),
                UiCall::UpdateGuild(300_u64.into(), "new".to_string()),
                UiCall::GuildIndicator(300_u64.into(), GuildIndicator::Read),
            ]
        );
        assert_eq!(h.ctx.cache.guild_channels(300_u64.into()).len(), 1);
    }

    #[tokio::test]
    async fn test_guild_update_renames() {
        let h = harness(MockTransportPort::new());

        handle_structural(
            h.ctx.clone(),
            StructuralEvent::GuildUpdate(GuildPatch {
                id: GUILD.into(),
                name: Some("renamed".to_string()),
                emojis: None,
                roles: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![UiCall::UpdateGuild(GUILD.into(), "renamed".to_string())]
        );
    }

    #[tokio::test]
    async fn test_channel_in_unselected_guild_only_refreshes_aggregate() {
        let h = harness(MockTransportPort::new());
        open_general(&h).await;

        handle_structural(
            h.ctx.clone(),
            StructuralEvent::ChannelCreate(
                Channel::new(21_u64, "news", ChannelKind::Text)
                    .with_guild(OTHER_GUILD)
                    .with_last_message(3_u64),
            ),
        )
        .await
        .unwrap();

        assert!(h.ctx.cache.channel(ChannelId(21)).is_some());
        assert_eq!(
            h.presenter.calls(),
            vec![UiCall::GuildIndicator(OTHER_GUILD.into(), GuildIndicator::Unread)]
        );
    }

    #[tokio::test]
    async fn test_open_channel_update_refreshes_header() {
        let h = harness(MockTransportPort::new());
        open_general(&h).await;
        let renamed = Channel::new(GENERAL, "chat", ChannelKind::Text)
            .with_guild(GUILD)
            .with_topic("talk");
        let header = renamed.header_title();

        handle_structural(h.ctx.clone(), StructuralEvent::ChannelUpdate(renamed))
            .await
            .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![
                UiCall::UpsertChannel(GENERAL.into()),
                UiCall::ChannelIndicator(GENERAL.into(), ChannelIndicator::Unread),
                UiCall::Header(header),
            ]
        );
        assert_eq!(
            h.ctx.cache.channel(GENERAL.into()).unwrap().last_message_id(),
            Some(MessageId(5))
        );
    }

    #[tokio::test]
    async fn test_channel_for_unknown_guild_is_cache_miss() {
        let h = harness(MockTransportPort::new());

        let err = handle_structural(
            h.ctx.clone(),
            StructuralEvent::ChannelCreate(
                Channel::new(77_u64, "void", ChannelKind::Text).with_guild(999_u64),
            ),
        )
        .await
        .unwrap_err();

        assert!(err.is_cache_miss());
    }

    #[tokio::test]
    async fn test_deleting_open_channel_closes_chat() {
        let h = harness(MockTransportPort::new());
        open_general(&h).await;
        h.ctx.read_state.mark_read(GENERAL.into(), MessageId(5));
        let general = h.ctx.cache.channel(GENERAL.into()).unwrap();

        handle_structural(h.ctx.clone(), StructuralEvent::ChannelDelete(general))
            .await
            .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![
                UiCall::RemoveChannel(GENERAL.into()),
                UiCall::ClearChat,
                UiCall::Header(String::new()),
            ]
        );
        assert_eq!(h.ctx.read_state.marker(GENERAL.into()), None);
        assert!(h.ctx.current_selection().is_none());
    }

    #[tokio::test]
    async fn test_deleting_private_channel() {
        let h = harness(MockTransportPort::new());
        let dm = h.ctx.cache.channel(DM.into()).unwrap();

        handle_structural(h.ctx.clone(), StructuralEvent::ChannelDelete(dm))
            .await
            .unwrap();

        assert_eq!(h.presenter.calls(), vec![UiCall::RemovePrivate(DM.into())]);
        assert!(h.ctx.cache.private_channels().is_empty());
    }

    #[tokio::test]
    async fn test_member_events_reach_ui_only_for_selected_guild() {
        let h = harness(MockTransportPort::new());
        let carol = Member::new(User::new(3_u64, "carol", "0003"));

        handle_structural(
            h.ctx.clone(),
            StructuralEvent::MemberAdd {
                guild_id: GUILD.into(),
                member: carol.clone(),
            },
        )
        .await
        .unwrap();
        assert!(h.presenter.calls().is_empty());

        h.ctx.navigation.lock().select_guild(GUILD.into());
        handle_structural(
            h.ctx.clone(),
            StructuralEvent::MemberRemove {
                guild_id: GUILD.into(),
                user_id: 3_u64.into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(h.presenter.calls(), vec![UiCall::RemoveMember(3_u64.into())]);
        assert!(h.ctx.cache.member(GUILD.into(), 3_u64.into()).is_none());
    }

    #[tokio::test]
    async fn test_relationships_update_friend_list() {
        let h = harness(MockTransportPort::new());
        let carol = User::new(3_u64, "carol", "0003");

        handle_structural(
            h.ctx.clone(),
            StructuralEvent::RelationshipAdd(Relationship::new(
                carol.clone(),
                RelationshipType::Friend,
            )),
        )
        .await
        .unwrap();
        handle_structural(
            h.ctx.clone(),
            StructuralEvent::RelationshipRemove {
                user_id: carol.id(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            h.presenter.calls(),
            vec![
                UiCall::AddFriend(carol.id()),
                UiCall::RemoveFriend(carol.id()),
            ]
        );
        assert!(h.ctx.cache.friends().is_empty());
    }

    #[tokio::test]
    async fn test_removing_blocked_user_keeps_friend_list() {
        let h = harness(MockTransportPort::new());
        let dave = User::new(4_u64, "dave", "0004");

        for event in [
            StructuralEvent::RelationshipAdd(Relationship::new(
                dave.clone(),
                RelationshipType::Blocked,
            )),
            StructuralEvent::RelationshipRemove { user_id: dave.id() },
            StructuralEvent::RelationshipRemove {
                user_id: 5_u64.into(),
            },
        ] {
            handle_structural(h.ctx.clone(), event).await.unwrap();
        }

        assert!(h.presenter.calls().is_empty());
        assert!(h.ctx.cache.relationships().is_empty());
    }
}
