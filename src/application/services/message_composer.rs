//! Turns typed input into wire text and wire text back into display text.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::application::services::emoji_resolver::{
    CustomEmojiResolver, custom_shortcodes, replace_standard_emoji,
};
use crate::application::session_cache::SessionCache;
use crate::domain::entities::{Channel, Message, PremiumType, Role, User};
use crate::domain::errors::ComposeError;
use crate::domain::ports::{ScriptHook, TransportPort};

/// Longest message the service accepts, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```|`[^`\n]*`").expect("Invalid regex"));

static WIRE_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(@!?|@&|#)(\d+)>").expect("Invalid regex"));

/// Escapes colons inside code so no shortcode pass touches them.
fn escape_code_colons(text: &str) -> String {
    CODE_BLOCK_RE
        .replace_all(text, |caps: &Captures<'_>| caps[0].replace(':', "\\:"))
        .into_owned()
}

/// Replaces `sigil` + name with its token. Longer names win, names are
/// matched case-sensitively.
fn replace_literals(text: &str, sigil: char, mut table: Vec<(String, String)>) -> String {
    if table.is_empty() || !text.contains(sigil) {
        return text.to_string();
    }
    table.retain(|(name, _)| !name.is_empty());
    table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(sigil) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + sigil.len_utf8()..];
        match table.iter().find(|(name, _)| after.starts_with(name.as_str())) {
            Some((name, token)) => {
                out.push_str(token);
                rest = &after[name.len()..];
            }
            None => {
                out.push(sigil);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Renders wire mentions back to their typed form.
///
/// `<@id>` and `<@!id>` become `@username#discriminator`, `<@&id>` becomes
/// `@role` and `<#id>` becomes `#channel`. Unknown identities stay as they are.
#[must_use]
pub fn render_mentions(content: &str, users: &[User], roles: &[Role], channels: &[Channel]) -> String {
    WIRE_MENTION_RE
        .replace_all(content, |caps: &Captures<'_>| {
            let id = caps[2].parse::<u64>().ok();
            let rendered = match &caps[1] {
                "@&" => roles
                    .iter()
                    .find(|r| Some(r.id.as_u64()) == id)
                    .map(|r| format!("@{}", r.name)),
                "#" => channels
                    .iter()
                    .find(|c| Some(c.id().as_u64()) == id)
                    .map(|c| format!("#{}", c.name())),
                _ => users
                    .iter()
                    .find(|u| Some(u.id().as_u64()) == id)
                    .map(|u| format!("@{}", u.tag())),
            };
            rendered.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Turns typed text into its wire form before sending.
pub struct MessageComposer {
    cache: SessionCache,
    hook: Arc<dyn ScriptHook>,
    transport: Arc<dyn TransportPort>,
}

impl MessageComposer {
    /// Creates a composer over the shared cache.
    #[must_use]
    pub fn new(
        cache: SessionCache,
        hook: Arc<dyn ScriptHook>,
        transport: Arc<dyn TransportPort>,
    ) -> Self {
        Self {
            cache,
            hook,
            transport,
        }
    }

    /// Converts typed text into the wire form sent to `channel`.
    ///
    /// Steps, in order: protect colons in code, run the script hook, replace
    /// standard emoji, replace `#channel` references (guild channels only),
    /// resolve custom emoji, unprotect colons, replace `@user#discriminator`
    /// mentions against the recipients or the guild roster.
    ///
    /// # Errors
    ///
    /// Returns `ComposeError::MessageTooLong` if the result exceeds
    /// [`MAX_MESSAGE_LENGTH`] characters.
    pub async fn prepare(&self, channel: &Channel, text: &str) -> Result<String, ComposeError> {
        let hooked = self.hook.on_message_send(&escape_code_colons(text));
        self.ensure_local_members(&hooked).await;

        let prepared = self.resolve_references(channel, &hooked);
        let length = prepared.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(ComposeError::MessageTooLong {
                length,
                limit: MAX_MESSAGE_LENGTH,
            });
        }
        Ok(prepared)
    }

    /// Message content with mentions rendered against the cached roster.
    #[must_use]
    pub fn render_for_display(&self, message: &Message) -> String {
        let mut users: Vec<User> = message.mentions().to_vec();
        let mut roles = Vec::new();
        let mut channels = Vec::new();

        match message.guild_id().and_then(|id| self.cache.guild(id)) {
            Some(guild) => {
                users.extend(guild.members().iter().map(|m| m.user.clone()));
                roles.extend_from_slice(guild.roles());
                channels = self.cache.guild_channels(guild.id());
            }
            None => {
                if let Some(channel) = self.cache.channel(message.channel_id()) {
                    users.extend_from_slice(channel.recipients());
                }
            }
        }

        render_mentions(message.content(), &users, &roles, &channels)
    }

    fn resolve_references(&self, channel: &Channel, hooked: &str) -> String {
        let mut message = replace_standard_emoji(hooked);

        let guilds = self.cache.guilds();
        let local_guild = channel
            .guild_id()
            .and_then(|id| guilds.iter().find(|g| g.id() == id));

        if let Some(guild) = local_guild {
            let table = self
                .cache
                .guild_channels(guild.id())
                .into_iter()
                .filter(|c| c.kind().is_guild_text())
                .map(|c| (c.name().to_string(), format!("<#{}>", c.id())))
                .collect();
            message = replace_literals(&message, '#', table);
        }

        let premium = self
            .cache
            .local_user()
            .map_or(PremiumType::None, |user| user.premium_type());
        let members: HashMap<_, _> = guilds
            .iter()
            .filter_map(|g| self.cache.local_member(g.id()).map(|m| (g.id(), m)))
            .collect();
        message = CustomEmojiResolver::new(&guilds, channel.guild_id(), premium, &members)
            .replace(&message);

        message = message.replace("\\:", ":");

        let roster: Vec<(String, String)> = match local_guild {
            Some(guild) => guild
                .members()
                .iter()
                .map(|m| (m.user.tag(), format!("<@{}>", m.user_id())))
                .collect(),
            None => channel
                .recipients()
                .iter()
                .map(|u| (u.tag(), format!("<@{}>", u.id())))
                .collect(),
        };
        replace_literals(&message, '@', roster)
    }

    /// Fetches the local member of guilds whose role-gated emoji are named in `text`.
    async fn ensure_local_members(&self, text: &str) {
        let names = custom_shortcodes(text);
        if names.is_empty() {
            return;
        }
        let Some(user_id) = self.cache.local_user_id() else {
            return;
        };

        for guild in self.cache.guilds() {
            let gated = guild
                .emojis()
                .iter()
                .any(|e| e.is_role_gated() && names.contains(&e.name.to_lowercase()));
            if !gated || guild.member(user_id).is_some() {
                continue;
            }

            match self.transport.fetch_member(guild.id(), user_id).await {
                Ok(member) => {
                    debug!(guild_id = %guild.id(), "Fetched own member for emoji roles");
                    if let Err(e) = self.cache.upsert_members(guild.id(), vec![member]) {
                        debug!(error = %e, "Guild vanished while fetching own member");
                    }
                }
                Err(e) => {
                    warn!(guild_id = %guild.id(), error = %e, "Failed to fetch own member");
                }
            }
        }
    }
}
