//! Shortcode substitution for standard and custom emoji.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::entities::{Emoji, Guild, GuildId, Member, PremiumType};

static SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(!?)([\w+\-~]+):").expect("Invalid regex"));

/// True when the shortcode at `start` is escaped or part of a wire token.
fn is_protected(text: &str, start: usize) -> bool {
    let before = &text[..start];
    before.ends_with('\\') || before.ends_with('<') || before.ends_with("<a")
}

fn replace_shortcodes<F>(text: &str, mut resolve: F) -> String
where
    F: FnMut(bool, &str) -> Option<String>,
{
    SHORTCODE_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let start = caps.get(0).map_or(0, |m| m.start());
            if is_protected(text, start) {
                return whole.to_string();
            }
            let forced = !caps[1].is_empty();
            resolve(forced, &caps[2]).unwrap_or_else(|| whole.to_string())
        })
        .into_owned()
}

/// Replaces standard shortcodes such as `:smile:` with their unicode emoji.
#[must_use]
pub fn replace_standard_emoji(text: &str) -> String {
    replace_shortcodes(text, |forced, name| {
        if forced {
            return None;
        }
        emojis::get_by_shortcode(name).map(|emoji| emoji.as_str().to_string())
    })
}

/// Shortcode names in `text` that may refer to custom emoji, lowercased.
#[must_use]
pub fn custom_shortcodes(text: &str) -> Vec<String> {
    SHORTCODE_RE
        .captures_iter(text)
        .filter(|caps| caps.get(0).is_some_and(|m| !is_protected(text, m.start())))
        .map(|caps| caps[2].to_lowercase())
        .collect()
}

/// Resolves custom emoji shortcodes against the cached guild catalogs.
///
/// Subscribers entitled to any emoji may use every guild's emoji, animated
/// ones included. Everybody else gets non-animated emoji of the local guild,
/// and non-animated emoji whose name starts with `GW` from other guilds.
/// Role-gated emoji require the local member to hold one of the roles.
pub struct CustomEmojiResolver<'a> {
    guilds: &'a [Guild],
    local_guild: Option<GuildId>,
    premium: PremiumType,
    members: &'a HashMap<GuildId, Member>,
}

impl<'a> CustomEmojiResolver<'a> {
    /// `members` holds the local user's membership per guild, where known.
    #[must_use]
    pub const fn new(
        guilds: &'a [Guild],
        local_guild: Option<GuildId>,
        premium: PremiumType,
        members: &'a HashMap<GuildId, Member>,
    ) -> Self {
        Self {
            guilds,
            local_guild,
            premium,
            members,
        }
    }

    /// Replaces every `:name:` shortcode the user may use with its wire token.
    #[must_use]
    pub fn replace(&self, text: &str) -> String {
        replace_shortcodes(text, |_, name| self.resolve(&name.to_lowercase()))
    }

    /// Wire token for the lowercased shortcode `name`; first match wins.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<String> {
        let local = self
            .local_guild
            .and_then(|id| self.guilds.iter().find(|g| g.id() == id));

        if self.premium.can_use_any_emoji() {
            return local
                .into_iter()
                .chain(self.guilds.iter())
                .find_map(|guild| self.find_in_guild(guild, name, true, false));
        }

        if let Some(found) = local.and_then(|guild| self.find_in_guild(guild, name, false, false)) {
            return Some(found);
        }

        self.guilds
            .iter()
            .find_map(|guild| self.find_in_guild(guild, name, false, true))
    }

    fn find_in_guild(
        &self,
        guild: &Guild,
        name: &str,
        allow_animated: bool,
        require_gw: bool,
    ) -> Option<String> {
        guild
            .emojis()
            .iter()
            .filter(|emoji| allow_animated || !emoji.animated)
            .filter(|emoji| !require_gw || emoji.name.starts_with("GW"))
            .filter(|emoji| emoji.name.to_lowercase() == name)
            .find(|emoji| self.permitted(guild.id(), emoji))
            .map(Emoji::wire_token)
    }

    fn permitted(&self, guild_id: GuildId, emoji: &Emoji) -> bool {
        if !emoji.is_role_gated() {
            return true;
        }
        self.members
            .get(&guild_id)
            .is_some_and(|member| member.has_any_role(&emoji.roles))
    }
}
