use std::collections::HashSet;

use crate::application::services::FuzzySearcher;
use crate::application::session_cache::SessionCache;
use crate::domain::entities::{Channel, Role, User};

/// Maximum number of suggestions shown at once.
pub const MAX_SUGGESTIONS: usize = 10;

/// What a suggestion inserts when accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionTarget {
    /// A guild member or private channel recipient.
    User(User),
    /// A mentionable role.
    Role(Role),
}

/// A suggestion shown in the mention popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionCandidate {
    /// `username#discriminator`, `username#discriminator | nick`, or a role name.
    pub display: String,
    /// What accepting the suggestion inserts.
    pub target: MentionTarget,
}

impl MentionCandidate {
    /// Canonical wire form of the mention.
    #[must_use]
    pub fn wire_token(&self) -> String {
        match &self.target {
            MentionTarget::User(user) => format!("<@{}>", user.id()),
            MentionTarget::Role(role) => format!("<@&{}>", role.id),
        }
    }

    /// Text placed into the input when the suggestion is accepted.
    ///
    /// Users are inserted in typed form and resolved when the message is sent.
    #[must_use]
    pub fn insertion(&self) -> String {
        match &self.target {
            MentionTarget::User(user) => format!("@{} ", user.tag()),
            MentionTarget::Role(_) => format!("{} ", self.wire_token()),
        }
    }
}

/// Popup state while the user types a mention.
#[derive(Debug, Clone, Default)]
pub struct SuggestionState {
    /// Whether the popup is open.
    pub active: bool,
    /// Text typed after the `@`.
    pub query: String,
    /// Byte offset of the `@` that opened the suggestion.
    pub trigger_index: usize,
    /// Current suggestions, best first.
    pub results: Vec<MentionCandidate>,
    /// Index of the highlighted suggestion.
    pub selected_index: usize,
}

impl SuggestionState {
    /// Highlighted suggestion.
    #[must_use]
    pub fn selected(&self) -> Option<&MentionCandidate> {
        self.results.get(self.selected_index)
    }
}

/// Tracks the `@` trigger in the input and ranks mention candidates.
pub struct MentionSuggester {
    state: SuggestionState,
    searcher: FuzzySearcher,
}

impl Default for MentionSuggester {
    fn default() -> Self {
        Self::new()
    }
}

impl MentionSuggester {
    /// Creates a suggester with a closed popup.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SuggestionState::default(),
            searcher: FuzzySearcher::new(),
        }
    }

    /// Popup state.
    #[must_use]
    pub const fn state(&self) -> &SuggestionState {
        &self.state
    }

    /// Closes the popup.
    pub fn reset(&mut self) {
        self.state.active = false;
        self.state.query.clear();
        self.state.results.clear();
        self.state.selected_index = 0;
    }

    /// Re-evaluates the trigger for `text` with the cursor at byte `cursor`.
    /// Returns true when the suggestion state changed.
    pub fn process_input(&mut self, text: &str, cursor: usize) -> bool {
        let cursor = floor_char_boundary(text, cursor.min(text.len()));
        let before_cursor = &text[..cursor];

        let trigger = before_cursor.rfind('@').filter(|&at| {
            before_cursor[..at]
                .chars()
                .next_back()
                .is_none_or(char::is_whitespace)
        });

        let Some(at) = trigger else {
            return self.deactivate();
        };

        let query = &before_cursor[at + 1..];
        if query.contains('\n') {
            return self.deactivate();
        }

        if self.state.active && self.state.query == query && self.state.trigger_index == at {
            return false;
        }

        self.state.active = true;
        self.state.query = query.to_string();
        self.state.trigger_index = at;
        true
    }

    /// Builds the ranked suggestion list for `channel` from cached data.
    ///
    /// Guild channels offer members (matched by tag and nickname) and roles;
    /// private channels offer their recipients.
    pub fn suggest(&mut self, channel: &Channel, cache: &SessionCache) -> &[MentionCandidate] {
        if !self.state.active {
            self.state.results.clear();
            return &self.state.results;
        }

        let mut candidates = Vec::new();
        let mut keys: Vec<(usize, String)> = Vec::new();

        match channel.guild_id().and_then(|id| cache.guild(id)) {
            Some(guild) => {
                for member in guild.members() {
                    let tag = member.user.tag();
                    let display = match member.nick() {
                        Some(nick) => {
                            keys.push((candidates.len(), nick.to_string()));
                            format!("{tag} | {nick}")
                        }
                        None => tag.clone(),
                    };
                    keys.push((candidates.len(), tag));
                    candidates.push(MentionCandidate {
                        display,
                        target: MentionTarget::User(member.user.clone()),
                    });
                }

                let everyone = guild.id().as_u64();
                for role in guild.roles().iter().filter(|r| r.id.as_u64() != everyone) {
                    keys.push((candidates.len(), role.name.clone()));
                    candidates.push(MentionCandidate {
                        display: role.name.clone(),
                        target: MentionTarget::Role(role.clone()),
                    });
                }
            }
            None => {
                for user in channel.recipients() {
                    keys.push((candidates.len(), user.tag()));
                    candidates.push(MentionCandidate {
                        display: user.tag(),
                        target: MentionTarget::User(user.clone()),
                    });
                }
            }
        }

        let key_texts: Vec<&str> = keys.iter().map(|(_, key)| key.as_str()).collect();
        let mut seen_owners = HashSet::new();
        let mut seen_displays = HashSet::new();
        let mut results = Vec::new();

        for ranked in self.searcher.rank(&self.state.query, &key_texts) {
            let owner = keys[ranked.index].0;
            if !seen_owners.insert(owner) {
                continue;
            }
            let candidate = &candidates[owner];
            if !seen_displays.insert(candidate.display.clone()) {
                continue;
            }
            results.push(candidate.clone());
            if results.len() == MAX_SUGGESTIONS {
                break;
            }
        }

        self.state.results = results;
        if self.state.selected_index >= self.state.results.len() {
            self.state.selected_index = 0;
        }
        &self.state.results
    }

    /// Replaces `@query` in `text` with the candidate's insertion.
    /// Returns the new text and the byte offset for the cursor.
    pub fn apply_selection(
        &mut self,
        text: &str,
        candidate: &MentionCandidate,
    ) -> Option<(String, usize)> {
        if !self.state.active {
            return None;
        }

        let start = self.state.trigger_index;
        let end = start + 1 + self.state.query.len();
        let replaced = text.get(start..end)?;
        if !replaced.starts_with('@') {
            return None;
        }

        let insertion = candidate.insertion();
        let mut updated = String::with_capacity(text.len() + insertion.len());
        updated.push_str(&text[..start]);
        updated.push_str(&insertion);
        updated.push_str(&text[end..]);

        self.reset();
        Some((updated, start + insertion.len()))
    }

    /// Highlights the next suggestion, wrapping around.
    pub fn select_next(&mut self) {
        if self.state.results.is_empty() {
            return;
        }
        self.state.selected_index = (self.state.selected_index + 1) % self.state.results.len();
    }

    /// Highlights the previous suggestion, wrapping around.
    pub fn select_previous(&mut self) {
        if self.state.results.is_empty() {
            return;
        }
        self.state.selected_index = self
            .state
            .selected_index
            .checked_sub(1)
            .unwrap_or(self.state.results.len() - 1);
    }

    fn deactivate(&mut self) -> bool {
        if self.state.active {
            self.reset();
            return true;
        }
        false
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
