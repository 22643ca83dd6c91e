//! Outgoing text rewriting configured through `[[compose.replacements]]`.

use regex::Regex;
use tracing::{debug, warn};

use crate::domain::ports::ScriptHook;
use crate::infrastructure::config::ReplacementRule;

/// Applies each configured regex rewrite in order.
#[derive(Debug, Clone, Default)]
pub struct RegexReplacementHook {
    rules: Vec<(Regex, String)>,
}

impl RegexReplacementHook {
    /// Compiles the rules. Rules with an invalid pattern are skipped.
    #[must_use]
    pub fn new(rules: &[ReplacementRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match Regex::new(&rule.pattern) {
                Ok(regex) => Some((regex, rule.replacement.clone())),
                Err(e) => {
                    warn!(pattern = %rule.pattern, error = %e, "Skipping invalid replacement rule");
                    None
                }
            })
            .collect::<Vec<_>>();
        debug!(count = rules.len(), "Replacement rules compiled");
        Self { rules }
    }

    /// Number of rules that compiled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rule compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl ScriptHook for RegexReplacementHook {
    fn on_message_send(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, (regex, replacement)| {
                regex.replace_all(&acc, replacement.as_str()).into_owned()
            })
    }
}
