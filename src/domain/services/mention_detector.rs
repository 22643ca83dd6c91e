use crate::domain::entities::{Message, RoleId, UserId};

/// Decides whether a message pings the local user.
pub struct MentionDetector;

impl MentionDetector {
    /// Explicit user mentions always count. Role mentions count only for roles
    /// the local member holds; `@everyone`/`@here` count unless suppressed.
    #[must_use]
    pub fn mentions_local_user(
        message: &Message,
        local_user: UserId,
        local_roles: &[RoleId],
        everyone_suppressed: bool,
    ) -> bool {
        if message.mentions_user(local_user) {
            return true;
        }

        if message
            .mention_roles()
            .iter()
            .any(|role| local_roles.contains(role))
        {
            return true;
        }

        message.mention_everyone() && !everyone_suppressed
    }
}
