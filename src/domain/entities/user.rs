use serde::{Deserialize, Serialize};

snowflake_id!(
    /// Unique identifier for a Discord user.
    UserId
);

/// Paid subscription tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum PremiumType {
    #[default]
    None,
    NitroClassic,
    Nitro,
    NitroBasic,
}

impl From<u8> for PremiumType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::NitroClassic,
            2 => Self::Nitro,
            3 => Self::NitroBasic,
            _ => Self::None,
        }
    }
}

impl PremiumType {
    /// Returns true if the tier may send any custom emoji, animated ones included.
    #[must_use]
    pub const fn can_use_any_emoji(self) -> bool {
        matches!(self, Self::NitroClassic | Self::Nitro)
    }
}

/// Discord user information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: String,
    discriminator: String,
    #[serde(default)]
    global_name: Option<String>,
    #[serde(default)]
    bot: bool,
    #[serde(default)]
    premium_type: PremiumType,
}

impl User {
    /// Creates a non-bot user without a subscription.
    #[must_use]
    pub fn new(
        id: impl Into<UserId>,
        username: impl Into<String>,
        discriminator: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            discriminator: discriminator.into(),
            global_name: None,
            bot: false,
            premium_type: PremiumType::None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_global_name(mut self, name: impl Into<String>) -> Self {
        self.global_name = Some(name.into());
        self
    }

    /// Sets the subscription tier.
    #[must_use]
    pub const fn with_premium(mut self, premium_type: PremiumType) -> Self {
        self.premium_type = premium_type;
        self
    }

    /// Sets whether the user is a bot.
    #[must_use]
    pub const fn with_bot(mut self, bot: bool) -> Self {
        self.bot = bot;
        self
    }

    /// Returns the user ID.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the discriminator.
    #[must_use]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Returns the display name, if set.
    #[must_use]
    pub fn global_name(&self) -> Option<&str> {
        self.global_name.as_deref()
    }

    /// Returns true for bot accounts.
    #[must_use]
    pub const fn is_bot(&self) -> bool {
        self.bot
    }

    /// Returns the subscription tier.
    #[must_use]
    pub const fn premium_type(&self) -> PremiumType {
        self.premium_type
    }

    /// Returns the `username#discriminator` form used in typed mentions.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag() {
        let user = User::new(1_u64, "alice", "0001");
        assert_eq!(user.tag(), "alice#0001");
    }

    #[test]
    fn test_premium_entitlement() {
        assert!(PremiumType::Nitro.can_use_any_emoji());
        assert!(PremiumType::NitroClassic.can_use_any_emoji());
        assert!(!PremiumType::NitroBasic.can_use_any_emoji());
        assert!(!PremiumType::from(0).can_use_any_emoji());
    }
}
