use crate::domain::entities::{Channel, Guild, Member, OverwriteKind, Permissions};

/// Effective permission computation following role and overwrite precedence.
pub struct PermissionCalculator;

impl PermissionCalculator {
    /// Effective channel permissions of `member`: `@everyone` role, member
    /// roles, then the `@everyone`, role and member overwrites in that order.
    #[must_use]
    pub fn compute_permissions(guild: &Guild, channel: &Channel, member: &Member) -> Permissions {
        let guild_id = guild.id().as_u64();
        let roles = guild.roles();
        let mut permissions = Permissions::empty();

        if let Some(everyone_role) = roles.iter().find(|r| r.id.as_u64() == guild_id) {
            permissions = everyone_role.permissions;
        }

        for role_id in member.roles() {
            if let Some(role) = roles.iter().find(|r| r.id == *role_id) {
                permissions |= role.permissions;
            }
        }

        if permissions.contains(Permissions::ADMINISTRATOR) {
            return Permissions::all();
        }

        let overwrites = channel.permission_overwrites();

        if let Some(overwrite) = overwrites
            .iter()
            .find(|o| o.kind == OverwriteKind::Role && o.id == guild_id)
        {
            permissions &= !overwrite.deny;
            permissions |= overwrite.allow;
        }

        let mut role_allow = Permissions::empty();
        let mut role_deny = Permissions::empty();

        for role_id in member.roles() {
            if let Some(overwrite) = overwrites
                .iter()
                .find(|o| o.kind == OverwriteKind::Role && o.id == role_id.as_u64())
            {
                role_allow |= overwrite.allow;
                role_deny |= overwrite.deny;
            }
        }

        permissions &= !role_deny;
        permissions |= role_allow;

        let user_id = member.user_id().as_u64();
        if let Some(overwrite) = overwrites
            .iter()
            .find(|o| o.kind == OverwriteKind::Member && o.id == user_id)
        {
            permissions &= !overwrite.deny;
            permissions |= overwrite.allow;
        }

        permissions
    }

    /// Whether `member` may view `channel`.
    #[must_use]
    pub fn can_read(guild: &Guild, channel: &Channel, member: &Member) -> bool {
        Self::compute_permissions(guild, channel, member).can_read()
    }
}
