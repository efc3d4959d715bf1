// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::permissions::Permission;

/// A role is the union of the permissions it grants.
///
/// ## Role Hierarchy
///
/// - `ANON` - may only register an account (disjoint from the chain below)
/// - `USER` - manages its own tasks
/// - `MANAGER` - `USER` plus restricted management of other accounts
/// - `ADMIN` - `MANAGER` plus full account and task control
///
/// Roles travel and persist as a plain integer. Any integer is a valid
/// role: bits with no matching permission are simply never granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Role(u32);

impl Role {
    /// Role with no permissions at all.
    pub const NONE: Role = Role(0);

    /// Unauthenticated caller.
    pub const ANON: Role = Role::NONE.with(Permission::CreateUser);

    /// Regular account.
    pub const USER: Role = Role::NONE.with(Permission::ModifySelfTasks);

    /// Account manager.
    pub const MANAGER: Role = Role::USER
        .with(Permission::ModifyAllUsersRestricted)
        .with(Permission::ViewAllTasks);

    /// Administrator.
    pub const ADMIN: Role = Role::MANAGER
        .with(Permission::ModifyAllUsers)
        .with(Permission::ModifyAllTasks);

    /// Wrap a raw bitmask.
    pub const fn from_bits(bits: u32) -> Self {
        Role(bits)
    }

    /// The raw bitmask.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// This role extended with one more permission.
    pub const fn with(self, permission: Permission) -> Self {
        Role(self.0 | permission.bit())
    }

    /// Check whether this role grants `permission`.
    ///
    /// Fails closed: an empty or unrecognized mask grants nothing.
    pub const fn has_permission(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// Name of a built-in role, if this mask is exactly one of them.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Role::ANON => Some("anon"),
            Role::USER => Some("user"),
            Role::MANAGER => Some("manager"),
            Role::ADMIN => Some("admin"),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is User (least privilege for registered accounts).
    fn default() -> Self {
        Role::USER
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "custom({})", Permission::names_in(self.0).join("|")),
        }
    }
}

/// Check whether `role` grants `permission`.
pub fn has_permission(role: Role, permission: Permission) -> bool {
    role.has_permission(permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted(role: Role) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| has_permission(role, *p))
            .collect()
    }

    #[test]
    fn anon_can_only_create_users() {
        assert_eq!(granted(Role::ANON), vec![Permission::CreateUser]);
        assert!(!has_permission(Role::ANON, Permission::ModifySelfTasks));
    }

    #[test]
    fn user_only_modifies_own_tasks() {
        assert_eq!(granted(Role::USER), vec![Permission::ModifySelfTasks]);
        assert!(!has_permission(Role::USER, Permission::ModifyAllUsers));
    }

    #[test]
    fn manager_extends_user() {
        assert_eq!(
            granted(Role::MANAGER),
            vec![
                Permission::ModifySelfTasks,
                Permission::ModifyAllUsersRestricted,
                Permission::ViewAllTasks,
            ]
        );
        assert!(!has_permission(Role::MANAGER, Permission::ModifyAllUsers));
        assert!(!has_permission(Role::MANAGER, Permission::ModifyAllTasks));
    }

    #[test]
    fn admin_has_everything_but_create_user() {
        for permission in Permission::ALL {
            let expected = permission != Permission::CreateUser;
            assert_eq!(has_permission(Role::ADMIN, permission), expected, "{permission}");
        }
        assert!(has_permission(Role::ADMIN, Permission::ModifyAllTasks));
    }

    #[test]
    fn composition_is_monotonic() {
        let includes = |higher: Role, lower: Role| higher.bits() & lower.bits() == lower.bits();
        assert!(includes(Role::MANAGER, Role::USER));
        assert!(includes(Role::ADMIN, Role::MANAGER));
        assert!(includes(Role::ADMIN, Role::USER));
        assert!(!includes(Role::USER, Role::MANAGER));
        assert_eq!(Role::ANON.bits() & Role::ADMIN.bits(), 0);
    }

    #[test]
    fn unknown_and_empty_masks_fail_closed() {
        for permission in Permission::ALL {
            assert!(!has_permission(Role::NONE, permission));
            assert!(!has_permission(Role::from_bits(1 << 20), permission));
        }
        // unknown bits don't hide known ones
        let mixed = Role::from_bits(Role::USER.bits() | (1 << 30));
        assert!(has_permission(mixed, Permission::ModifySelfTasks));
    }

    #[test]
    fn serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Role::ADMIN).unwrap(), Role::ADMIN.bits().to_string());
        let role: Role = serde_json::from_str("1337").unwrap();
        assert_eq!(role.bits(), 1337);
    }

    #[test]
    fn display_names_builtin_roles() {
        assert_eq!(Role::ADMIN.to_string(), "admin");
        assert_eq!(Role::ANON.to_string(), "anon");
        assert_eq!(
            Role::from_bits(Permission::ViewAllTasks.bit()).to_string(),
            "custom(view_all_tasks)"
        );
    }

    #[test]
    fn default_role_is_user() {
        assert_eq!(Role::default(), Role::USER);
    }
}
