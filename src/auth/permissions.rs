// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Atomic permissions.
//!
//! Each permission owns exactly one bit of a [`Role`](super::Role) bitmask.
//! The set is closed: adding a permission means adding a variant here and
//! a bit that no other variant uses.

use serde::Serialize;
use utoipa::ToSchema;

/// A single capability, represented as one set bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum Permission {
    /// Register a new account (anonymous callers only)
    CreateUser = 1 << 0,
    /// Manage one's own tasks
    ModifySelfTasks = 1 << 1,
    /// Full control over every account, including roles and passwords
    ModifyAllUsers = 1 << 2,
    /// View and edit other accounts, without touching roles
    ModifyAllUsersRestricted = 1 << 3,
    /// Read every user's tasks
    ViewAllTasks = 1 << 4,
    /// Edit every user's tasks
    ModifyAllTasks = 1 << 5,
}

impl Permission {
    /// Every permission, in bit order.
    pub const ALL: [Permission; 6] = [
        Permission::CreateUser,
        Permission::ModifySelfTasks,
        Permission::ModifyAllUsers,
        Permission::ModifyAllUsersRestricted,
        Permission::ViewAllTasks,
        Permission::ModifyAllTasks,
    ];

    /// The bit this permission occupies.
    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// Stable lowercase name, used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Permission::CreateUser => "create_user",
            Permission::ModifySelfTasks => "modify_self_tasks",
            Permission::ModifyAllUsers => "modify_all_users",
            Permission::ModifyAllUsersRestricted => "modify_all_users_restricted",
            Permission::ViewAllTasks => "view_all_tasks",
            Permission::ModifyAllTasks => "modify_all_tasks",
        }
    }

    /// Names of every permission whose bit is set in `mask`.
    pub fn names_in(mask: u32) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|p| mask & p.bit() != 0)
            .map(|p| p.name())
            .collect()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_permission_is_a_single_distinct_bit() {
        let mut seen = 0u32;
        for permission in Permission::ALL {
            let bit = permission.bit();
            assert_eq!(bit.count_ones(), 1, "{permission} is not a single bit");
            assert_eq!(seen & bit, 0, "{permission} overlaps another permission");
            seen |= bit;
        }
    }

    #[test]
    fn names_in_lists_set_bits_only() {
        let mask = Permission::CreateUser.bit() | Permission::ViewAllTasks.bit();
        assert_eq!(Permission::names_in(mask), vec!["create_user", "view_all_tasks"]);
        assert!(Permission::names_in(0).is_empty());
    }
}
