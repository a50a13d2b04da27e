//! Role-based access control.

use crate::error::StakingError;
use stakemod_types::{Address, Role};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

/// Answers "does `account` hold `role`?".
pub trait AccessControl: Send + Sync {
    fn has_role(&self, role: Role, account: &Address) -> bool;

    /// Fail with [`StakingError::MissingRole`] unless `account` holds `role`.
    fn check_role(&self, role: Role, account: &Address) -> Result<(), StakingError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(StakingError::MissingRole {
                account: *account,
                role,
            })
        }
    }
}

/// In-memory role assignments with enumerable members.
///
/// Only admins grant and revoke, the admin role included. Members are kept in
/// grant order so they can be listed by index.
pub struct RoleTable {
    members: RwLock<HashMap<Role, Vec<Address>>>,
}

impl RoleTable {
    /// A table where `admin` holds the admin role and nothing else is assigned.
    pub fn new(admin: Address) -> Self {
        let mut members = HashMap::new();
        members.insert(Role::Admin, vec![admin]);
        Self {
            members: RwLock::new(members),
        }
    }

    pub fn grant_role(&self, caller: &Address, role: Role, account: Address) -> Result<(), StakingError> {
        self.check_role(Role::Admin, caller)?;
        let mut members = self.members.write().unwrap_or_else(|e| e.into_inner());
        let holders = members.entry(role).or_default();
        if !holders.contains(&account) {
            holders.push(account);
            info!(%role, %account, by = %caller, "role granted");
        }
        Ok(())
    }

    pub fn revoke_role(&self, caller: &Address, role: Role, account: &Address) -> Result<(), StakingError> {
        self.check_role(Role::Admin, caller)?;
        self.remove_member(role, account);
        Ok(())
    }

    /// Give up a role. `account` must be the caller.
    pub fn renounce_role(&self, caller: &Address, role: Role, account: &Address) -> Result<(), StakingError> {
        if caller != account {
            return Err(StakingError::RenounceOnlySelf(*caller));
        }
        self.remove_member(role, account);
        Ok(())
    }

    pub fn role_member_count(&self, role: Role) -> usize {
        self.members
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&role)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn role_member(&self, role: Role, index: usize) -> Option<Address> {
        self.members
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&role)
            .and_then(|holders| holders.get(index).copied())
    }

    fn remove_member(&self, role: Role, account: &Address) {
        let mut members = self.members.write().unwrap_or_else(|e| e.into_inner());
        if let Some(holders) = members.get_mut(&role) {
            if let Some(pos) = holders.iter().position(|a| a == account) {
                holders.remove(pos);
                info!(%role, %account, "role revoked");
            }
        }
    }
}

impl AccessControl for RoleTable {
    fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&role)
            .is_some_and(|holders| holders.contains(account))
    }
}
