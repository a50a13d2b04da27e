//! Per-account and global checkpoint histories.

use crate::error::CheckpointError;
use crate::history::{Checkpoint, CheckpointHistory};
use stakemod_types::{Address, BlockHeight};
use std::collections::HashMap;

/// Checkpoint histories for every account plus one for the total supply.
///
/// Only the staking ledger writes here.
#[derive(Clone, Debug, Default)]
pub struct CheckpointStore {
    accounts: HashMap<Address, CheckpointHistory>,
    global: CheckpointHistory,
}

impl CheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an account's new balance at `block`.
    pub fn write_account(
        &mut self,
        account: &Address,
        value: u128,
        block: BlockHeight,
    ) -> Result<(), CheckpointError> {
        self.accounts.entry(*account).or_default().write(value, block)
    }

    /// Record the new total supply at `block`.
    pub fn write_global(&mut self, value: u128, block: BlockHeight) -> Result<(), CheckpointError> {
        self.global.write(value, block)
    }

    /// An account's balance as of `query`, which must be strictly before `current`.
    pub fn account_value_at(
        &self,
        account: &Address,
        query: BlockHeight,
        current: BlockHeight,
    ) -> Result<u128, CheckpointError> {
        ensure_past(query, current)?;
        Ok(self
            .accounts
            .get(account)
            .map(|h| h.value_at(query))
            .unwrap_or(0))
    }

    /// Total supply as of `query`, which must be strictly before `current`.
    pub fn global_value_at(
        &self,
        query: BlockHeight,
        current: BlockHeight,
    ) -> Result<u128, CheckpointError> {
        ensure_past(query, current)?;
        Ok(self.global.value_at(query))
    }

    /// An account's most recent checkpoint.
    pub fn latest_account(&self, account: &Address) -> Option<&Checkpoint> {
        self.accounts.get(account).and_then(|h| h.latest())
    }

    pub fn latest_global(&self) -> Option<&Checkpoint> {
        self.global.latest()
    }

    pub fn account_history(&self, account: &Address) -> Option<&CheckpointHistory> {
        self.accounts.get(account)
    }

    pub fn global_history(&self) -> &CheckpointHistory {
        &self.global
    }

    /// Number of accounts that have ever been checkpointed.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

fn ensure_past(query: BlockHeight, current: BlockHeight) -> Result<(), CheckpointError> {
    if query >= current {
        return Err(CheckpointError::FutureQuery { query, current });
    }
    Ok(())
}
