//! Stake balances with checkpointed history.
//!
//! Mutations happen in two steps. `prepare_*` checks everything that can go
//! wrong and returns a [`BalanceUpdate`]; `apply` commits it. The module
//! moves tokens between the two, so a failed transfer leaves the ledger
//! untouched.

use crate::error::StakingError;
use serde::{Deserialize, Serialize};
use stakemod_checkpoint::{CheckpointError, CheckpointStore};
use stakemod_plugins::StakeChange;
use stakemod_types::{Address, BlockHeight};
use std::collections::HashMap;
use tracing::debug;

/// A validated balance change, ready to commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub account: Address,
    pub before: u128,
    pub after: u128,
    pub total_after: u128,
    pub block: BlockHeight,
}

impl BalanceUpdate {
    /// How plugins see this update.
    pub fn as_stake_change(&self) -> StakeChange {
        StakeChange {
            account: self.account,
            before: self.before,
            after: self.after,
            block: self.block,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Ledger {
    balances: HashMap<Address, u128>,
    total_staked: u128,
    checkpoints: CheckpointStore,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare_increase(
        &self,
        account: &Address,
        amount: u128,
        block: BlockHeight,
    ) -> Result<BalanceUpdate, StakingError> {
        self.ensure_writable(account, block)?;
        let before = self.staked_by(account);
        let after = before.checked_add(amount).ok_or(StakingError::Overflow)?;
        let total_after = self
            .total_staked
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;
        Ok(BalanceUpdate {
            account: *account,
            before,
            after,
            total_after,
            block,
        })
    }

    pub fn prepare_decrease(
        &self,
        account: &Address,
        amount: u128,
        block: BlockHeight,
    ) -> Result<BalanceUpdate, StakingError> {
        self.ensure_writable(account, block)?;
        let before = self.staked_by(account);
        let after = before
            .checked_sub(amount)
            .ok_or(StakingError::InsufficientBalance {
                account: *account,
                requested: amount,
                available: before,
            })?;
        // The total covers every balance, so this only fails if the ledger is corrupt.
        let total_after = self
            .total_staked
            .checked_sub(amount)
            .ok_or(StakingError::Overflow)?;
        Ok(BalanceUpdate {
            account: *account,
            before,
            after,
            total_after,
            block,
        })
    }

    /// Commit a prepared update.
    ///
    /// The update must have been prepared against the current state; a stale
    /// one is rejected before anything is written.
    pub fn apply(&mut self, update: &BalanceUpdate) -> Result<(), StakingError> {
        if self.staked_by(&update.account) != update.before {
            return Err(StakingError::StaleUpdate(update.account));
        }
        self.ensure_writable(&update.account, update.block)?;

        self.checkpoints
            .write_account(&update.account, update.after, update.block)?;
        self.checkpoints
            .write_global(update.total_after, update.block)?;
        if update.after == 0 {
            self.balances.remove(&update.account);
        } else {
            self.balances.insert(update.account, update.after);
        }
        self.total_staked = update.total_after;

        debug!(
            account = %update.account,
            before = update.before,
            after = update.after,
            total = update.total_after,
            block = %update.block,
            "stake balance updated"
        );
        Ok(())
    }

    /// Block of the account's last stake change, if any.
    pub fn last_mutation_block(&self, account: &Address) -> Option<BlockHeight> {
        self.checkpoints.latest_account(account).map(|c| c.block)
    }

    pub fn staked_by(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn staked_by_at(
        &self,
        account: &Address,
        block: BlockHeight,
        current: BlockHeight,
    ) -> Result<u128, StakingError> {
        Ok(self.checkpoints.account_value_at(account, block, current)?)
    }

    pub fn total_staked(&self) -> u128 {
        self.total_staked
    }

    pub fn total_staked_at(
        &self,
        block: BlockHeight,
        current: BlockHeight,
    ) -> Result<u128, StakingError> {
        Ok(self.checkpoints.global_value_at(block, current)?)
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Accounts with a non-zero stake.
    pub fn stakers(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter()
    }

    /// Both checkpoint histories must accept a write at `block`.
    fn ensure_writable(&self, account: &Address, block: BlockHeight) -> Result<(), StakingError> {
        let latest = [
            self.checkpoints.latest_account(account),
            self.checkpoints.latest_global(),
        ];
        for last in latest.into_iter().flatten() {
            if last.block > block {
                return Err(CheckpointError::NonMonotonicIndex {
                    last: last.block,
                    attempted: block,
                }
                .into());
            }
        }
        Ok(())
    }
}
