//! Nullable token: an in-memory fungible token for testing.

use crate::lock;
use stakemod_staking::{Token, TokenError};
use stakemod_types::Address;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Ledger {
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    total_supply: u128,
    rejecting: bool,
}

/// An in-memory token with allowances.
///
/// An allowance of `u128::MAX` is never decreased. Thread-safe, so it can be
/// shared with the module behind an `Arc`.
pub struct NullToken {
    address: Address,
    state: Mutex<Ledger>,
}

impl NullToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: Mutex::new(Ledger::default()),
        }
    }

    /// Create `amount` new tokens for `to`.
    pub fn mint(&self, to: &Address, amount: u128) {
        let mut state = lock(&self.state);
        *state.balances.entry(*to).or_default() += amount;
        state.total_supply += amount;
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        lock(&self.state)
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        lock(&self.state).total_supply
    }

    /// Make every transfer fail with [`TokenError::Rejected`].
    pub fn set_rejecting(&self, rejecting: bool) {
        lock(&self.state).rejecting = rejecting;
    }
}

impl Ledger {
    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        if self.rejecting {
            return Err(TokenError::Rejected("token is rejecting transfers".into()));
        }
        let available = self.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        self.balances.insert(*from, available - amount);
        *self.balances.entry(*to).or_default() += amount;
        Ok(())
    }
}

impl Token for NullToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: &Address) -> u128 {
        lock(&self.state).balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&self, sender: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        lock(&self.state).move_balance(sender, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let mut state = lock(&self.state);
        let allowed = state
            .allowances
            .get(&(*from, *spender))
            .copied()
            .unwrap_or(0);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                needed: amount,
                allowed,
            });
        }
        state.move_balance(from, to, amount)?;
        if allowed != u128::MAX {
            state.allowances.insert((*from, *spender), allowed - amount);
        }
        Ok(())
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: u128) -> Result<(), TokenError> {
        lock(&self.state).allowances.insert((*owner, *spender), amount);
        Ok(())
    }
}
