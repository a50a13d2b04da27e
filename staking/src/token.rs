//! The fungible token the module stakes, seen from the outside.

use crate::error::StakingError;
use stakemod_types::Address;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient token balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, allowed {allowed}")]
    InsufficientAllowance { needed: u128, allowed: u128 },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// Token collaborator. The caller of each operation is passed explicitly.
///
/// Implementations must be atomic: an `Err` means no balance moved.
pub trait Token: Send + Sync {
    fn address(&self) -> Address;

    fn balance_of(&self, account: &Address) -> u128;

    /// Move `amount` from `sender` to `to`.
    fn transfer(&self, sender: &Address, to: &Address, amount: u128) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to` using `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError>;

    fn approve(&self, owner: &Address, spender: &Address, amount: u128) -> Result<(), TokenError>;
}

impl From<TokenError> for StakingError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InsufficientBalance { needed, available } => StakingError::InsufficientFunds {
                requested: needed,
                available,
            },
            other => StakingError::NotApproved(other.to_string()),
        }
    }
}
