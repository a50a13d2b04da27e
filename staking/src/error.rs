//! Staking module errors. Any of these aborts the whole call.

use stakemod_checkpoint::CheckpointError;
use stakemod_plugins::RegistryError;
use stakemod_types::{Address, BlockHeight, Role};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StakingError {
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u128, available: u128 },

    #[error("token transfer not approved: {0}")]
    NotApproved(String),

    #[error("account {account} has insufficient balance: requested {requested}, staked {available}")]
    InsufficientBalance {
        account: Address,
        requested: u128,
        available: u128,
    },

    #[error("cannot exit in block {block}: account {account} already staked or exited in it")]
    SameUnitExit { account: Address, block: BlockHeight },

    #[error("withdrawal for {0} not requested yet, or it is too early or too late to withdraw")]
    WithdrawalNotReady(Address),

    #[error("withdrawal delay {delay}s exceeds the maximum of {max}s")]
    DelayTooLong { delay: u64, max: u64 },

    #[error("withdrawal window {window}s is shorter than the minimum of {min}s")]
    WindowTooShort { window: u64, min: u64 },

    #[error("withdrawal delay + window ({total}s) exceeds the maximum of {max}s")]
    WindowPlusDelayTooLarge { total: u64, max: u64 },

    #[error("account {account} is missing role {role}")]
    MissingRole { account: Address, role: Role },

    #[error("account {0} may only renounce roles for itself")]
    RenounceOnlySelf(Address),

    #[error("arithmetic overflow in staking computation")]
    Overflow,

    #[error("balance of {0} changed after the update was prepared")]
    StaleUpdate(Address),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
