//! The staking module.
//!
//! Accounts lock tokens here; the module keeps a checkpointed record of every
//! stake so that balances at any past block can be proven, gates withdrawals
//! behind a request → delay → window sequence, lets a slasher confiscate
//! stake, and keeps a set of yield plugins informed.
//!
//! Plugins are untrusted. Their failures are reported as events and never
//! abort a ledger operation. Every other failure aborts the whole call
//! before the ledger changes.

pub mod access;
pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod module;
pub mod token;
pub mod withdrawal;

pub use access::{AccessControl, RoleTable};
pub use config::StakingConfig;
pub use error::StakingError;
pub use event::StakingEvent;
pub use ledger::{BalanceUpdate, Ledger};
pub use module::{ExitReceipt, StakingModule};
pub use token::{Token, TokenError};
pub use withdrawal::{WithdrawalBounds, WithdrawalGate, WithdrawalPolicy, WithdrawalState};
