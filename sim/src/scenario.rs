//! The JSON scenario format.
//!
//! ```json
//! {
//!   "admin": "0x0000000000000000000000000000000000000001",
//!   "steps": [
//!     { "op": "mint", "to": "0x…02", "amount": 100 },
//!     { "op": "approve", "owner": "0x…02" },
//!     { "op": "stake", "account": "0x…02", "amount": 40 },
//!     { "op": "mine", "blocks": 1 },
//!     { "op": "exit", "account": "0x…02" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use stakemod_types::{Address, Role};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Holds every role at the start.
    pub admin: Address,

    #[serde(default = "default_module")]
    pub module: Address,

    #[serde(default = "default_token")]
    pub token: Address,

    #[serde(default = "default_start_block")]
    pub start_block: u64,

    #[serde(default = "default_start_time")]
    pub start_time: u64,

    pub steps: Vec<Step>,
}

fn default_module() -> Address {
    Address::from_low_u64(0x5_7a4e)
}

fn default_token() -> Address {
    Address::from_low_u64(0x70_4e4e)
}

fn default_start_block() -> u64 {
    1
}

fn default_start_time() -> u64 {
    1_700_000_000
}

/// One scripted action. Amounts are token base units; times are seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Mint { to: Address, amount: u128 },
    /// Unlimited allowance for the module.
    Approve { owner: Address },
    Grant { role: Role, account: Address },
    Revoke { role: Role, account: Address },
    Mine { blocks: u64 },
    /// Move the clock forward, into the next block.
    Advance { secs: u64 },

    Stake { account: Address, amount: u128 },
    StakeFor { caller: Address, beneficiary: Address, amount: u128 },
    RequestWithdrawal { account: Address },
    Exit { account: Address },
    PartialExit { account: Address, amount: u128 },
    Claim { account: Address },
    FullClaimAndExit { account: Address },
    PartialClaimAndExit { account: Address, amount: u128 },
    ClaimFromPlugin { account: Address, plugin: Address },
    ClaimAndExitFor { caller: Address, account: Address, recipient: Address },

    Slash {
        caller: Address,
        account: Address,
        amount: u128,
        collector: Address,
    },
    SetWithdrawDelayAndWindow { caller: Address, delay: u64, window: u64 },

    /// Register a nullable plugin paying out of its own token balance.
    AddPlugin { caller: Address, plugin: Address },
    SetYield { plugin: Address, account: Address, amount: u128 },
    SetPluginFailing { plugin: Address, failing: bool },
    DeactivatePlugin { plugin: Address },
    RemovePlugin { caller: Address, index: usize },

    Rescue { caller: Address, recipient: Address },
}

impl Step {
    /// The `op` tag, for reporting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Approve { .. } => "approve",
            Self::Grant { .. } => "grant",
            Self::Revoke { .. } => "revoke",
            Self::Mine { .. } => "mine",
            Self::Advance { .. } => "advance",
            Self::Stake { .. } => "stake",
            Self::StakeFor { .. } => "stake_for",
            Self::RequestWithdrawal { .. } => "request_withdrawal",
            Self::Exit { .. } => "exit",
            Self::PartialExit { .. } => "partial_exit",
            Self::Claim { .. } => "claim",
            Self::FullClaimAndExit { .. } => "full_claim_and_exit",
            Self::PartialClaimAndExit { .. } => "partial_claim_and_exit",
            Self::ClaimFromPlugin { .. } => "claim_from_plugin",
            Self::ClaimAndExitFor { .. } => "claim_and_exit_for",
            Self::Slash { .. } => "slash",
            Self::SetWithdrawDelayAndWindow { .. } => "set_withdraw_delay_and_window",
            Self::AddPlugin { .. } => "add_plugin",
            Self::SetYield { .. } => "set_yield",
            Self::SetPluginFailing { .. } => "set_plugin_failing",
            Self::DeactivatePlugin { .. } => "deactivate_plugin",
            Self::RemovePlugin { .. } => "remove_plugin",
            Self::Rescue { .. } => "rescue",
        }
    }
}
