//! Observable side effects of module operations.

use serde::{Deserialize, Serialize};
use stakemod_types::Address;

/// Events queued by the module and drained by its owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StakingEvent {
    /// An account's stake changed.
    StakeChanged {
        account: Address,
        old_stake: u128,
        new_stake: u128,
    },
    /// Stake was confiscated and sent to `collector`.
    Slashed {
        account: Address,
        amount: u128,
        collector: Address,
    },
    /// Plugins paid out yield for `account`.
    Claimed { account: Address, amount: u128 },
    PluginAdded { plugin: Address, index: usize },
    PluginRemoved { plugin: Address },
    /// A plugin failed to process a stake change. The stake change still happened.
    StakeChangeNotificationFailed { plugin: Address },
    /// A plugin failed to pay out. Other plugins still paid.
    PluginClaimFailed { plugin: Address },
    WithdrawalRequested { account: Address, requested_at: u64 },
    WithdrawDelayAndWindowChanged { delay: u64, window: u64 },
    TokensRescued {
        token: Address,
        recipient: Address,
        amount: u128,
    },
}
