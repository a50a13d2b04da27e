//! The plugin capability trait.

use crate::error::PluginError;
use serde::{Deserialize, Serialize};
use stakemod_types::{Address, BlockHeight};

/// A stake change as seen by plugins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeChange {
    pub account: Address,
    pub before: u128,
    pub after: u128,
    pub block: BlockHeight,
}

/// A yield source attached to the staking module.
///
/// Implementations must be atomic per call: returning `Err` means the call
/// had no effect. The dispatcher also traps panics, but cannot roll back
/// whatever a panicking plugin did to its own state.
pub trait Plugin: Send {
    /// Stable identity of this plugin.
    fn address(&self) -> Address;

    /// Capability probe. Plugins answering `false` cannot be registered.
    fn supports_interface(&self) -> bool {
        true
    }

    /// A deactivated plugin pays out what it owes but accrues nothing new.
    /// Only deactivated plugins can be removed from the registry.
    fn deactivated(&self) -> bool;

    /// Whether the plugin wants [`Plugin::notify_stake_change`] calls.
    fn requires_notification(&self) -> bool {
        true
    }

    /// Called after every stake change, once the ledger has been updated.
    fn notify_stake_change(&mut self, change: &StakeChange) -> Result<(), PluginError>;

    /// Pay `account`'s yield to `to`. Returns the amount paid.
    fn claim(&mut self, account: &Address, to: &Address, aux: &[u8]) -> Result<u128, PluginError>;

    /// What [`Plugin::claim`] would pay right now.
    fn claimable(&self, account: &Address, aux: &[u8]) -> Result<u128, PluginError>;
}

impl std::fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
