//! Nullable plugin: a scriptable yield source for testing.

use crate::lock;
use stakemod_plugins::{Plugin, PluginError, StakeChange};
use stakemod_staking::Token;
use stakemod_types::Address;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One successful claim as seen by the plugin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimRecord {
    pub account: Address,
    pub to: Address,
    pub aux: Vec<u8>,
    pub amount: u128,
}

struct State {
    supports_interface: bool,
    deactivated: bool,
    requires_notification: bool,
    reverting: bool,
    panicking: bool,
    yields: HashMap<Address, u128>,
    notifications: Vec<StakeChange>,
    claims: Vec<ClaimRecord>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            supports_interface: true,
            deactivated: false,
            requires_notification: true,
            reverting: false,
            panicking: false,
            yields: HashMap::new(),
            notifications: Vec::new(),
            claims: Vec::new(),
        }
    }
}

/// A plugin whose behaviour tests control through a [`NullPluginHandle`].
///
/// Yield is set per account with [`NullPluginHandle::set_yield`] and paid
/// out in full on claim. With a funding token the payout is a real transfer
/// from the plugin's own address.
pub struct NullPlugin {
    address: Address,
    funding: Option<Arc<dyn Token>>,
    state: Arc<Mutex<State>>,
}

/// Shared control over a [`NullPlugin`] that has been handed to a registry.
#[derive(Clone)]
pub struct NullPluginHandle {
    address: Address,
    state: Arc<Mutex<State>>,
}

impl NullPlugin {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            funding: None,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Pay claims in `token` from the plugin's address.
    pub fn with_funding(mut self, token: Arc<dyn Token>) -> Self {
        self.funding = Some(token);
        self
    }

    pub fn handle(&self) -> NullPluginHandle {
        NullPluginHandle {
            address: self.address,
            state: Arc::clone(&self.state),
        }
    }

    /// Box it for registration, keeping a handle.
    pub fn boxed(self) -> (Box<dyn Plugin>, NullPluginHandle) {
        let handle = self.handle();
        (Box::new(self), handle)
    }
}

impl NullPluginHandle {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn set_supports_interface(&self, supported: bool) {
        lock(&self.state).supports_interface = supported;
    }

    pub fn set_deactivated(&self, deactivated: bool) {
        lock(&self.state).deactivated = deactivated;
    }

    pub fn set_requires_notification(&self, required: bool) {
        lock(&self.state).requires_notification = required;
    }

    /// Make every call return an error.
    pub fn set_reverting(&self, reverting: bool) {
        lock(&self.state).reverting = reverting;
    }

    /// Make every call panic.
    pub fn set_panicking(&self, panicking: bool) {
        lock(&self.state).panicking = panicking;
    }

    pub fn set_yield(&self, account: &Address, amount: u128) {
        lock(&self.state).yields.insert(*account, amount);
    }

    pub fn notifications(&self) -> Vec<StakeChange> {
        lock(&self.state).notifications.clone()
    }

    pub fn claims(&self) -> Vec<ClaimRecord> {
        lock(&self.state).claims.clone()
    }
}

impl State {
    fn check(&self, call: &str) -> Result<(), PluginError> {
        if self.panicking {
            panic!("null plugin panicked in {call}");
        }
        if self.reverting {
            return Err(PluginError::Reverted(format!("null plugin reverted in {call}")));
        }
        Ok(())
    }
}

impl Plugin for NullPlugin {
    fn address(&self) -> Address {
        self.address
    }

    fn supports_interface(&self) -> bool {
        let state = lock(&self.state);
        state.supports_interface && !state.reverting && !state.panicking
    }

    fn deactivated(&self) -> bool {
        lock(&self.state).deactivated
    }

    fn requires_notification(&self) -> bool {
        lock(&self.state).requires_notification
    }

    fn notify_stake_change(&mut self, change: &StakeChange) -> Result<(), PluginError> {
        let mut state = lock(&self.state);
        state.check("notify_stake_change")?;
        state.notifications.push(*change);
        Ok(())
    }

    fn claim(&mut self, account: &Address, to: &Address, aux: &[u8]) -> Result<u128, PluginError> {
        let mut state = lock(&self.state);
        state.check("claim")?;
        let amount = state.yields.get(account).copied().unwrap_or(0);
        if amount > 0 {
            if let Some(token) = &self.funding {
                token
                    .transfer(&self.address, to, amount)
                    .map_err(|e| PluginError::Reverted(e.to_string()))?;
            }
        }
        state.yields.remove(account);
        state.claims.push(ClaimRecord {
            account: *account,
            to: *to,
            aux: aux.to_vec(),
            amount,
        });
        Ok(amount)
    }

    fn claimable(&self, account: &Address, _aux: &[u8]) -> Result<u128, PluginError> {
        let state = lock(&self.state);
        state.check("claimable")?;
        Ok(state.yields.get(account).copied().unwrap_or(0))
    }
}
