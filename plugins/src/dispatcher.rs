//! Failure-isolated fan-out to every registered plugin.
//!
//! Each plugin call runs inside its own boundary: an `Err` return or a panic
//! is captured as a [`PluginFailure`], logged, and the loop moves on to the
//! next plugin. Nothing raised by a plugin ever reaches the caller.

use crate::error::{PluginError, RegistryError};
use crate::plugin::StakeChange;
use crate::registry::PluginRegistry;
use stakemod_types::Address;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// One plugin call that did not go through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginFailure {
    pub plugin: Address,
    pub index: usize,
    pub error: PluginError,
}

/// Outcome of a stake-change notification round.
#[derive(Clone, Debug, Default)]
pub struct NotifyReport {
    /// Plugins that accepted the notification.
    pub notified: usize,
    pub failures: Vec<PluginFailure>,
}

/// Outcome of a claim round.
#[derive(Clone, Debug, Default)]
pub struct ClaimReport {
    /// Sum of all successful payouts.
    pub total: u128,
    /// Non-zero payouts, in registry order.
    pub payouts: Vec<(Address, u128)>,
    pub failures: Vec<PluginFailure>,
}

impl ClaimReport {
    fn record(&mut self, plugin: Address, index: usize, result: Result<u128, PluginError>) {
        let outcome = result.and_then(|payout| {
            self.total
                .checked_add(payout)
                .map(|total| (payout, total))
                .ok_or(PluginError::PayoutOverflow { payout })
        });
        match outcome {
            Ok((payout, total)) => {
                self.total = total;
                if payout > 0 {
                    self.payouts.push((plugin, payout));
                }
            }
            Err(error) => {
                warn!(%plugin, index, %error, "plugin claim failed");
                self.failures.push(PluginFailure {
                    plugin,
                    index,
                    error,
                });
            }
        }
    }
}

/// Run one plugin call, turning a panic into [`PluginError::Panicked`].
pub(crate) fn guarded<T>(call: impl FnOnce() -> Result<T, PluginError>) -> Result<T, PluginError> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(PluginError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl PluginRegistry {
    /// Tell every plugin that wants it about a stake change.
    pub fn notify_stake_change(&mut self, change: &StakeChange) -> NotifyReport {
        let mut report = NotifyReport::default();
        for (index, (address, plugin)) in self.iter_mut().enumerate() {
            let result = guarded(|| {
                if !plugin.requires_notification() {
                    return Ok(false);
                }
                plugin.notify_stake_change(change).map(|()| true)
            });
            match result {
                Ok(true) => report.notified += 1,
                Ok(false) => {}
                Err(error) => {
                    warn!(plugin = %address, index, %error, account = %change.account, "stake change notification failed");
                    report.failures.push(PluginFailure {
                        plugin: address,
                        index,
                        error,
                    });
                }
            }
        }
        debug!(
            account = %change.account,
            before = change.before,
            after = change.after,
            notified = report.notified,
            failed = report.failures.len(),
            "stake change dispatched"
        );
        report
    }

    /// Claim `account`'s yield from every plugin, paying out to `to`.
    ///
    /// `slices[i]` is handed to the plugin at index `i`; missing entries mean
    /// an empty slice.
    pub fn claim_all(&mut self, account: &Address, to: &Address, slices: &[Vec<u8>]) -> ClaimReport {
        let mut report = ClaimReport::default();
        for (index, (address, plugin)) in self.iter_mut().enumerate() {
            let aux = slices.get(index).map(Vec::as_slice).unwrap_or(&[]);
            let result = guarded(|| plugin.claim(account, to, aux));
            report.record(address, index, result);
        }
        debug!(%account, %to, total = report.total, failed = report.failures.len(), "claim fan-out finished");
        report
    }

    /// Claim from a single registered plugin.
    pub fn claim_from(
        &mut self,
        plugin: &Address,
        account: &Address,
        to: &Address,
        aux: &[u8],
    ) -> Result<ClaimReport, RegistryError> {
        let index = self
            .index_of(plugin)
            .ok_or(RegistryError::InvalidPlugin(*plugin))?;
        let target = self
            .get_mut(index)
            .ok_or(RegistryError::InvalidPlugin(*plugin))?;
        let result = guarded(|| target.claim(account, to, aux));
        let mut report = ClaimReport::default();
        report.record(*plugin, index, result);
        Ok(report)
    }

    /// Total yield `account` could claim right now. Failing plugins count as zero.
    pub fn claimable(&self, account: &Address, slices: &[Vec<u8>]) -> u128 {
        self.iter()
            .enumerate()
            .map(|(index, (address, plugin))| {
                let aux = slices.get(index).map(Vec::as_slice).unwrap_or(&[]);
                guarded(|| plugin.claimable(account, aux)).unwrap_or_else(|error| {
                    debug!(plugin = %address, %error, "claimable query failed");
                    0
                })
            })
            .fold(0u128, |acc, amount| acc.saturating_add(amount))
    }
}
