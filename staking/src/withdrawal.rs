//! Delayed-withdrawal gate.
//!
//! With a non-zero delay, an account must call `request_withdrawal` and then
//! wait: claims and exits are allowed only from `requested_at + delay` up to
//! and including `requested_at + delay + window`. A successful claim or exit
//! consumes the request. A zero delay disables the gate entirely.

use crate::error::StakingError;
use serde::{Deserialize, Serialize};
use stakemod_types::{Address, Timestamp};
use std::collections::HashMap;

/// Limits the slasher must respect when changing the policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalBounds {
    pub max_delay: u64,
    pub min_window: u64,
    /// Upper bound on `delay + window`.
    pub max_total: u64,
}

impl WithdrawalBounds {
    pub fn check(&self, policy: &WithdrawalPolicy) -> Result<(), StakingError> {
        if policy.delay > self.max_delay {
            return Err(StakingError::DelayTooLong {
                delay: policy.delay,
                max: self.max_delay,
            });
        }
        if policy.window < self.min_window {
            return Err(StakingError::WindowTooShort {
                window: policy.window,
                min: self.min_window,
            });
        }
        let total = policy
            .delay
            .checked_add(policy.window)
            .ok_or(StakingError::WindowPlusDelayTooLarge {
                total: u64::MAX,
                max: self.max_total,
            })?;
        if total > self.max_total {
            return Err(StakingError::WindowPlusDelayTooLarge {
                total,
                max: self.max_total,
            });
        }
        Ok(())
    }
}

/// Current delay and window, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalPolicy {
    pub delay: u64,
    pub window: u64,
}

impl WithdrawalPolicy {
    pub fn is_disabled(&self) -> bool {
        self.delay == 0
    }
}

/// Where an account stands in the withdrawal sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalState {
    /// Delay is zero; every account may withdraw at any time.
    Disabled,
    NoRequest,
    Pending { opens_at: Timestamp },
    Claimable { closes_at: Timestamp },
    Expired { closed_at: Timestamp },
}

impl WithdrawalState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Disabled | Self::Claimable { .. })
    }
}

pub struct WithdrawalGate {
    bounds: WithdrawalBounds,
    policy: WithdrawalPolicy,
    requests: HashMap<Address, Timestamp>,
}

impl WithdrawalGate {
    /// A gate with the given bounds and the gate disabled.
    pub fn new(bounds: WithdrawalBounds) -> Self {
        Self {
            bounds,
            policy: WithdrawalPolicy::default(),
            requests: HashMap::new(),
        }
    }

    pub fn bounds(&self) -> &WithdrawalBounds {
        &self.bounds
    }

    pub fn policy(&self) -> &WithdrawalPolicy {
        &self.policy
    }

    /// Replace the delay and window after checking them against the bounds.
    ///
    /// Pending requests are evaluated against the new policy from now on.
    pub fn set_policy(&mut self, delay: u64, window: u64) -> Result<(), StakingError> {
        let policy = WithdrawalPolicy { delay, window };
        self.bounds.check(&policy)?;
        self.policy = policy;
        Ok(())
    }

    /// Record a withdrawal request, replacing any earlier one.
    pub fn request(&mut self, account: Address, now: Timestamp) {
        self.requests.insert(account, now);
    }

    pub fn requested_at(&self, account: &Address) -> Option<Timestamp> {
        self.requests.get(account).copied()
    }

    pub fn state(&self, account: &Address, now: Timestamp) -> WithdrawalState {
        if self.policy.is_disabled() {
            return WithdrawalState::Disabled;
        }
        let Some(requested_at) = self.requested_at(account) else {
            return WithdrawalState::NoRequest;
        };
        let opens_at = requested_at.saturating_add(self.policy.delay);
        let closes_at = opens_at.saturating_add(self.policy.window);
        if now < opens_at {
            WithdrawalState::Pending { opens_at }
        } else if now <= closes_at {
            WithdrawalState::Claimable { closes_at }
        } else {
            WithdrawalState::Expired {
                closed_at: closes_at,
            }
        }
    }

    /// Fail unless `account` may withdraw at `now`. Does not consume the request.
    pub fn ensure_ready(&self, account: &Address, now: Timestamp) -> Result<(), StakingError> {
        if self.state(account, now).is_ready() {
            Ok(())
        } else {
            Err(StakingError::WithdrawalNotReady(*account))
        }
    }

    /// Mark `account`'s request as used. A no-op while the gate is disabled.
    pub fn consume(&mut self, account: &Address) {
        if !self.policy.is_disabled() {
            self.requests.remove(account);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> WithdrawalBounds {
        WithdrawalBounds {
            max_delay: 3600,
            min_window: 10,
            max_total: 7200,
        }
    }

    fn gate(delay: u64, window: u64) -> WithdrawalGate {
        let mut gate = WithdrawalGate::new(bounds());
        gate.set_policy(delay, window).unwrap();
        gate
    }

    fn t(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn zero_delay_disables_the_gate() {
        let gate = WithdrawalGate::new(bounds());
        let account = Address::from_low_u64(1);
        assert_eq!(gate.state(&account, t(0)), WithdrawalState::Disabled);
        assert!(gate.ensure_ready(&account, t(12345)).is_ok());
    }

    #[test]
    fn request_delay_window_sequence() {
        let mut gate = gate(60, 30);
        let account = Address::from_low_u64(1);
        assert_eq!(gate.state(&account, t(1000)), WithdrawalState::NoRequest);
        assert!(gate.ensure_ready(&account, t(1000)).is_err());

        gate.request(account, t(1000));
        assert!(gate.ensure_ready(&account, t(1059)).is_err());
        assert!(gate.ensure_ready(&account, t(1060)).is_ok());
        assert!(gate.ensure_ready(&account, t(1061)).is_ok());
        assert!(gate.ensure_ready(&account, t(1090)).is_ok());
        assert_eq!(
            gate.state(&account, t(1092)),
            WithdrawalState::Expired { closed_at: t(1090) }
        );
        assert_eq!(
            gate.ensure_ready(&account, t(1092)).unwrap_err(),
            StakingError::WithdrawalNotReady(account)
        );
    }

    #[test]
    fn consume_requires_a_new_request() {
        let mut gate = gate(60, 30);
        let account = Address::from_low_u64(1);
        gate.request(account, t(0));
        assert!(gate.ensure_ready(&account, t(61)).is_ok());
        gate.consume(&account);
        assert_eq!(gate.state(&account, t(61)), WithdrawalState::NoRequest);
        gate.request(account, t(61));
        assert!(gate.ensure_ready(&account, t(121)).is_ok());
    }

    #[test]
    fn policy_bounds_are_enforced() {
        let mut gate = WithdrawalGate::new(bounds());
        assert_eq!(
            gate.set_policy(3601, 10).unwrap_err(),
            StakingError::DelayTooLong { delay: 3601, max: 3600 }
        );
        assert_eq!(
            gate.set_policy(3600, 9).unwrap_err(),
            StakingError::WindowTooShort { window: 9, min: 10 }
        );
        assert_eq!(
            gate.set_policy(3600, 3601).unwrap_err(),
            StakingError::WindowPlusDelayTooLarge { total: 7201, max: 7200 }
        );
        assert!(matches!(
            gate.set_policy(10, u64::MAX).unwrap_err(),
            StakingError::WindowPlusDelayTooLarge { .. }
        ));
        gate.set_policy(3600, 10).unwrap();
        assert_eq!(gate.policy(), &WithdrawalPolicy { delay: 3600, window: 10 });
    }
}
