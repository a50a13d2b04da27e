//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! Everything the staking module talks to (clock, token, plugins) has a
//! test-friendly implementation here that:
//! - Returns deterministic values
//! - Can be controlled programmatically
//! - Records what was asked of it so tests can assert on it
//!
//! Usage: hand these to a `StakingModule` in tests and the simulator.

pub mod clock;
pub mod plugin;
pub mod token;

pub use clock::NullClock;
pub use plugin::{ClaimRecord, NullPlugin, NullPluginHandle};
pub use token::NullToken;

use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, ignoring poisoning. A panicking test plugin must not take
/// its observers down with it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
