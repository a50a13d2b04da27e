//! Nullable clock: deterministic blocks and time for testing.

use stakemod_types::{Address, BlockHeight, CallContext, Timestamp};
use std::cell::Cell;

/// Seconds between blocks when mining.
pub const BLOCK_TIME_SECS: u64 = 12;

/// A deterministic chain clock for testing.
///
/// Blocks and time only advance when you tell them to.
pub struct NullClock {
    block: Cell<u64>,
    current: Cell<u64>,
}

impl NullClock {
    pub fn new(initial_block: u64, initial_secs: u64) -> Self {
        Self {
            block: Cell::new(initial_block),
            current: Cell::new(initial_secs),
        }
    }

    /// Get the current time.
    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }

    pub fn block(&self) -> BlockHeight {
        BlockHeight::new(self.block.get())
    }

    /// A call context for `caller` in the current block.
    pub fn ctx(&self, caller: Address) -> CallContext {
        CallContext::new(caller, self.block(), self.now())
    }

    /// Mine `n` blocks, `BLOCK_TIME_SECS` apart.
    pub fn mine(&self, n: u64) {
        self.block.set(self.block.get() + n);
        self.current.set(self.current.get() + n * BLOCK_TIME_SECS);
    }

    /// Advance time by a number of seconds, landing in the next block.
    pub fn advance(&self, secs: u64) {
        self.block.set(self.block.get() + 1);
        self.current.set(self.current.get() + secs);
    }

    /// Set the time to a specific value. The block does not change.
    pub fn set(&self, secs: u64) {
        self.current.set(secs);
    }
}

impl Default for NullClock {
    fn default() -> Self {
        Self::new(1, 1_700_000_000)
    }
}
