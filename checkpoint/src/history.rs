//! A single subject's balance history.

use crate::error::CheckpointError;
use serde::{Deserialize, Serialize};
use stakemod_types::BlockHeight;

/// The balance a subject held from `block` until the next checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub block: BlockHeight,
    pub value: u128,
}

/// Ordered checkpoints with strictly increasing block heights.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckpointHistory {
    entries: Vec<Checkpoint>,
}

impl CheckpointHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` at `block`.
    ///
    /// Appends a new entry, or overwrites the last one when it was written in
    /// the same block. Amortized O(1).
    pub fn write(&mut self, value: u128, block: BlockHeight) -> Result<(), CheckpointError> {
        match self.entries.last_mut() {
            Some(last) if last.block == block => {
                last.value = value;
                Ok(())
            }
            Some(last) if last.block > block => Err(CheckpointError::NonMonotonicIndex {
                last: last.block,
                attempted: block,
            }),
            _ => {
                self.entries.push(Checkpoint { block, value });
                Ok(())
            }
        }
    }

    /// Value recorded at the greatest checkpoint `<= block`, or zero.
    ///
    /// O(log n). Callers that expose this to the outside world must reject
    /// queries that are not strictly in the past; see [`crate::CheckpointStore`].
    pub fn value_at(&self, block: BlockHeight) -> u128 {
        let upper = self.entries.partition_point(|c| c.block <= block);
        if upper == 0 {
            0
        } else {
            self.entries[upper - 1].value
        }
    }

    /// The most recent checkpoint.
    pub fn latest(&self) -> Option<&Checkpoint> {
        self.entries.last()
    }

    /// Current committed value, zero with no history.
    pub fn latest_value(&self) -> u128 {
        self.entries.last().map(|c| c.value).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.entries.iter()
    }
}
