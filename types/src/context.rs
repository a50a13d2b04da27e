//! Per-call execution context.

use crate::address::Address;
use crate::time::{BlockHeight, Timestamp};
use serde::{Deserialize, Serialize};

/// Who is calling, and in which block.
///
/// Every mutating operation takes one. Calls are serialized; two calls with
/// the same `block` belong to the same settlement unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub block: BlockHeight,
    pub timestamp: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, block: BlockHeight, timestamp: Timestamp) -> Self {
        Self {
            caller,
            block,
            timestamp,
        }
    }

    /// The same block and time, issued by someone else.
    pub fn with_caller(&self, caller: Address) -> Self {
        Self { caller, ..*self }
    }
}
