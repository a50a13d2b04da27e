//! Checkpoint-specific errors.

use stakemod_types::BlockHeight;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("cannot query block {query}: it is not strictly before the current block {current}")]
    FutureQuery {
        query: BlockHeight,
        current: BlockHeight,
    },

    #[error("checkpoint at block {attempted} would precede the latest checkpoint at block {last}")]
    NonMonotonicIndex {
        last: BlockHeight,
        attempted: BlockHeight,
    },
}
