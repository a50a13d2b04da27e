//! Checkpointed balance history.
//!
//! Every stake or unstake writes the new balance at the block it happened in.
//! Reads answer "what was the balance at block `b`?" with a binary search over
//! the history, so governance snapshots and yield plugins can rely on
//! historical balances that can no longer be moved.
//!
//! A history is append-only with one exception: a second write in the same
//! block replaces that block's entry instead of adding a duplicate.

pub mod error;
pub mod history;
pub mod store;

pub use error::CheckpointError;
pub use history::{Checkpoint, CheckpointHistory};
pub use store::CheckpointStore;
