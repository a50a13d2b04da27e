//! Fundamental types for the staking module.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, block heights, timestamps, access roles and the per-call context.

pub mod address;
pub mod context;
pub mod error;
pub mod role;
pub mod time;

pub use address::Address;
pub use context::CallContext;
pub use error::TypesError;
pub use role::Role;
pub use time::{BlockHeight, Timestamp};
