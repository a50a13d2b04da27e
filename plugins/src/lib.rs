//! Yield plugins for the staking module.
//!
//! Plugins are external yield sources (reward streams, fee shares, ...) that
//! want to know when stakes change and that pay out on claim. They are
//! untrusted: any call into a plugin may fail or panic, and the staking
//! ledger must keep working regardless.
//!
//! This crate handles:
//! - The [`Plugin`] capability trait
//! - An ordered registry with O(1) membership and index lookup
//! - Fan-out of notifications and claims with per-plugin failure isolation
//! - Routing one caller-supplied aux-data blob into per-plugin slices

pub mod aux_data;
pub mod dispatcher;
pub mod error;
pub mod plugin;
pub mod registry;

pub use aux_data::{parse_aux_data, AuxData, HeaderItem};
pub use dispatcher::{ClaimReport, NotifyReport, PluginFailure};
pub use error::{PluginError, RegistryError};
pub use plugin::{Plugin, StakeChange};
pub use registry::PluginRegistry;
