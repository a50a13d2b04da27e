//! Plugin and registry errors.

use stakemod_types::Address;
use thiserror::Error;

/// A fault raised by a plugin. Never escapes the dispatcher.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PluginError {
    #[error("plugin reverted: {0}")]
    Reverted(String),

    #[error("plugin panicked: {0}")]
    Panicked(String),

    #[error("plugin payout of {payout} overflows the claim total")]
    PayoutOverflow { payout: u128 },
}

/// Caller errors against the registry and the aux-data parser.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("plugin {0} is already registered")]
    DuplicatePlugin(Address),

    #[error("plugin {0} does not support the plugin interface")]
    UnsupportedInterface(Address),

    #[error("cannot add deactivated plugin {0}")]
    PluginDeactivated(Address),

    #[error("plugin index {index} out of bounds (registry holds {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("plugin {0} is not deactivated")]
    PluginNotDeactivated(Address),

    #[error("plugin {0} is not registered")]
    InvalidPlugin(Address),

    #[error("aux-data header names unregistered plugin {0}")]
    InvalidPluginInHeader(Address),

    #[error("aux-data slice [{start}, {start}+{len}) exceeds payload of {payload_len} bytes")]
    SliceOutOfBounds {
        start: u64,
        len: u64,
        payload_len: usize,
    },

    #[error("malformed aux data: {0}")]
    MalformedAuxData(String),
}
