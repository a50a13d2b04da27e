//! Per-plugin routing of one opaque aux-data blob.
//!
//! A caller who claims from every plugin in one call may want to hand each
//! plugin different instructions. The blob is either empty, or a
//! bincode-encoded [`AuxData`]: a header of `(plugin, start, len)` items
//! pointing into one shared payload.
//!
//! At most one header item per plugin is expected. If several name the same
//! plugin, the last one wins.

use crate::error::RegistryError;
use crate::registry::PluginRegistry;
use serde::{Deserialize, Serialize};
use stakemod_types::Address;

/// Points `plugin` at `payload[start..start + len]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderItem {
    pub plugin: Address,
    pub start: u64,
    pub len: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxData {
    pub header: Vec<HeaderItem>,
    pub payload: Vec<u8>,
}

impl AuxData {
    pub fn new(header: Vec<HeaderItem>, payload: Vec<u8>) -> Self {
        Self { header, payload }
    }

    /// Wire form accepted by [`parse_aux_data`].
    pub fn encode(&self) -> Result<Vec<u8>, RegistryError> {
        bincode::serialize(self).map_err(|e| RegistryError::MalformedAuxData(e.to_string()))
    }

    pub fn decode(raw: &[u8]) -> Result<Self, RegistryError> {
        bincode::deserialize(raw).map_err(|e| RegistryError::MalformedAuxData(e.to_string()))
    }
}

/// Split `raw` into one slice per registered plugin, indexed like the registry.
///
/// Empty input yields `registry.len()` empty slices.
pub fn parse_aux_data(registry: &PluginRegistry, raw: &[u8]) -> Result<Vec<Vec<u8>>, RegistryError> {
    let mut slices = vec![Vec::new(); registry.len()];
    if raw.is_empty() {
        return Ok(slices);
    }

    let aux = AuxData::decode(raw)?;
    for item in &aux.header {
        let index = registry
            .index_of(&item.plugin)
            .ok_or(RegistryError::InvalidPluginInHeader(item.plugin))?;
        slices[index] = slice(&aux.payload, item)?.to_vec();
    }
    Ok(slices)
}

fn slice<'a>(payload: &'a [u8], item: &HeaderItem) -> Result<&'a [u8], RegistryError> {
    let out_of_bounds = || RegistryError::SliceOutOfBounds {
        start: item.start,
        len: item.len,
        payload_len: payload.len(),
    };
    let start = usize::try_from(item.start).map_err(|_| out_of_bounds())?;
    let len = usize::try_from(item.len).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    payload.get(start..end).ok_or_else(out_of_bounds)
}
