#![no_main]

use libfuzzer_sys::fuzz_target;

use stakemod_plugins::{parse_aux_data, AuxData, Plugin, PluginError, PluginRegistry, StakeChange};
use stakemod_types::Address;

struct Inert(Address);

impl Plugin for Inert {
    fn address(&self) -> Address {
        self.0
    }
    fn deactivated(&self) -> bool {
        false
    }
    fn notify_stake_change(&mut self, _: &StakeChange) -> Result<(), PluginError> {
        Ok(())
    }
    fn claim(&mut self, _: &Address, _: &Address, _: &[u8]) -> Result<u128, PluginError> {
        Ok(0)
    }
    fn claimable(&self, _: &Address, _: &[u8]) -> Result<u128, PluginError> {
        Ok(0)
    }
}

// Parsing arbitrary aux data must never panic, and a successful parse
// always yields one slice per plugin, each taken from the payload.
fuzz_target!(|data: &[u8]| {
    let mut registry = PluginRegistry::new();
    for n in 1..=3 {
        let _ = registry.add(Box::new(Inert(Address::from_low_u64(n))));
    }

    if let Ok(slices) = parse_aux_data(&registry, data) {
        assert_eq!(slices.len(), registry.len());
        if let Ok(aux) = AuxData::decode(data) {
            for slice in &slices {
                assert!(slice.len() <= aux.payload.len());
            }
        }
    }
});
