//! Ordered plugin registry with swap-remove compaction.

use crate::dispatcher::guarded;
use crate::error::RegistryError;
use crate::plugin::Plugin;
use stakemod_types::Address;
use std::collections::{HashMap, HashSet};

/// A plugin and the address it reported when it was added.
///
/// Fan-out reads the cached address, so a plugin can never fail a ledger
/// operation just by being asked who it is.
struct Entry {
    address: Address,
    plugin: Box<dyn Plugin>,
}

/// Registered plugins, addressable by index and by address.
///
/// Invariants, maintained by every mutation:
/// - `entries[index_of[p]].address == p` for every registered `p`
/// - `members` holds exactly the addresses in `entries`
/// - no address appears twice
pub struct PluginRegistry {
    entries: Vec<Entry>,
    index_of: HashMap<Address, usize>,
    members: HashSet<Address>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index_of: HashMap::new(),
            members: HashSet::new(),
        }
    }

    /// Register a plugin at the end of the list. Returns its index.
    pub fn add(&mut self, plugin: Box<dyn Plugin>) -> Result<usize, RegistryError> {
        let address = plugin.address();
        if self.members.contains(&address) {
            return Err(RegistryError::DuplicatePlugin(address));
        }
        let supported = guarded(|| Ok(plugin.supports_interface())).unwrap_or(false);
        if !supported {
            return Err(RegistryError::UnsupportedInterface(address));
        }
        // A plugin that cannot answer is treated as deactivated.
        if guarded(|| Ok(plugin.deactivated())).unwrap_or(true) {
            return Err(RegistryError::PluginDeactivated(address));
        }

        let index = self.entries.len();
        self.entries.push(Entry { address, plugin });
        self.index_of.insert(address, index);
        self.members.insert(address);
        Ok(index)
    }

    /// Remove the plugin at `index`, moving the last plugin into its slot.
    ///
    /// Only a plugin that reports itself deactivated can be removed.
    pub fn remove(&mut self, index: usize) -> Result<Box<dyn Plugin>, RegistryError> {
        let len = self.entries.len();
        let target = self
            .entries
            .get(index)
            .ok_or(RegistryError::IndexOutOfBounds { index, len })?;
        let address = target.address;
        if !guarded(|| Ok(target.plugin.deactivated())).unwrap_or(false) {
            return Err(RegistryError::PluginNotDeactivated(address));
        }

        let removed = self.entries.swap_remove(index);
        if let Some(moved) = self.entries.get(index) {
            self.index_of.insert(moved.address, index);
        }
        self.index_of.remove(&address);
        self.members.remove(&address);
        Ok(removed.plugin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.index_of.get(address).copied()
    }

    pub fn address_at(&self, index: usize) -> Option<Address> {
        self.entries.get(index).map(|e| e.address)
    }

    /// Registered addresses in index order.
    pub fn addresses(&self) -> Vec<Address> {
        self.entries.iter().map(|e| e.address).collect()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Plugin> {
        self.entries.get(index).map(|e| e.plugin.as_ref())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Address, &dyn Plugin)> {
        self.entries.iter().map(|e| (e.address, e.plugin.as_ref()))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (Address, &mut Box<dyn Plugin>)> {
        self.entries.iter_mut().map(|e| (e.address, &mut e.plugin))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Box<dyn Plugin>> {
        self.entries.get_mut(index).map(|e| &mut e.plugin)
    }

    /// Verify the index map and membership set agree with the plugin list.
    pub fn is_consistent(&self) -> bool {
        self.entries.len() == self.index_of.len()
            && self.entries.len() == self.members.len()
            && self.entries.iter().enumerate().all(|(i, e)| {
                self.index_of.get(&e.address) == Some(&i) && self.members.contains(&e.address)
            })
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::PluginError;
    use crate::plugin::StakeChange;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Minimal in-crate plugin; the nullables crate has the full-featured one.
    pub(crate) struct StubPlugin {
        pub address: Address,
        pub deactivated: Arc<AtomicBool>,
        /// Makes `address()` panic once set.
        pub address_panics: Arc<AtomicBool>,
        /// Makes `deactivated()` panic once set.
        pub status_panics: Arc<AtomicBool>,
        pub supported: bool,
        pub payout: u128,
        pub fail: bool,
        pub panic: bool,
    }

    impl StubPlugin {
        pub(crate) fn new(n: u64) -> Self {
            Self {
                address: Address::from_low_u64(n),
                deactivated: Arc::new(AtomicBool::new(false)),
                address_panics: Arc::new(AtomicBool::new(false)),
                status_panics: Arc::new(AtomicBool::new(false)),
                supported: true,
                payout: 0,
                fail: false,
                panic: false,
            }
        }

        fn fault(&self) -> Result<(), PluginError> {
            if self.panic {
                panic!("stub plugin blew up");
            }
            if self.fail {
                return Err(PluginError::Reverted("stub".into()));
            }
            Ok(())
        }
    }

    impl Plugin for StubPlugin {
        fn address(&self) -> Address {
            if self.address_panics.load(Ordering::SeqCst) {
                panic!("stub plugin forgot its address");
            }
            self.address
        }

        fn supports_interface(&self) -> bool {
            self.supported
        }

        fn deactivated(&self) -> bool {
            if self.status_panics.load(Ordering::SeqCst) {
                panic!("stub plugin status unavailable");
            }
            self.deactivated.load(Ordering::SeqCst)
        }

        fn notify_stake_change(&mut self, _change: &StakeChange) -> Result<(), PluginError> {
            self.fault()
        }

        fn claim(&mut self, _account: &Address, _to: &Address, aux: &[u8]) -> Result<u128, PluginError> {
            self.fault()?;
            Ok(self.payout + aux.len() as u128)
        }

        fn claimable(&self, _account: &Address, _aux: &[u8]) -> Result<u128, PluginError> {
            self.fault()?;
            Ok(self.payout)
        }
    }

    /// Three registered plugins plus handles to flip their deactivation flags.
    fn registry_of_three() -> (PluginRegistry, Vec<Arc<AtomicBool>>) {
        let mut registry = PluginRegistry::new();
        let mut flags = Vec::new();
        for n in 1..=3 {
            let plugin = StubPlugin::new(n);
            flags.push(Arc::clone(&plugin.deactivated));
            registry.add(Box::new(plugin)).unwrap();
        }
        (registry, flags)
    }

    #[test]
    fn add_assigns_sequential_indices() {
        let (registry, _) = registry_of_three();
        assert_eq!(registry.len(), 3);
        assert!(registry.is_consistent());
        assert_eq!(registry.index_of(&Address::from_low_u64(1)), Some(0));
        assert_eq!(registry.address_at(2), Some(Address::from_low_u64(3)));
        assert_eq!(registry.address_at(3), None);
    }

    #[test]
    fn add_rejects_duplicates_unsupported_and_deactivated() {
        let mut registry = PluginRegistry::new();
        registry.add(Box::new(StubPlugin::new(1))).unwrap();

        assert_eq!(
            registry.add(Box::new(StubPlugin::new(1))).unwrap_err(),
            RegistryError::DuplicatePlugin(Address::from_low_u64(1))
        );

        let mut unsupported = StubPlugin::new(2);
        unsupported.supported = false;
        assert_eq!(
            registry.add(Box::new(unsupported)).unwrap_err(),
            RegistryError::UnsupportedInterface(Address::from_low_u64(2))
        );

        let retired = StubPlugin::new(3);
        retired.deactivated.store(true, Ordering::SeqCst);
        assert_eq!(
            registry.add(Box::new(retired)).unwrap_err(),
            RegistryError::PluginDeactivated(Address::from_low_u64(3))
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.is_consistent());
    }

    #[test]
    fn remove_requires_deactivation_and_bounds() {
        let mut registry = PluginRegistry::new();
        assert_eq!(
            registry.remove(0).err(),
            Some(RegistryError::IndexOutOfBounds { index: 0, len: 0 })
        );

        registry.add(Box::new(StubPlugin::new(1))).unwrap();
        assert_eq!(
            registry.remove(0).err(),
            Some(RegistryError::PluginNotDeactivated(Address::from_low_u64(1)))
        );
        assert_eq!(
            registry.remove(1).err(),
            Some(RegistryError::IndexOutOfBounds { index: 1, len: 1 })
        );
    }

    #[test]
    fn panicking_status_check_is_contained() {
        let mut registry = PluginRegistry::new();

        let broken = StubPlugin::new(1);
        broken.status_panics.store(true, Ordering::SeqCst);
        assert_eq!(
            registry.add(Box::new(broken)).unwrap_err(),
            RegistryError::PluginDeactivated(Address::from_low_u64(1))
        );
        assert!(registry.is_empty());

        let flaky = StubPlugin::new(2);
        let status = Arc::clone(&flaky.status_panics);
        registry.add(Box::new(flaky)).unwrap();
        status.store(true, Ordering::SeqCst);
        assert_eq!(
            registry.remove(0).err(),
            Some(RegistryError::PluginNotDeactivated(Address::from_low_u64(2)))
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.is_consistent());
    }

    #[test]
    fn removing_the_middle_plugin_compacts() {
        let (mut registry, flags) = registry_of_three();
        flags[1].store(true, Ordering::SeqCst);
        let removed = registry.remove(1).unwrap();
        assert_eq!(removed.address(), Address::from_low_u64(2));

        assert_eq!(
            registry.addresses(),
            vec![Address::from_low_u64(1), Address::from_low_u64(3)]
        );
        assert_eq!(registry.index_of(&Address::from_low_u64(3)), Some(1));
        assert!(!registry.contains(&Address::from_low_u64(2)));
        assert!(registry.is_consistent());
    }

    #[test]
    fn removing_first_and_last_plugins_compacts() {
        let (mut registry, flags) = registry_of_three();
        for flag in &flags {
            flag.store(true, Ordering::SeqCst);
        }

        registry.remove(0).unwrap();
        assert_eq!(
            registry.addresses(),
            vec![Address::from_low_u64(3), Address::from_low_u64(2)]
        );
        assert!(registry.is_consistent());

        registry.remove(1).unwrap();
        assert_eq!(registry.addresses(), vec![Address::from_low_u64(3)]);
        assert!(registry.is_consistent());

        registry.remove(0).unwrap();
        assert!(registry.is_empty());
        assert!(registry.is_consistent());
    }
}
