//! The sensor index (spec §4.4): `sensor_list` + `sensor_tree`.

use std::collections::BTreeMap;

use super::{IdentitySource, ProbeKey, StorageKey};
use crate::descriptor::Descriptor;

/// Ordered set of descriptors keyed by case-insensitive `(family, label)`,
/// with a parallel insertion-ordered list for API returns (spec §4.4).
#[derive(Debug, Default)]
pub struct SensorIndex {
    tree: BTreeMap<StorageKey, Descriptor>,
    list: Vec<StorageKey>,
    identities: IdentitySource,
}

impl SensorIndex {
    pub fn new() -> Self {
        SensorIndex::default()
    }

    /// Insert a descriptor, returning the key it was stored under.
    pub fn insert(&mut self, descriptor: Descriptor) -> StorageKey {
        let probe = ProbeKey::new(descriptor.family(), descriptor.label());
        let key = StorageKey::new(probe, self.identities.next());
        self.tree.insert(key.clone(), descriptor);
        self.list.push(key.clone());
        key
    }

    /// Remove a descriptor by its storage key.
    pub fn remove(&mut self, key: &StorageKey) -> Option<Descriptor> {
        let removed = self.tree.remove(key);
        if removed.is_some() {
            self.list.retain(|k| k != key);
        }
        removed
    }

    /// Remove every descriptor belonging to `family`, returning the
    /// removed keys and descriptors (used by the reload protocol).
    pub fn remove_family(&mut self, family: &str) -> Vec<(StorageKey, Descriptor)> {
        let family_lower = family.to_lowercase();
        let keys: Vec<StorageKey> = self
            .tree
            .keys()
            .filter(|k| k.probe.family == family_lower)
            .cloned()
            .collect();
        keys.into_iter()
            .map(|k| {
                let d = self.tree.remove(&k).expect("key came from tree.keys()");
                self.list.retain(|lk| lk != &k);
                (k, d)
            })
            .collect()
    }

    pub fn get(&self, key: &StorageKey) -> Option<&Descriptor> {
        self.tree.get(key)
    }

    /// Every descriptor in tree order (equivalently, `list` sorted by the
    /// comparator — see P1 in the test suite).
    pub fn iter(&self) -> impl Iterator<Item = (&StorageKey, &Descriptor)> {
        self.tree.iter()
    }

    /// Descriptors whose `ProbeKey` falls within `[lo, hi]`, in order.
    pub fn range(&self, lo: ProbeKey, hi: ProbeKey) -> impl Iterator<Item = (&StorageKey, &Descriptor)> {
        let start = StorageKey::range_start(lo);
        let end = StorageKey::range_end(hi);
        self.tree.range(start..=end)
    }

    /// Insertion-ordered key list (mirrors `sensor_list`).
    pub fn list(&self) -> &[StorageKey] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::LiveDescriptor;
    use vsensors_sys::ValueType;

    fn live(family: &str, label: &str) -> Descriptor {
        Descriptor::Live(LiveDescriptor {
            family: family.to_string(),
            label: label.to_string(),
            key: 0,
            value_type: ValueType::UCHAR,
            properties: Vec::new(),
        })
    }

    #[test]
    fn tree_and_list_agree_after_inserts_and_removes() {
        let mut idx = SensorIndex::new();
        let k1 = idx.insert(live("cpu", "total"));
        let _k2 = idx.insert(live("cpu", "1"));
        let k3 = idx.insert(live("mem", "free"));
        idx.remove(&k1);

        let tree_order: Vec<&StorageKey> = idx.iter().map(|(k, _)| k).collect();
        let mut list_sorted = idx.list().to_vec();
        list_sorted.sort();
        assert_eq!(tree_order, list_sorted.iter().collect::<Vec<_>>());
        assert!(idx.get(&k3).is_some());
    }

    #[test]
    fn same_label_different_family_coexist() {
        let mut idx = SensorIndex::new();
        idx.insert(live("cpu", "x"));
        idx.insert(live("mem", "x"));
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn range_bounds_by_family_prefix() {
        let mut idx = SensorIndex::new();
        idx.insert(live("cpu", "total"));
        idx.insert(live("cpu", "1"));
        idx.insert(live("mem", "free"));
        let lo = ProbeKey::lower_bound("cpu", "");
        let hi = ProbeKey::upper_bound("cpu", "");
        let matches: Vec<_> = idx.range(lo, hi).collect();
        assert_eq!(matches.len(), 2);
    }
}
