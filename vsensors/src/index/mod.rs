//! Ordered indices over descriptors and samples (spec §4.4, §4.5).
//!
//! The original C implementation keeps one comparator that behaves
//! differently depending on whether a compared descriptor's context
//! back-reference is null (see the "ambivalent comparator" entry in
//! REDESIGN FLAGS). Here that's replaced with two distinct key types, as
//! the redesign notes recommend:
//!
//! - [`ProbeKey`]: `(family, label)`, case-folded, used for range scans —
//!   this is what pattern pruning computes min/max bounds over.
//! - [`StorageKey`]: a `ProbeKey` plus a monotonically assigned identity
//!   salt, used as the actual `BTreeMap` key so that two entries sharing a
//!   label (a loading placeholder and the concrete sensor that will
//!   eventually replace it) can coexist.
//!
//! A range scan over `StorageKey` bounded by `(probe_lo, 0)..=(probe_hi,
//! u64::MAX)` visits exactly the entries whose `ProbeKey` falls in
//! `[probe_lo, probe_hi]`, in label order, with ties broken by insertion
//! identity — which is exactly the property pattern pruning (§4.6) needs.

pub mod sensor;
pub mod watch;

/// Case-folded `(family, label)` pair used for range-scan bounds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProbeKey {
    pub family: String,
    pub label: String,
}

impl ProbeKey {
    /// Build a probe key, case-folding both segments.
    pub fn new(family: &str, label: &str) -> Self {
        ProbeKey {
            family: family.to_lowercase(),
            label: label.to_lowercase(),
        }
    }

    /// The least key with this family/label prefix.
    pub fn lower_bound(family: &str, label: &str) -> Self {
        ProbeKey::new(family, label)
    }

    /// The greatest key with this family/label prefix: pads both segments
    /// with `\u{10FFFF}` so any suffix sorts below it.
    pub fn upper_bound(family_prefix: &str, label_prefix: &str) -> Self {
        ProbeKey {
            family: format!("{}{}", family_prefix.to_lowercase(), '\u{10FFFF}'),
            label: format!("{}{}", label_prefix.to_lowercase(), '\u{10FFFF}'),
        }
    }
}

/// The actual `BTreeMap` key: a [`ProbeKey`] plus an identity salt
/// distinguishing same-labeled entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StorageKey {
    pub probe: ProbeKey,
    pub identity: u64,
}

impl StorageKey {
    pub fn new(probe: ProbeKey, identity: u64) -> Self {
        StorageKey { probe, identity }
    }

    /// Least storage key sharing `probe`'s prefix — use as a range's
    /// inclusive start.
    pub fn range_start(probe: ProbeKey) -> Self {
        StorageKey {
            probe,
            identity: u64::MIN,
        }
    }

    /// Greatest storage key sharing `probe`'s prefix — use as a range's
    /// inclusive end.
    pub fn range_end(probe: ProbeKey) -> Self {
        StorageKey {
            probe,
            identity: u64::MAX,
        }
    }
}

/// Assigns strictly increasing identities for [`StorageKey`]s.
#[derive(Debug, Default)]
pub struct IdentitySource {
    next: u64,
}

impl IdentitySource {
    pub fn next(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}
