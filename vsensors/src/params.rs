//! Watch parameters and their intern table (spec §3 "Watch parameters",
//! §4.5).
//!
//! The C original interns by structural equality of a record that embeds
//! a function pointer — REDESIGN FLAGS calls for holding callbacks as
//! opaque identity-equality handles and keeping interval/levels as plain
//! data, which is what [`WatchCallback`] and [`WatchParams::structural_eq`]
//! do. The table itself is a small linear-scan `Vec` rather than a tree:
//! the number of distinct sampling profiles in real use is tiny (callers
//! tend to reuse one or two), and `watch_pgcd`'s GCD fold is commutative,
//! so nothing in spec §4.8 actually depends on `param_tree`'s traversal
//! order being sorted rather than insertion order.

use std::sync::Arc;
use std::time::Duration;

use crate::sample::Sample;
use crate::value::Value;

/// A per-sample callback, identity-compared (two `Arc`s pointing at the
/// same closure are the same callback; two closures with identical bodies
/// are not).
#[derive(Clone)]
pub struct WatchCallback(pub Arc<dyn Fn(&Sample) + Send + Sync>);

impl WatchCallback {
    pub fn new(f: impl Fn(&Sample) + Send + Sync + 'static) -> Self {
        WatchCallback(Arc::new(f))
    }
}

impl PartialEq for WatchCallback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for WatchCallback {}

impl std::fmt::Debug for WatchCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WatchCallback({:p})", Arc::as_ptr(&self.0))
    }
}

/// The sampling profile shared by possibly many samples via interning.
#[derive(Clone, Debug)]
pub struct WatchParams {
    /// How often armed samples using this profile should be refreshed.
    pub update_interval: Duration,
    /// Reserved threshold levels; no engine currently emits transitions
    /// off of them (see the "Open-question decisions" in `SPEC_FULL.md`).
    pub update_levels: [Value; 3],
    /// Optional per-sample callback, run on `WATCH_UPDATED`.
    pub callback: Option<WatchCallback>,
}

impl WatchParams {
    pub fn new(update_interval: Duration, callback: Option<WatchCallback>) -> Self {
        WatchParams {
            update_interval,
            update_levels: [Value::Null, Value::Null, Value::Null],
            callback,
        }
    }

    /// Structural equality: interval bits, callback identity, and all
    /// three levels by type and value (spec §3).
    pub fn structural_eq(&self, other: &Self) -> bool {
        self.update_interval == other.update_interval
            && self.callback == other.callback
            && self
                .update_levels
                .iter()
                .zip(other.update_levels.iter())
                .all(|(a, b)| a.equal(b))
    }
}

/// Key into the intern table. Stable for the lifetime of the entry.
pub type ParamKey = u64;

/// Deduplicated table of [`WatchParams`] (spec §4.5 `param_tree`).
///
/// Invariant (P2): every entry's `use_count` equals the number of samples
/// whose `watch` field names it; entries are removed the instant their
/// count reaches zero.
#[derive(Default)]
pub struct ParamIntern {
    entries: Vec<(ParamKey, WatchParams, usize)>,
    next_id: u64,
}

impl ParamIntern {
    pub fn new() -> Self {
        ParamIntern::default()
    }

    /// Find or create the entry matching `params`, incrementing its
    /// `use_count`, and return its key.
    pub fn acquire(&mut self, params: WatchParams) -> ParamKey {
        if let Some((key, _, count)) = self.entries.iter_mut().find(|(_, p, _)| p.structural_eq(&params)) {
            *count += 1;
            return *key;
        }
        let key = self.next_id;
        self.next_id += 1;
        self.entries.push((key, params, 1));
        key
    }

    /// Decrement `key`'s `use_count`; removes the entry and returns
    /// `true` if it dropped to zero.
    pub fn release(&mut self, key: ParamKey) -> bool {
        if let Some(pos) = self.entries.iter().position(|(k, _, _)| *k == key) {
            self.entries[pos].2 -= 1;
            if self.entries[pos].2 == 0 {
                self.entries.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn get(&self, key: ParamKey) -> Option<&WatchParams> {
        self.entries.iter().find(|(k, _, _)| *k == key).map(|(_, p, _)| p)
    }

    pub fn use_count(&self, key: ParamKey) -> usize {
        self.entries.iter().find(|(k, _, _)| *k == key).map(|(_, _, c)| *c).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rounded GCD of every interned interval, in milliseconds, suitable
    /// for sizing a driving timer (spec §4.8 `watch_pgcd`). `precision`
    /// rounds each interval to the nearest multiple of itself before
    /// folding (default 1.0 ms per spec).
    pub fn pgcd_millis(&self, precision_ms: f64) -> Option<u64> {
        let precision_ms = if precision_ms <= 0.0 { 1.0 } else { precision_ms };
        let mut rounded = self.entries.iter().map(|(_, p, _)| {
            let ms = p.update_interval.as_secs_f64() * 1000.0;
            ((ms / precision_ms).round() * precision_ms).max(precision_ms) as u64
        });
        let first = rounded.next()?;
        Some(rounded.fold(first, gcd_u64))
    }
}

fn gcd_u64(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd_u64(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_params_intern_to_one_entry() {
        let mut table = ParamIntern::new();
        let k1 = table.acquire(WatchParams::new(Duration::from_millis(500), None));
        let k2 = table.acquire(WatchParams::new(Duration::from_millis(500), None));
        assert_eq!(k1, k2);
        assert_eq!(table.use_count(k1), 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn release_to_zero_removes_entry() {
        let mut table = ParamIntern::new();
        let k = table.acquire(WatchParams::new(Duration::from_millis(250), None));
        table.acquire(WatchParams::new(Duration::from_millis(250), None));
        assert!(!table.release(k));
        assert!(table.release(k));
        assert!(table.is_empty());
    }

    #[test]
    fn distinct_callbacks_do_not_merge() {
        let mut table = ParamIntern::new();
        let cb_a = WatchCallback::new(|_s| {});
        let cb_b = WatchCallback::new(|_s| {});
        let k1 = table.acquire(WatchParams::new(Duration::from_millis(100), Some(cb_a)));
        let k2 = table.acquire(WatchParams::new(Duration::from_millis(100), Some(cb_b)));
        assert_ne!(k1, k2);
    }

    #[test]
    fn pgcd_matches_scenario_4() {
        let mut table = ParamIntern::new();
        table.acquire(WatchParams::new(Duration::from_millis(250), None));
        table.acquire(WatchParams::new(Duration::from_millis(100), None));
        assert_eq!(table.pgcd_millis(1.0), Some(50));
    }
}
