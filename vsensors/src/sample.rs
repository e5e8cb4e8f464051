//! The active watch / sample (spec §3 "Sample (watch)").

use std::any::Any;
use std::time::Instant;

use crate::index::StorageKey;
use crate::params::ParamKey;
use crate::value::Value;

/// An active subscription to a descriptor.
///
/// `user_data`'s `user_free` counterpart from the C data model is just
/// Rust's `Drop`: dropping the `Box` when the sample is torn down runs
/// whatever destructor the caller's type carries, so there is no need for
/// a separate function pointer field.
pub struct Sample {
    /// The descriptor this sample watches.
    pub desc: StorageKey,
    /// The interned parameters (interval, callback, reserved levels) this
    /// sample currently uses.
    pub watch: ParamKey,
    /// Current value. Its type must match the descriptor's `value_type`
    /// once armed.
    pub value: Value,
    /// Monotonic deadline for the next update. `None` means "zero" — the
    /// sample has never been updated, so the very next `update_check`
    /// treats it as due regardless of interval.
    pub next_update_time: Option<Instant>,
    /// Caller-supplied opaque payload, freed (dropped) with the sample.
    pub user_data: Option<Box<dyn Any + Send>>,
}

impl Sample {
    /// A freshly-armed sample: value marked "never updated", due
    /// immediately.
    pub fn new_armed(desc: StorageKey, watch: ParamKey, mut value: Value) -> Self {
        value.mark_never_updated();
        Sample {
            desc,
            watch,
            value,
            next_update_time: None,
            user_data: None,
        }
    }

    /// A sample with an explicit initial value (used for the loading
    /// placeholder's literal `"Loading..."` string, which must not be
    /// overwritten by the "never updated" marker).
    pub fn new_with_value(desc: StorageKey, watch: ParamKey, value: Value) -> Self {
        Sample {
            desc,
            watch,
            value,
            next_update_time: None,
            user_data: None,
        }
    }

    /// `true` if this sample is due for an update given `now` (spec §4.8
    /// step 2): always due when it has never been updated.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.next_update_time {
            None => true,
            Some(deadline) => now >= deadline,
        }
    }
}

impl std::fmt::Debug for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sample")
            .field("desc", &self.desc)
            .field("watch", &self.watch)
            .field("value", &self.value)
            .field("next_update_time", &self.next_update_time)
            .finish()
    }
}
