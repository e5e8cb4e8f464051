//! The family/plugin interface (spec §4.2).
//!
//! A [`Family`] is a capability object: the registry never reaches into a
//! backend's private state directly, it only calls through this trait.
//! This mirrors the way `perf-event`'s `Event` trait (see
//! `perf-event/src/events.rs` in the upstream crate this workspace started
//! from) keeps kernel-facing detail behind a narrow interface rather than
//! exposing raw `perf_event_attr` fields to callers.

use std::time::Instant;

use bitflags::bitflags;
use vsensors_sys::Status;

use crate::descriptor::Descriptor;
use crate::value::Value;

bitflags! {
    /// Lifecycle events delivered to [`Family::notify`] (spec §6).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NotifyEvent: u32 {
        /// A watched value changed.
        const WATCH_UPDATED = 1 << 0;
        /// A new watch was created.
        const WATCH_ADDED = 1 << 1;
        /// An existing sample's parameters were replaced.
        const WATCH_REPLACED = 1 << 2;
        /// A watch is about to be torn down.
        const WATCH_DELETING = 1 << 3;
        /// The family just finished re-enumerating its descriptors.
        const FAMILY_RELOADED = 1 << 4;
        /// Synchronous: the family must block until enumeration completes.
        const FAMILY_WAIT_LOAD = 1 << 5;
    }
}

/// Replaces the C convention of `now == NULL` meaning "force an update
/// regardless of the sample's interval" (see REDESIGN FLAGS).
#[derive(Debug, Clone, Copy)]
pub enum Deadline {
    /// Update unconditionally, ignoring `next_update_time`.
    Force,
    /// Update only if the sample's `next_update_time` has passed.
    At(Instant),
}

impl Deadline {
    /// The instant to compare against, or `None` for [`Deadline::Force`].
    pub fn instant(&self) -> Option<Instant> {
        match self {
            Deadline::Force => None,
            Deadline::At(now) => Some(*now),
        }
    }
}

/// An opaque per-sensor token a family assigns at `list` time, handed back
/// on `update`/`write` so the backend can index its own state in O(1)
/// instead of re-resolving a label string every tick. Stands in for the
/// "opaque backend pointer" the data model describes; nothing outside a
/// family's own implementation interprets its bits.
pub type SensorKey = u64;

/// Context passed to [`Family::notify`] for the watch-scoped events.
#[derive(Debug, Clone, Copy)]
pub struct WatchNotifyInfo<'a> {
    /// The sensor's label (without the family prefix).
    pub label: &'a str,
    /// The key the family returned for this sensor from `list`.
    pub key: SensorKey,
}

/// The capability vtable a plugin must expose (spec §4.2).
///
/// Implementors are free to hold arbitrary private state; the registry
/// only ever calls through this trait, and only ever from within a held
/// lock (`update`/`write`/`notify` run with at least a reader lock; `init`/
/// `free`/`list` run with the writer lock).
pub trait Family: Send + 'static {
    /// The family's name, e.g. `"cpu"`. Must be stable for the family's
    /// lifetime; used to build `family/label` identities.
    fn name(&self) -> &str;

    /// Allocate backend state. On [`Status::ERROR`] the family must have
    /// already cleaned up after itself — the registry will not call
    /// [`Family::free`] in that case.
    fn init(&mut self) -> Status {
        Status::SUCCESS
    }

    /// Release backend state. Must be idempotent: called again on an
    /// already-freed family is a no-op, not a double-free.
    fn free(&mut self) {}

    /// Return the family's current descriptor set. May return descriptors
    /// tagged [`crate::descriptor::Descriptor::Pending`] to signal
    /// "enumeration is still running in the background" instead of
    /// blocking here.
    fn list(&mut self) -> Vec<Descriptor>;

    /// Refresh `value` for the sensor identified by `key`.
    ///
    /// `deadline` is [`Deadline::Force`] during synchronous load-wait
    /// (spec §4.8 `init_wait`), otherwise the caller's current time —
    /// families with no cheap way to tell if a value changed may return
    /// [`Status::SUCCESS`] and let the update engine byte-compare against
    /// the prior value itself.
    fn update(&mut self, key: SensorKey, value: &mut Value, deadline: Deadline) -> Status;

    /// Write a new value to a writable sensor. Absent (returns
    /// `NOT_SUPPORTED`) for read-only families.
    fn write(&mut self, _key: SensorKey, _value: &Value) -> Status {
        Status::NOT_SUPPORTED
    }

    /// Receive a lifecycle event. The update engine calls this on the
    /// family the event concerns — e.g. [`NotifyEvent::FAMILY_WAIT_LOAD`]
    /// goes to the family whose enumeration `init_wait` is draining, not
    /// to every registered family. The default no-op is correct for any
    /// family with nothing to do in response; override it only if the
    /// family needs to react (block, log, adjust internal state) to one
    /// of these events.
    fn notify(&mut self, _event: NotifyEvent, _info: Option<WatchNotifyInfo<'_>>) -> Status {
        Status::SUCCESS
    }

    /// Downcast hook letting the registry reach a concrete family type
    /// after registration — used to reach [`crate::families::common::CommonFamily`]'s
    /// worker controls through its `Box<dyn Family>` slot.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// A registered family together with the bookkeeping the registry needs
/// (name cached outside the trait object to avoid re-borrowing it through
/// `dyn Family` on every lookup).
pub struct FamilyHandle {
    pub(crate) name: String,
    pub(crate) family: Box<dyn Family>,
}

impl FamilyHandle {
    /// Wrap a family implementation as a registered handle.
    pub fn new(family: Box<dyn Family>) -> Self {
        FamilyHandle {
            name: family.name().to_string(),
            family,
        }
    }

    /// The family's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::ops::Deref for FamilyHandle {
    type Target = dyn Family;

    fn deref(&self) -> &Self::Target {
        &*self.family
    }
}

impl std::ops::DerefMut for FamilyHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.family
    }
}
