//! The registry entry point (spec §4.3).

use std::sync::Arc;

use bitflags::bitflags;
use log::{debug, info, warn};

use vsensors_sys::Status;

use crate::descriptor::Descriptor;
use crate::error::{SensorError, SensorResult};
use crate::event_queue::EventQueue;
use crate::family::{Family, FamilyHandle, NotifyEvent};
use crate::index::sensor::SensorIndex;
use crate::index::watch::WatchIndex;
use crate::index::StorageKey;
use crate::lock::{LockGuard, LockMode, RegistryLock};
use crate::params::ParamIntern;
use crate::pattern::SearchFlags;
use crate::value::Value;

bitflags! {
    /// Context-wide behavioral flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ContextFlags: u32 {
        /// Start the common family's background worker thread (requires
        /// the `worker` Cargo feature).
        const START_WORKER = 1 << 0;
    }
}

/// Default size of the scratch `bytes` buffer used for buffer-typed
/// change detection (spec §4.3).
pub const DEFAULT_SCRATCH_BUFFER_SIZE: usize = 512;

/// Everything the registry protects behind its reader-writer lock: the
/// family list, both ordered indices, the parameter intern table, and the
/// two scratch values the update engine uses for allocation-free
/// change-detection.
pub struct RegistryState {
    pub families: Vec<FamilyHandle>,
    pub sensors: SensorIndex,
    pub watches: WatchIndex,
    pub params: ParamIntern,
    pub next_placeholder_id: u64,
    pub scratch_scalar: Value,
    pub scratch_buffer: Value,
}

impl RegistryState {
    pub fn new() -> Self {
        RegistryState::with_scratch_buffer_size(DEFAULT_SCRATCH_BUFFER_SIZE)
    }

    pub fn with_scratch_buffer_size(scratch_buffer_size: usize) -> Self {
        RegistryState {
            families: Vec::new(),
            sensors: SensorIndex::new(),
            watches: WatchIndex::new(),
            params: ParamIntern::new(),
            next_placeholder_id: 0,
            scratch_scalar: Value::Null,
            scratch_buffer: Value::zeroed(vsensors_sys::ValueType::BYTES, scratch_buffer_size),
        }
    }

    /// Index of the family named `name`, if registered.
    pub fn family_index(&self, name: &str) -> Option<usize> {
        self.families.iter().position(|f| f.name() == name)
    }

    /// Run `list()` on `family_index` and insert its descriptors into the
    /// sensor index, returning the freshly inserted keys.
    pub fn populate_family(&mut self, family_index: usize) -> Vec<StorageKey> {
        let descriptors = self.families[family_index].list();
        let mut keys = Vec::with_capacity(descriptors.len());
        for desc in descriptors {
            keys.push(self.sensors.insert(desc));
        }
        keys
    }
}

/// Builder for [`Context::with_options`] (spec.md's "Configuration"
/// ambient section): the pieces of a context's setup beyond "which
/// families" that a long-lived embedding typically wants to control —
/// the scratch buffer's starting capacity, initial flags, the log
/// target records are tagged with, and (behind the `worker` feature) the
/// event source the common family's worker thread polls if
/// [`ContextFlags::START_WORKER`] is set — the same shape the teacher
/// exposes on its own sampler-building types via a plain builder struct
/// rather than a config file.
pub struct ContextOptions {
    scratch_buffer_size: usize,
    flags: ContextFlags,
    log_target: String,
    #[cfg(feature = "worker")]
    event_source: Option<Box<dyn crate::families::common::EventSource>>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            scratch_buffer_size: DEFAULT_SCRATCH_BUFFER_SIZE,
            flags: ContextFlags::empty(),
            log_target: "sensors".to_string(),
            #[cfg(feature = "worker")]
            event_source: None,
        }
    }
}

impl ContextOptions {
    pub fn new() -> Self {
        ContextOptions::default()
    }

    /// Initial capacity of the change-detection scratch buffer (spec §4.3).
    pub fn scratch_buffer_size(mut self, size: usize) -> Self {
        self.scratch_buffer_size = size;
        self
    }

    pub fn flags(mut self, flags: ContextFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Override the `log` target used for this context's diagnostics.
    /// Defaults to `"sensors"`.
    pub fn log_target(mut self, target: impl Into<String>) -> Self {
        self.log_target = target.into();
        self
    }

    /// Event source the common family's worker thread polls if
    /// [`ContextFlags::START_WORKER`] is set. Ignored otherwise. Requires
    /// the `worker` Cargo feature.
    #[cfg(feature = "worker")]
    pub fn event_source(mut self, source: Box<dyn crate::families::common::EventSource>) -> Self {
        self.event_source = Some(source);
        self
    }
}

/// The sensor-management registry (spec §4.3).
///
/// Guards its mutable state behind a single [`RegistryLock`]; public
/// methods acquire it for the duration of the call. Longer-lived
/// operations that must juggle the lock themselves (the update engine's
/// reader-to-writer upgrade on `RELOAD_FAMILY`) live in [`crate::update`]
/// and take `&Context` directly.
pub struct Context {
    pub(crate) state: RegistryLock<RegistryState>,
    flags: ContextFlags,
    log_target: String,
    pub(crate) event_queue: Arc<EventQueue>,
}

impl Context {
    /// Create a context and register every family in `families`, using
    /// default options besides `flags`. Mirrors `context.init` registering
    /// the compiled-in family set; this crate has no compile-time family
    /// registry, so the caller supplies it.
    pub fn init(families: Vec<Box<dyn Family>>, flags: ContextFlags) -> SensorResult<Context> {
        Context::with_options(families, ContextOptions::new().flags(flags))
    }

    /// Create a context with explicit [`ContextOptions`].
    pub fn with_options(families: Vec<Box<dyn Family>>, options: ContextOptions) -> SensorResult<Context> {
        let log_target = options.log_target;
        let event_queue = Arc::new(EventQueue::new());
        let mut state = RegistryState::with_scratch_buffer_size(options.scratch_buffer_size);

        // The reserved "common" family is always registered first (see the
        // reverse-order teardown in `free`), so it outlives every caller
        // family's `update`/`notify` calls.
        #[allow(unused_mut)]
        let mut common = crate::families::common::CommonFamily::new(event_queue.clone());
        #[cfg(feature = "worker")]
        if options.flags.contains(ContextFlags::START_WORKER) {
            match options.event_source {
                Some(source) => common.start_worker(source),
                None => warn!(
                    target: &log_target,
                    "ContextFlags::START_WORKER set but no event source was configured; worker not started"
                ),
            }
        }
        state.families.push(FamilyHandle::new(Box::new(common)));
        state.populate_family(0);

        for mut family in families {
            let status = family.init();
            if status.is_error() {
                warn!(target: &log_target, "family {:?} failed to init: {status:?}", family.name());
                continue;
            }
            state.families.push(FamilyHandle::new(family));
            let idx = state.families.len() - 1;
            let keys = state.populate_family(idx);
            debug!(target: &log_target, "family {:?} registered {} sensors", state.families[idx].name(), keys.len());
        }
        Ok(Context {
            state: RegistryLock::new(state),
            flags: options.flags,
            log_target,
            event_queue,
        })
    }

    /// The `log` target this context's diagnostics are recorded under.
    pub fn log_target(&self) -> &str {
        &self.log_target
    }

    /// Acquire the registry lock.
    pub fn lock(&self, mode: LockMode) -> LockGuard<'_, RegistryState> {
        self.state.lock(mode)
    }

    /// Release a reader guard and reacquire as writer (spec §5
    /// `lock_upgrade`). See [`RegistryLock::upgrade`] for the caveats
    /// callers must observe (not ABA-free).
    pub fn lock_upgrade<'a>(&'a self, guard: LockGuard<'a, RegistryState>) -> LockGuard<'a, RegistryState> {
        self.state.upgrade(guard)
    }

    /// Tear down the registry: checks tree/list agreement, drops every
    /// watch and descriptor, then frees every family.
    pub fn free(mut self) -> SensorResult<()> {
        let mut guard = self.state.lock(LockMode::Write);
        debug_assert_tree_list_agreement(&guard);

        let watch_keys: Vec<StorageKey> = guard.watches.list().to_vec();
        for key in watch_keys {
            if let Some(sample) = guard.watches.remove(&key) {
                guard.params.release(sample.watch);
            }
        }

        let sensor_keys: Vec<StorageKey> = guard.sensors.list().to_vec();
        for key in sensor_keys {
            guard.sensors.remove(&key);
        }

        let mut families = std::mem::take(&mut guard.families);
        drop(guard);
        // Free in reverse registration order so the reserved "common"
        // family (registered first by convention) goes last.
        for handle in families.iter_mut().rev() {
            handle.free();
        }
        info!(target: &self.log_target, "context freed, {} families torn down", families.len());
        Ok(())
    }

    /// Late family registration (spec §4.3 `family_register`): if the
    /// sensor list already exists, the new family's descriptors are
    /// appended immediately.
    pub fn family_register(&self, mut family: Box<dyn Family>) -> SensorResult<()> {
        let status = family.init();
        if status.is_error() {
            return Err(SensorError::Transient(format!("family init failed: {status:?}")));
        }
        let mut guard = self.state.lock(LockMode::Write);
        guard.families.push(FamilyHandle::new(family));
        let idx = guard.families.len() - 1;
        guard.populate_family(idx);
        Ok(())
    }

    /// Whether the built-in "common" family is registered (spec §4.3
    /// `family_common`). Always true for a context built through
    /// [`Context::init`]/[`Context::with_options`]: it is registered
    /// automatically, first, before any caller-supplied family.
    pub fn family_common(&self) -> bool {
        let guard = self.state.lock(LockMode::Read);
        guard.family_index("common").is_some()
    }

    /// Start the common family's background worker thread polling
    /// `source` into the shared event queue (spec §4.9). Requires the
    /// `worker` Cargo feature. Returns [`SensorError::NotSupported`] if the
    /// common family somehow isn't registered (it always is, for contexts
    /// built through this crate's constructors).
    #[cfg(feature = "worker")]
    pub fn start_worker(&self, source: Box<dyn crate::families::common::EventSource>) -> SensorResult<()> {
        let mut guard = self.state.lock(LockMode::Write);
        let common = common_family_mut(&mut guard)?;
        common.start_worker(source);
        Ok(())
    }

    /// Stop the common family's worker thread, if running, joining it
    /// before returning. Requires the `worker` Cargo feature.
    #[cfg(feature = "worker")]
    pub fn stop_worker(&self) -> SensorResult<()> {
        let mut guard = self.state.lock(LockMode::Write);
        let common = common_family_mut(&mut guard)?;
        common.stop_worker();
        Ok(())
    }

    /// Write a new value to a writable sensor (spec §4.2 `write`). Looks up
    /// the owning family and dispatches through [`Family::write`];
    /// read-only families and families with no `write` override report
    /// [`vsensors_sys::Status::NOT_SUPPORTED`] rather than erroring.
    pub fn write(&self, desc_key: &StorageKey, value: &Value) -> SensorResult<Status> {
        let mut guard = self.state.lock(LockMode::Write);
        let Some(desc) = guard.sensors.get(desc_key) else {
            return Ok(Status::NOT_SUPPORTED);
        };
        let family_name = desc.family().to_string();
        let sensor_key = match desc {
            Descriptor::Live(d) => d.key,
            Descriptor::Pending(_) => return Ok(Status::NOT_SUPPORTED),
        };
        let Some(family_idx) = guard.family_index(&family_name) else {
            return Ok(Status::NOT_SUPPORTED);
        };
        let status = guard.families[family_idx].write(sensor_key, value);
        if status.is_error() {
            warn!(
                target: &self.log_target,
                "write: family {family_name:?} reported {status:?} for {desc_key:?}"
            );
        }
        Ok(status)
    }

    /// Names of every registered family, in registration order.
    pub fn registered_families(&self) -> Vec<String> {
        let guard = self.state.lock(LockMode::Read);
        guard.families.iter().map(|f| f.name().to_string()).collect()
    }

    /// Total number of live sensor descriptors (including placeholders).
    pub fn sensor_count(&self) -> usize {
        self.state.lock(LockMode::Read).sensors.len()
    }

    /// Total number of active watches.
    pub fn watch_count(&self) -> usize {
        self.state.lock(LockMode::Read).watches.len()
    }

    /// The shared event queue backing the common family (spec §4.9).
    pub fn event_queue(&self) -> &Arc<EventQueue> {
        &self.event_queue
    }

    pub fn flags(&self) -> ContextFlags {
        self.flags
    }

    /// Add watches for every descriptor matching `pattern` (spec §4.7).
    pub fn watch_add(
        &self,
        pattern: &str,
        flags: SearchFlags,
        params: crate::params::WatchParams,
    ) -> SensorResult<usize> {
        let mut guard = self.state.lock(LockMode::Write);
        crate::watch_ops::watch_add(&mut guard, pattern, flags, params)
    }

    /// Remove every watch matching `pattern` (spec §4.7).
    pub fn watch_del(&self, pattern: &str, flags: SearchFlags) -> SensorResult<usize> {
        let mut guard = self.state.lock(LockMode::Write);
        crate::watch_ops::watch_del(&mut guard, pattern, flags)
    }

    /// Persist the current watch set to `_writer`. Declared but not
    /// implemented: the persisted format is an open question upstream (see
    /// `DESIGN.md`), so this always reports [`SensorError::NotSupported`]
    /// rather than inventing one.
    pub fn watch_save(&self, _writer: &mut dyn std::io::Write) -> SensorResult<()> {
        Err(SensorError::NotSupported)
    }

    /// Restore a previously saved watch set from `_reader`. See
    /// [`Context::watch_save`].
    pub fn watch_load(&self, _reader: &mut dyn std::io::Read) -> SensorResult<()> {
        Err(SensorError::NotSupported)
    }
}

#[cfg(feature = "worker")]
fn common_family_mut(
    state: &mut RegistryState,
) -> SensorResult<&mut crate::families::common::CommonFamily> {
    let idx = state.family_index("common").ok_or(SensorError::NotSupported)?;
    state.families[idx]
        .as_any_mut()
        .downcast_mut::<crate::families::common::CommonFamily>()
        .ok_or(SensorError::NotSupported)
}

fn debug_assert_tree_list_agreement(state: &RegistryState) {
    #[cfg(debug_assertions)]
    {
        let mut from_list: Vec<&StorageKey> = state.sensors.list().iter().collect();
        from_list.sort();
        let from_tree: Vec<&StorageKey> = state.sensors.iter().map(|(k, _)| k).collect();
        debug_assert_eq!(from_list, from_tree, "sensor_tree and sensor_list disagree");

        let mut watch_list: Vec<&StorageKey> = state.watches.list().iter().collect();
        watch_list.sort();
        let watch_tree: Vec<&StorageKey> = state.watches.iter().map(|(k, _)| k).collect();
        debug_assert_eq!(watch_list, watch_tree, "watch_tree and watchlist disagree");
    }
    let _ = state;
}

/// Placeholder value literal shown while a family is still enumerating.
pub fn loading_placeholder_value() -> Value {
    let mut v = Value::zeroed(vsensors_sys::ValueType::STRING, 16);
    if let Value::Buffer(buf) = &mut v {
        buf.set_bytes(b"Loading...");
    }
    v
}

