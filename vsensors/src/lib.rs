//! A process-embedded sensor-management registry: pluggable sensor
//! *families* (CPU, memory, demo counters, ...), glob-pattern watch
//! subscriptions with per-watch sampling intervals, strict
//! change-detection, dynamic family reload, and multi-reader/
//! single-writer concurrency.
//!
//! Logging runs through the [`log`] crate's facade under the `"sensors"`
//! target, the same category the original library used for its log-pool
//! facade; wire up any `log::Log` implementation (`env_logger` in this
//! workspace's dev-dependencies) to see it.
//!
//! A typical embedding:
//!
//! ```
//! use std::time::{Duration, Instant};
//! use vsensors::{Context, ContextFlags, SearchFlags, WatchParams};
//! use vsensors::families::demo::DemoFamily;
//!
//! let ctx = Context::init(vec![Box::new(DemoFamily::new())], ContextFlags::empty())?;
//! ctx.watch_add("demo/*", SearchFlags::default(), WatchParams::new(Duration::from_millis(10), None))?;
//!
//! match vsensors::update_get(&ctx, Instant::now())? {
//!     vsensors::UpdateBatch::Updated(keys) => println!("{} sensors changed", keys.len()),
//!     vsensors::UpdateBatch::Reloaded => println!("a family reloaded, re-fetch the watch list"),
//! }
//! # Ok::<(), vsensors::SensorError>(())
//! ```

pub mod context;
pub mod descriptor;
pub mod error;
pub mod event_queue;
pub mod families;
pub mod family;
pub mod index;
pub mod lock;
pub mod params;
pub mod pattern;
pub mod sample;
pub mod update;
pub mod value;
pub mod watch_ops;

pub use context::{Context, ContextFlags, ContextOptions, RegistryState, DEFAULT_SCRATCH_BUFFER_SIZE};
pub use descriptor::{Descriptor, LiveDescriptor, PendingDescriptor};
pub use error::{ParseError, SensorError, SensorResult};
pub use event_queue::{DeviceAction, Event, EventQueue};
pub use family::{Deadline, Family, FamilyHandle, NotifyEvent, SensorKey, WatchNotifyInfo};
pub use index::{ProbeKey, StorageKey};
pub use lock::{LockGuard, LockMode, RegistryLock};
pub use params::{ParamIntern, ParamKey, WatchCallback, WatchParams};
pub use pattern::{placeholder_matches, Pattern, SearchFlags};
pub use sample::Sample;
pub use update::{init_wait, reload_family, update_check, update_get, watch_pgcd, UpdateBatch};
pub use value::{Buffer, BufferKind, IntConversion, Value};
pub use watch_ops::{watch_add, watch_add_desc, watch_del};

/// Status and value-type codes re-exported from `vsensors-sys` (spec §6):
/// a host embedding this library carries these end-to-end, so they live
/// in the small FFI-facing crate rather than here.
pub use vsensors_sys::{Status, ValueType};
