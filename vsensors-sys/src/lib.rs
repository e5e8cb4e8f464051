//! Raw plumbing for the `vsensors` registry: stable C-style enums and a
//! `repr(C)` buffer header with zerocopy-backed primitive access.
//!
//! Nothing in this crate is safe to use without understanding the
//! invariants documented on each item — it mirrors the role
//! `perf-event-open-sys2` plays for `perf-event`: a thin, unsafe layer that
//! the safe crate builds on and never exposes directly.

mod raw;
mod status;
mod value_type;

pub use raw::{read_scalar, scalar_size, write_scalar, RawBuffer, RAW_BUFFER_CAPACITY_OFFSET,
    RAW_BUFFER_PTR_OFFSET, RAW_BUFFER_USED_OFFSET};
pub use status::Status;
pub use value_type::ValueType;
