use thiserror::Error;

/// Everything that can go wrong calling into the registry.
///
/// Mirrors spec §7: most of these map back onto a [`Status`](crate::Status)
/// at the FFI boundary, but within Rust callers get a real `Result`.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The requested operation isn't implemented by this backend or
    /// platform.
    #[error("operation not supported")]
    NotSupported,

    /// A family's `update`/`write` returned `ERROR`.
    #[error("sensor update failed: {0}")]
    Transient(String),

    /// A value conversion (`to_int`, `to_double`, `from_raw`, ...) failed.
    #[error("value conversion failed: {0}")]
    Parse(#[from] ParseError),

    /// A pattern could not be compiled into a matcher.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A buffer value's backing allocation could not grow to the requested
    /// capacity (see [`crate::value::Buffer::try_reserve`]); registry
    /// invariants remain consistent.
    #[error("resource exhausted: {0}")]
    Exhausted(String),
}

/// Failure converting a [`Value`](crate::Value) to a string, int, or float.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// `to_double`/`to_int` called on a buffer-typed value (`BYTES`) that
    /// has no numeric interpretation.
    #[error("value of this type has no numeric interpretation")]
    NotNumeric,

    /// A string value did not parse as a number, or had trailing garbage
    /// after the numeric portion.
    #[error("could not parse {0:?} as a number")]
    InvalidNumber(String),

    /// `to_int` overflowed the signed range and the overflow flag should be
    /// consulted.
    #[error("value overflowed the signed integer range")]
    Overflow,

    /// Destination buffer was too small to hold the formatted output.
    #[error("formatted value does not fit in the destination buffer")]
    BufferTooSmall,
}

/// Convenience alias used throughout the crate.
pub type SensorResult<T> = Result<T, SensorError>;
