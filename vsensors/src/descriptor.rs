//! Sensor descriptors (spec §3 "Descriptor", "Loading placeholder").

use vsensors_sys::ValueType;

use crate::family::SensorKey;
use crate::value::Value;

/// A registered, fully-resolved sensor.
#[derive(Debug, Clone)]
pub struct LiveDescriptor {
    /// Owning family's name.
    pub family: String,
    /// The sensor's label within its family.
    pub label: String,
    /// Opaque token the family uses to identify this sensor on `update`.
    pub key: SensorKey,
    /// The value type samples of this sensor are armed with.
    pub value_type: ValueType,
    /// Optional `(name, value)` metadata pairs. Unlike the C original,
    /// this is a plain `Vec` — no sentinel terminator is needed.
    pub properties: Vec<(String, Value)>,
}

/// A synthetic descriptor standing in for a pattern that matched no
/// sensor yet because the owning family hasn't finished enumerating
/// (spec §3 "Loading placeholder", REDESIGN FLAGS).
///
/// Matching it is the inverse of normal matching: the *stored* `pattern`
/// plays the pattern role, and the caller's candidate plays the subject
/// role (see [`crate::pattern`]).
#[derive(Debug, Clone)]
pub struct PendingDescriptor {
    /// The family this placeholder is waiting on.
    pub family: String,
    /// Label to display while pending (the segment after `/`, or the
    /// whole pattern if no `/` was present).
    pub label: String,
    /// The original pattern text a future match is checked against.
    pub pattern: String,
    /// Monotonically increasing id, used to order placeholders for
    /// reload replay (earlier-registered placeholders restore first).
    pub id: u64,
}

/// A sensor schema entry: either a fully resolved [`LiveDescriptor`] or a
/// [`PendingDescriptor`] awaiting family enumeration.
#[derive(Debug, Clone)]
pub enum Descriptor {
    /// A concrete, queryable sensor.
    Live(LiveDescriptor),
    /// A placeholder for an unresolved pattern.
    Pending(PendingDescriptor),
}

impl Descriptor {
    /// The owning family's name.
    pub fn family(&self) -> &str {
        match self {
            Descriptor::Live(d) => &d.family,
            Descriptor::Pending(d) => &d.family,
        }
    }

    /// The descriptor's label.
    pub fn label(&self) -> &str {
        match self {
            Descriptor::Live(d) => &d.label,
            Descriptor::Pending(d) => &d.label,
        }
    }

    /// The value type newly-armed samples should take on, `STRING` for
    /// placeholders (displayed as `"Loading..."`).
    pub fn value_type(&self) -> ValueType {
        match self {
            Descriptor::Live(d) => d.value_type,
            Descriptor::Pending(_) => ValueType::STRING,
        }
    }

    /// `true` if this is a [`Descriptor::Pending`] placeholder.
    pub fn is_pending(&self) -> bool {
        matches!(self, Descriptor::Pending(_))
    }

    pub(crate) fn as_live(&self) -> Option<&LiveDescriptor> {
        match self {
            Descriptor::Live(d) => Some(d),
            Descriptor::Pending(_) => None,
        }
    }

    pub(crate) fn as_pending(&self) -> Option<&PendingDescriptor> {
        match self {
            Descriptor::Pending(d) => Some(d),
            Descriptor::Live(_) => None,
        }
    }
}
