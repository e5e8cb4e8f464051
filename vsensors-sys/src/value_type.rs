use c_enum::c_enum;

c_enum! {
    /// Stable value-type tag for a sensor [`Value`](../vsensors/enum.Value.html).
    ///
    /// Each variant corresponds to one arm of the tagged union described in
    /// the sensor data model. The list is stable (see the crate's
    /// `GLOSSARY`); new variants are appended, never reordered, so that a
    /// numeric tag written by one version keeps its meaning in another.
    #[repr(transparent)]
    #[derive(Clone, Copy, Eq, PartialEq, Hash)]
    pub enum ValueType : u8 {
        /// No value present.
        NULL = 0,
        /// `u8`.
        UCHAR = 1,
        /// `i8`.
        CHAR = 2,
        /// `u16`.
        UINT16 = 3,
        /// `i16`.
        INT16 = 4,
        /// `u32`.
        UINT32 = 5,
        /// `i32`.
        INT32 = 6,
        /// Platform `usize`-width unsigned integer.
        UINT = 7,
        /// Platform `isize`-width signed integer.
        INT = 8,
        /// `u64` (kept distinct from `UINT64` for parity with the "long" vs
        /// "64-bit" split in the C ancestor of this type list).
        ULONG = 9,
        /// `i64`.
        LONG = 10,
        /// `f32`.
        F32 = 11,
        /// `f64`.
        F64 = 12,
        /// Extended precision float (stored as `f64` on platforms without a
        /// wider native float; see [`ValueType::is_float`]).
        FEXTENDED = 13,
        /// `u64`.
        UINT64 = 14,
        /// `i64`.
        INT64 = 15,
        /// NUL-terminated string buffer.
        STRING = 16,
        /// Length-prefixed byte buffer.
        BYTES = 17,
    }
}

impl ValueType {
    /// True for the two buffer-backed variants (`STRING`, `BYTES`).
    pub const fn is_buffer(self) -> bool {
        matches!(self, Self::STRING | Self::BYTES)
    }

    /// True for any floating-point variant.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64 | Self::FEXTENDED)
    }

    /// True for any signed integer variant.
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::CHAR | Self::INT16 | Self::INT32 | Self::INT | Self::LONG | Self::INT64)
    }

    /// True for any unsigned integer variant.
    pub const fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            Self::UCHAR | Self::UINT16 | Self::UINT32 | Self::UINT | Self::ULONG | Self::UINT64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_variants() {
        assert!(ValueType::STRING.is_buffer());
        assert!(ValueType::BYTES.is_buffer());
        assert!(!ValueType::INT32.is_buffer());
    }

    #[test]
    fn debug_names_roundtrip() {
        assert_eq!(format!("{:?}", ValueType::UINT32), "ValueType::UINT32");
        assert_eq!(format!("{:?}", ValueType::new(200)), "ValueType(200)");
    }
}
