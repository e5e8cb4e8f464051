//! The tagged sensor value (spec §3 "Value", §4.1).
//!
//! A [`Value`] is a small tagged union: either a scalar of one of the widths
//! named in [`ValueType`], or an owned [`Buffer`] (a NUL-terminated string or
//! a length-prefixed byte string). The raw-copy paths (`from_raw`,
//! `to_raw`) go through `vsensors-sys`'s zerocopy-backed helpers so that a
//! backend handing the registry a raw pointer (as a real FFI family would)
//! doesn't need `unsafe` anywhere in this crate beyond the single call site.

use std::cmp::Ordering;
use std::fmt;

use vsensors_sys::ValueType;

use crate::error::{ParseError, SensorResult};

/// Which kind of buffer a [`Buffer`] value holds.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum BufferKind {
    /// NUL-terminated string content.
    String,
    /// Length-prefixed raw bytes.
    Bytes,
}

/// An owned, capacity-bounded byte buffer backing a `STRING` or `BYTES`
/// value.
///
/// `used_size` is `data.len()`; `capacity` is enforced independently of
/// `Vec`'s own growth so that truncation behaves the way spec §4.1
/// describes (`used_size <= capacity`) regardless of how the `Vec`
/// happens to have grown.
#[derive(Clone)]
pub struct Buffer {
    kind: BufferKind,
    data: Vec<u8>,
    capacity: usize,
}

impl Buffer {
    /// Create an empty buffer of the given kind with the given capacity.
    pub fn with_capacity(kind: BufferKind, capacity: usize) -> Self {
        Buffer {
            kind,
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// The buffer's kind.
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Bytes currently stored (the "used size").
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Declared capacity. Writes never grow the used size past this value
    /// without first calling [`Buffer::reserve`].
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grow capacity to at least `min_capacity`, preserving content.
    ///
    /// Uses a fallible allocation so a backend that hands the registry an
    /// unreasonably large size doesn't abort the process: surfaces
    /// [`crate::error::SensorError::Exhausted`] instead.
    pub fn try_reserve(&mut self, min_capacity: usize) -> Result<(), crate::error::SensorError> {
        if min_capacity > self.capacity {
            if self.data.capacity() < min_capacity {
                self.data
                    .try_reserve(min_capacity - self.data.len())
                    .map_err(|e| crate::error::SensorError::Exhausted(e.to_string()))?;
            }
            self.capacity = min_capacity;
        }
        Ok(())
    }

    /// Replace the contents, truncating to `self.capacity` (or `capacity -
    /// 1` for strings, to leave room for the NUL terminator on export).
    pub fn set_bytes(&mut self, bytes: &[u8]) {
        let limit = match self.kind {
            BufferKind::String => self.capacity.saturating_sub(1),
            BufferKind::Bytes => self.capacity,
        };
        let len = bytes.len().min(limit);
        self.data.clear();
        self.data.extend_from_slice(&bytes[..len]);
    }

    fn eq_bytes(&self, other: &Buffer) -> bool {
        self.kind == other.kind && self.data == other.data
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("kind", &self.kind)
            .field("used", &self.data.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// The tagged sensor value (spec §3).
#[derive(Debug, Clone)]
pub enum Value {
    /// No value.
    Null,
    /// `u8`.
    UChar(u8),
    /// `i8`.
    Char(i8),
    /// `u16`.
    UInt16(u16),
    /// `i16`.
    Int16(i16),
    /// `u32`.
    UInt32(u32),
    /// `i32`.
    Int32(i32),
    /// Platform-width unsigned integer.
    UInt(usize),
    /// Platform-width signed integer.
    Int(isize),
    /// `u64`, kept distinct from [`Value::UInt64`] for parity with the
    /// value-type list's "long" vs "64-bit" split.
    ULong(u64),
    /// `i64`.
    Long(i64),
    /// `f32`.
    F32(f32),
    /// `f64`.
    F64(f64),
    /// Extended-precision float, stored as `f64`.
    FExtended(f64),
    /// `u64`.
    UInt64(u64),
    /// `i64`.
    Int64(i64),
    /// An owned string or byte buffer.
    Buffer(Buffer),
}

impl Value {
    /// The value's type tag.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::NULL,
            Value::UChar(_) => ValueType::UCHAR,
            Value::Char(_) => ValueType::CHAR,
            Value::UInt16(_) => ValueType::UINT16,
            Value::Int16(_) => ValueType::INT16,
            Value::UInt32(_) => ValueType::UINT32,
            Value::Int32(_) => ValueType::INT32,
            Value::UInt(_) => ValueType::UINT,
            Value::Int(_) => ValueType::INT,
            Value::ULong(_) => ValueType::ULONG,
            Value::Long(_) => ValueType::LONG,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::FExtended(_) => ValueType::FEXTENDED,
            Value::UInt64(_) => ValueType::UINT64,
            Value::Int64(_) => ValueType::INT64,
            Value::Buffer(b) => match b.kind() {
                BufferKind::String => ValueType::STRING,
                BufferKind::Bytes => ValueType::BYTES,
            },
        }
    }

    /// A zeroed value of the given type, with the given buffer capacity if
    /// `ty` is a buffer type (ignored otherwise).
    pub fn zeroed(ty: ValueType, buffer_capacity: usize) -> Value {
        match ty {
            ValueType::NULL => Value::Null,
            ValueType::UCHAR => Value::UChar(0),
            ValueType::CHAR => Value::Char(0),
            ValueType::UINT16 => Value::UInt16(0),
            ValueType::INT16 => Value::Int16(0),
            ValueType::UINT32 => Value::UInt32(0),
            ValueType::INT32 => Value::Int32(0),
            ValueType::UINT => Value::UInt(0),
            ValueType::INT => Value::Int(0),
            ValueType::ULONG => Value::ULong(0),
            ValueType::LONG => Value::Long(0),
            ValueType::F32 => Value::F32(0.0),
            ValueType::F64 => Value::F64(0.0),
            ValueType::FEXTENDED => Value::FExtended(0.0),
            ValueType::UINT64 => Value::UInt64(0),
            ValueType::INT64 => Value::Int64(0),
            ValueType::STRING => Value::Buffer(Buffer::with_capacity(BufferKind::String, buffer_capacity)),
            ValueType::BYTES => Value::Buffer(Buffer::with_capacity(BufferKind::Bytes, buffer_capacity)),
            _ => Value::Null,
        }
    }

    /// Fill a scalar value with the "never updated" marker (`0xff` bytes),
    /// as spec §4.7 requires for freshly-armed samples.
    pub fn mark_never_updated(&mut self) {
        match self {
            Value::Null => {}
            Value::UChar(v) => *v = u8::MAX,
            Value::Char(v) => *v = -1,
            Value::UInt16(v) => *v = u16::MAX,
            Value::Int16(v) => *v = -1,
            Value::UInt32(v) => *v = u32::MAX,
            Value::Int32(v) => *v = -1,
            Value::UInt(v) => *v = usize::MAX,
            Value::Int(v) => *v = -1,
            Value::ULong(v) => *v = u64::MAX,
            Value::Long(v) => *v = -1,
            Value::F32(v) => *v = f32::from_bits(u32::MAX),
            Value::F64(v) | Value::FExtended(v) => *v = f64::from_bits(u64::MAX),
            Value::UInt64(v) => *v = u64::MAX,
            Value::Int64(v) => *v = -1,
            Value::Buffer(b) => b.set_bytes(&vec![0xff; b.capacity()]),
        }
    }

    fn as_buffer(&self) -> Option<&Buffer> {
        match self {
            Value::Buffer(b) => Some(b),
            _ => None,
        }
    }

    /// Copy a primitive out of a raw pointer of the size implied by
    /// `self`'s current type. For buffer types, `src` is treated as a
    /// backend-owned region: a NUL-terminated C string for `STRING`
    /// (copied up to `capacity - 1` bytes), or exactly `capacity` raw bytes
    /// for `BYTES`.
    ///
    /// Returns `true` if the value changed (`UPDATED`), `false` if the
    /// bytes compared equal to what was already stored (`UNCHANGED`).
    ///
    /// # Safety
    /// `src` must be valid for reads of the size implied by `self`'s type:
    /// `scalar_size(self.value_type())` bytes for scalars, a NUL-terminated
    /// string for `STRING`, or `self.capacity()` bytes for `BYTES`.
    pub unsafe fn from_raw(&mut self, src: *const u8) -> Result<bool, ParseError> {
        if src.is_null() {
            return Err(ParseError::NotNumeric);
        }
        macro_rules! scalar_arm {
            ($variant:ident, $ty:ty) => {{
                let new: $ty = vsensors_sys::read_scalar(src);
                if let Value::$variant(old) = self {
                    let changed = *old != new;
                    *old = new;
                    Ok(changed)
                } else {
                    unreachable!()
                }
            }};
        }
        match self {
            Value::Null => Ok(false),
            Value::UChar(_) => scalar_arm!(UChar, u8),
            Value::Char(_) => scalar_arm!(Char, i8),
            Value::UInt16(_) => scalar_arm!(UInt16, u16),
            Value::Int16(_) => scalar_arm!(Int16, i16),
            Value::UInt32(_) => scalar_arm!(UInt32, u32),
            Value::Int32(_) => scalar_arm!(Int32, i32),
            Value::UInt(_) => scalar_arm!(UInt, usize),
            Value::Int(_) => scalar_arm!(Int, isize),
            Value::ULong(_) => scalar_arm!(ULong, u64),
            Value::Long(_) => scalar_arm!(Long, i64),
            Value::F32(_) => scalar_arm!(F32, f32),
            Value::F64(_) => scalar_arm!(F64, f64),
            Value::FExtended(_) => scalar_arm!(FExtended, f64),
            Value::UInt64(_) => scalar_arm!(UInt64, u64),
            Value::Int64(_) => scalar_arm!(Int64, i64),
            Value::Buffer(b) => {
                let new_bytes: Vec<u8> = match b.kind() {
                    BufferKind::String => {
                        let limit = b.capacity().saturating_sub(1);
                        let mut len = 0;
                        while len < limit && *src.add(len) != 0 {
                            len += 1;
                        }
                        std::slice::from_raw_parts(src, len).to_vec()
                    }
                    BufferKind::Bytes => std::slice::from_raw_parts(src, b.capacity()).to_vec(),
                };
                let changed = b.as_bytes() != new_bytes.as_slice();
                b.set_bytes(&new_bytes);
                Ok(changed)
            }
        }
    }

    /// Copy a primitive out of `self` to a raw pointer of the size implied
    /// by `self`'s current type — the write half of the [`Value::from_raw`]
    /// round trip (spec §4.1, P3).
    ///
    /// For buffer values, `dst` is treated as pointing at a
    /// [`vsensors_sys::RawBuffer`]-shaped descriptor rather than a plain
    /// content pointer: a write, unlike a read, has to report back how much
    /// it wrote, which a bare pointer can't carry. `used_size` bytes of
    /// content are copied into `*ptr` (NUL-terminated, within `capacity`,
    /// for `STRING`; truncated to `capacity` for `BYTES`), and the
    /// descriptor's `used` field is updated to the number of bytes written.
    ///
    /// # Safety
    /// For scalars, `dst` must be valid for writes of
    /// `scalar_size(self.value_type())` bytes. For buffer values, `dst`
    /// must be valid for reads and writes of
    /// `size_of::<vsensors_sys::RawBuffer>()` bytes as a
    /// `RawBuffer { ptr, used, capacity }` descriptor, and `ptr` must be
    /// valid for writes of `capacity` bytes.
    pub unsafe fn to_raw(&self, dst: *mut u8) {
        macro_rules! scalar_arm {
            ($v:expr) => {
                vsensors_sys::write_scalar($v, dst)
            };
        }
        match self {
            Value::Null => {}
            Value::UChar(v) => scalar_arm!(*v),
            Value::Char(v) => scalar_arm!(*v),
            Value::UInt16(v) => scalar_arm!(*v),
            Value::Int16(v) => scalar_arm!(*v),
            Value::UInt32(v) => scalar_arm!(*v),
            Value::Int32(v) => scalar_arm!(*v),
            Value::UInt(v) => scalar_arm!(*v),
            Value::Int(v) => scalar_arm!(*v),
            Value::ULong(v) => scalar_arm!(*v),
            Value::Long(v) => scalar_arm!(*v),
            Value::F32(v) => scalar_arm!(*v),
            Value::F64(v) => scalar_arm!(*v),
            Value::FExtended(v) => scalar_arm!(*v),
            Value::UInt64(v) => scalar_arm!(*v),
            Value::Int64(v) => scalar_arm!(*v),
            Value::Buffer(b) => {
                use vsensors_sys::{RAW_BUFFER_CAPACITY_OFFSET, RAW_BUFFER_PTR_OFFSET, RAW_BUFFER_USED_OFFSET};
                let buf_ptr = dst.add(RAW_BUFFER_PTR_OFFSET).cast::<*mut u8>().read_unaligned();
                let capacity = dst.add(RAW_BUFFER_CAPACITY_OFFSET).cast::<usize>().read_unaligned();
                let bytes = b.as_bytes();
                let limit = match b.kind() {
                    BufferKind::String => capacity.saturating_sub(1),
                    BufferKind::Bytes => capacity,
                };
                let len = bytes.len().min(limit);
                core::ptr::copy_nonoverlapping(bytes.as_ptr(), buf_ptr, len);
                if b.kind() == BufferKind::String {
                    *buf_ptr.add(len) = 0;
                }
                dst.add(RAW_BUFFER_USED_OFFSET).cast::<usize>().write_unaligned(len);
            }
        }
    }

    /// Copy `size` bytes from `src` into a buffer-typed value, growing the
    /// buffer to `(size + is_string) * 2` first if it is too small.
    ///
    /// # Safety
    /// `src` must be valid for reads of `size` bytes.
    pub unsafe fn from_buffer(&mut self, src: *const u8, size: usize) -> SensorResult<bool> {
        let Value::Buffer(b) = self else {
            return Err(ParseError::NotNumeric.into());
        };
        let is_string = matches!(b.kind(), BufferKind::String) as usize;
        let needed = size + is_string;
        if needed > b.capacity() {
            b.try_reserve(needed * 2)?;
        }
        let bytes = std::slice::from_raw_parts(src, size);
        let changed = b.as_bytes() != bytes;
        b.set_bytes(bytes);
        Ok(changed)
    }

    /// Format this value into `dst`, returning the number of bytes written
    /// (not counting any implicit terminator). `BYTES` values render as
    /// space-separated hex.
    pub fn to_string_into(&self, dst: &mut [u8]) -> Result<usize, ParseError> {
        let rendered = self.render_string();
        let bytes = rendered.as_bytes();
        if bytes.len() > dst.len() {
            return Err(ParseError::BufferTooSmall);
        }
        dst[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    fn render_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::UChar(v) => v.to_string(),
            Value::Char(v) => v.to_string(),
            Value::UInt16(v) => v.to_string(),
            Value::Int16(v) => v.to_string(),
            Value::UInt32(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::UInt(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::ULong(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::FExtended(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Buffer(b) => match b.kind() {
                BufferKind::String => String::from_utf8_lossy(b.as_bytes()).into_owned(),
                BufferKind::Bytes => b
                    .as_bytes()
                    .iter()
                    .map(|byte| format!("{byte:02x}"))
                    .collect::<Vec<_>>()
                    .join(" "),
            },
        }
    }

    /// Numeric conversion. `STRING` parses with a strict end-of-input
    /// check; `BYTES` is always an error.
    pub fn to_double(&self) -> Result<f64, ParseError> {
        match self {
            Value::Null => Err(ParseError::NotNumeric),
            Value::UChar(v) => Ok(*v as f64),
            Value::Char(v) => Ok(*v as f64),
            Value::UInt16(v) => Ok(*v as f64),
            Value::Int16(v) => Ok(*v as f64),
            Value::UInt32(v) => Ok(*v as f64),
            Value::Int32(v) => Ok(*v as f64),
            Value::UInt(v) => Ok(*v as f64),
            Value::Int(v) => Ok(*v as f64),
            Value::ULong(v) => Ok(*v as f64),
            Value::Long(v) => Ok(*v as f64),
            Value::F32(v) => Ok(*v as f64),
            Value::F64(v) => Ok(*v),
            Value::FExtended(v) => Ok(*v),
            Value::UInt64(v) => Ok(*v as f64),
            Value::Int64(v) => Ok(*v as f64),
            Value::Buffer(b) => match b.kind() {
                BufferKind::String => {
                    let s = String::from_utf8_lossy(b.as_bytes());
                    s.trim()
                        .parse::<f64>()
                        .map_err(|_| ParseError::InvalidNumber(s.into_owned()))
                }
                BufferKind::Bytes => Err(ParseError::NotNumeric),
            },
        }
    }

    /// Integer conversion to the widest signed type. Values above
    /// `i64::MAX` wrap to `value - i64::MAX` and set the returned
    /// `overflowed` flag, per spec §4.1.
    pub fn to_int(&self) -> Result<IntConversion, ParseError> {
        let unsigned_overflow = |v: u64| -> IntConversion {
            if v > i64::MAX as u64 {
                IntConversion {
                    value: (v - i64::MAX as u64) as i64,
                    overflowed: true,
                }
            } else {
                IntConversion {
                    value: v as i64,
                    overflowed: false,
                }
            }
        };
        match self {
            Value::Null => Err(ParseError::NotNumeric),
            Value::UChar(v) => Ok(IntConversion::exact(*v as i64)),
            Value::Char(v) => Ok(IntConversion::exact(*v as i64)),
            Value::UInt16(v) => Ok(IntConversion::exact(*v as i64)),
            Value::Int16(v) => Ok(IntConversion::exact(*v as i64)),
            Value::UInt32(v) => Ok(IntConversion::exact(*v as i64)),
            Value::Int32(v) => Ok(IntConversion::exact(*v as i64)),
            Value::UInt(v) => Ok(unsigned_overflow(*v as u64)),
            Value::Int(v) => Ok(IntConversion::exact(*v as i64)),
            Value::ULong(v) => Ok(unsigned_overflow(*v)),
            Value::Long(v) => Ok(IntConversion::exact(*v)),
            Value::F32(v) => Ok(IntConversion::exact(*v as i64)),
            Value::F64(v) => Ok(IntConversion::exact(*v as i64)),
            Value::FExtended(v) => Ok(IntConversion::exact(*v as i64)),
            Value::UInt64(v) => Ok(unsigned_overflow(*v)),
            Value::Int64(v) => Ok(IntConversion::exact(*v)),
            Value::Buffer(b) => match b.kind() {
                BufferKind::String => {
                    let s = String::from_utf8_lossy(b.as_bytes());
                    let trimmed = s.trim();
                    trimmed
                        .parse::<i64>()
                        .map(IntConversion::exact)
                        .or_else(|_| {
                            trimmed
                                .parse::<u64>()
                                .map(unsigned_overflow)
                                .map_err(|_| ParseError::InvalidNumber(s.into_owned()))
                        })
                }
                BufferKind::Bytes => Err(ParseError::NotNumeric),
            },
        }
    }

    /// `false` on different types. Floats require bit-exact equality (two
    /// representations of the same real number need not compare equal).
    pub fn equal(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::UChar(a), Value::UChar(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::UInt16(a), Value::UInt16(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::UInt32(a), Value::UInt32(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::ULong(a), Value::ULong(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::FExtended(a), Value::FExtended(b)) => a.to_bits() == b.to_bits(),
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Buffer(a), Value::Buffer(b)) => a.eq_bytes(b),
            _ => false,
        }
    }

    /// Total order extending [`Value::equal`]. `Null` sorts before
    /// everything else.
    pub fn compare(&self, other: &Value) -> i32 {
        match (self, other) {
            (Value::Null, Value::Null) => 0,
            (Value::Null, _) => -1,
            (_, Value::Null) => 1,
            _ if self.value_type() == other.value_type() => self.compare_same_type(other),
            _ => match (self.as_buffer(), other.as_buffer()) {
                (Some(a), None) => {
                    let rendered = other.render_string();
                    byte_compare(a.as_bytes(), rendered.as_bytes())
                }
                (None, Some(b)) => {
                    let rendered = self.render_string();
                    byte_compare(rendered.as_bytes(), b.as_bytes())
                }
                (Some(a), Some(b)) => byte_compare(a.as_bytes(), b.as_bytes()),
                (None, None) => {
                    let (Ok(a), Ok(b)) = (self.to_double(), other.to_double()) else {
                        return 0;
                    };
                    (a - b).ceil() as i32
                }
            },
        }
    }

    fn compare_same_type(&self, other: &Value) -> i32 {
        if let (Value::Buffer(a), Value::Buffer(b)) = (self, other) {
            return byte_compare(a.as_bytes(), b.as_bytes());
        }
        let (a, b) = (self.to_double().unwrap_or(0.0), other.to_double().unwrap_or(0.0));
        match a.partial_cmp(&b) {
            Some(Ordering::Less) => -1,
            Some(Ordering::Greater) => 1,
            _ => 0,
        }
    }

    /// Copy `src` into `self`. Buffer values truncate to `self`'s existing
    /// capacity; everything else is a plain overwrite.
    pub fn copy_from(&mut self, src: &Value) {
        if let (Value::Buffer(dst), Value::Buffer(s)) = (&mut *self, src) {
            if dst.kind() == s.kind() {
                dst.set_bytes(s.as_bytes());
                return;
            }
        }
        *self = src.clone();
    }
}

/// Result of [`Value::to_int`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntConversion {
    /// The (possibly wrapped) integer value.
    pub value: i64,
    /// Set when the source value exceeded `i64::MAX` and was wrapped.
    pub overflowed: bool,
}

impl IntConversion {
    fn exact(value: i64) -> Self {
        IntConversion {
            value,
            overflowed: false,
        }
    }
}

fn byte_compare(a: &[u8], b: &[u8]) -> i32 {
    match a.cmp(b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip_scalar() {
        let mut v = Value::UInt32(0);
        let x: u32 = 0x1234_5678;
        unsafe {
            let changed = v.from_raw(&x as *const u32 as *const u8).unwrap();
            assert!(changed);
        }
        assert_eq!(v.to_int().unwrap().value, 0x1234_5678);
    }

    #[test]
    fn raw_roundtrip_scalar_to_raw() {
        // P3: value.type = T; from_raw(&x, v); to_raw(v) == x.
        let mut v = Value::UInt32(0);
        let x: u32 = 0x1234_5678;
        unsafe {
            v.from_raw(&x as *const u32 as *const u8).unwrap();
        }
        let mut out: u32 = 0;
        unsafe {
            v.to_raw(&mut out as *mut u32 as *mut u8);
        }
        assert_eq!(out, x);
    }

    #[test]
    fn to_raw_buffer_reports_used_size_through_raw_buffer_descriptor() {
        let mut v = Value::zeroed(ValueType::STRING, 8);
        unsafe {
            v.from_buffer(b"hi".as_ptr(), 2).unwrap();
        }
        let mut storage = [0u8; 8];
        let mut raw = vsensors_sys::RawBuffer {
            ptr: storage.as_mut_ptr(),
            used: 0,
            capacity: storage.len(),
        };
        unsafe {
            v.to_raw(&mut raw as *mut vsensors_sys::RawBuffer as *mut u8);
        }
        assert_eq!(raw.used, 2);
        assert_eq!(&storage[..3], b"hi\0");
    }

    #[test]
    fn raw_roundtrip_unchanged() {
        let mut v = Value::Int32(42);
        let x: i32 = 42;
        unsafe {
            let changed = v.from_raw(&x as *const i32 as *const u8).unwrap();
            assert!(!changed);
        }
    }

    #[test]
    fn string_from_buffer_truncates_to_capacity() {
        let mut v = Value::zeroed(ValueType::STRING, 4);
        let src = b"hello world\0";
        unsafe {
            v.from_buffer(src.as_ptr(), src.len()).unwrap();
        }
        if let Value::Buffer(b) = &v {
            assert!(b.as_bytes().len() <= 3); // capacity - 1
        } else {
            panic!("expected buffer");
        }
    }

    #[test]
    fn equal_false_on_different_types() {
        let f = Value::F32(1.0);
        let d = Value::F64(1.0);
        assert!(!f.equal(&d));
        assert_eq!(f.compare(&d), 0);
    }

    #[test]
    fn equal_implies_zero_compare() {
        let a = Value::Int32(7);
        let b = Value::Int32(7);
        assert!(a.equal(&b));
        assert_eq!(a.compare(&b), 0);
    }

    #[test]
    fn string_and_int_compare_equalize() {
        let mut s = Value::zeroed(ValueType::STRING, 8);
        unsafe {
            s.from_buffer(b"1".as_ptr(), 1).unwrap();
        }
        let i = Value::Int32(1);
        assert!(!s.equal(&i));
        assert_eq!(s.compare(&i), 0);
    }

    #[test]
    fn null_sorts_first() {
        assert_eq!(Value::Null.compare(&Value::Int32(0)), -1);
        assert_eq!(Value::Int32(0).compare(&Value::Null), 1);
        assert_eq!(Value::Null.compare(&Value::Null), 0);
    }

    #[test]
    fn to_int_overflow_signals() {
        let big = Value::UInt64(u64::MAX);
        let conv = big.to_int().unwrap();
        assert!(conv.overflowed);
        assert_eq!(conv.value, (u64::MAX - i64::MAX as u64) as i64);
    }

    #[test]
    fn bytes_render_as_space_separated_hex() {
        let mut v = Value::zeroed(ValueType::BYTES, 4);
        unsafe {
            v.from_buffer([0xde, 0xad].as_ptr(), 2).unwrap();
        }
        let mut out = [0u8; 16];
        let n = v.to_string_into(&mut out).unwrap();
        assert_eq!(&out[..n], b"de ad");
    }
}
