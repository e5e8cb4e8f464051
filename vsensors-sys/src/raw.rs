use memoffset::offset_of;
use zerocopy::{FromBytes, Immutable, IntoBytes};

use crate::value_type::ValueType;

/// Raw layout of a buffer-typed value (`STRING` or `BYTES`), matching the
/// `{pointer, used_size, capacity}` triple the data model describes.
///
/// This is `repr(C)` because a real backend crossing an FFI boundary (a C
/// family implementation, or a kernel-facing shim) would hand the registry
/// exactly this struct; the safe `vsensors::Value::Buffer` variant is built
/// on top of it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawBuffer {
    pub ptr: *mut u8,
    pub used: usize,
    pub capacity: usize,
}

/// Byte offset of [`RawBuffer::ptr`] within the struct.
pub const RAW_BUFFER_PTR_OFFSET: usize = offset_of!(RawBuffer, ptr);
/// Byte offset of [`RawBuffer::used`] within the struct.
pub const RAW_BUFFER_USED_OFFSET: usize = offset_of!(RawBuffer, used);
/// Byte offset of [`RawBuffer::capacity`] within the struct.
pub const RAW_BUFFER_CAPACITY_OFFSET: usize = offset_of!(RawBuffer, capacity);

/// Size in bytes of the scalar representation of `ty`.
///
/// Returns `0` for `NULL` and the buffer variants, which have no fixed
/// scalar width.
pub const fn scalar_size(ty: ValueType) -> usize {
    match ty {
        ValueType::NULL => 0,
        ValueType::UCHAR | ValueType::CHAR => 1,
        ValueType::UINT16 | ValueType::INT16 => 2,
        ValueType::UINT32 | ValueType::INT32 | ValueType::F32 => 4,
        ValueType::UINT | ValueType::INT => core::mem::size_of::<isize>(),
        ValueType::ULONG | ValueType::LONG => 8,
        ValueType::F64 => 8,
        ValueType::FEXTENDED => 16,
        ValueType::UINT64 | ValueType::INT64 => 8,
        ValueType::STRING | ValueType::BYTES => 0,
        _ => 0,
    }
}

/// Read a `T` out of a raw, possibly-unaligned pointer.
///
/// # Safety
/// `src` must be valid for reads of `size_of::<T>()` bytes.
pub unsafe fn read_scalar<T>(src: *const u8) -> T
where
    T: FromBytes + Immutable + Copy,
{
    let len = core::mem::size_of::<T>();
    let slice = core::slice::from_raw_parts(src, len);
    T::read_from_bytes(slice).unwrap_or_else(|_| unreachable!("slice length matches size_of::<T>()"))
}

/// Write a `T` to a raw, possibly-unaligned pointer.
///
/// # Safety
/// `dst` must be valid for writes of `size_of::<T>()` bytes.
pub unsafe fn write_scalar<T>(value: T, dst: *mut u8)
where
    T: IntoBytes + Immutable + Copy,
{
    let bytes = value.as_bytes();
    core::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let x: u32 = 0xdead_beef;
        let mut buf = [0u8; 4];
        unsafe {
            write_scalar(x, buf.as_mut_ptr());
            let y: u32 = read_scalar(buf.as_ptr());
            assert_eq!(x, y);
        }
    }

    #[test]
    fn buffer_offsets_are_distinct() {
        assert_ne!(RAW_BUFFER_PTR_OFFSET, RAW_BUFFER_USED_OFFSET);
        assert_ne!(RAW_BUFFER_USED_OFFSET, RAW_BUFFER_CAPACITY_OFFSET);
    }
}
