/*!
 * Alignment Utilities
 * Pure address arithmetic used by the pool
 */

use super::types::{Address, Size};

/// Platform word size, the default allocation alignment
#[inline]
pub const fn system_alignment() -> Size {
    std::mem::size_of::<usize>()
}

/// Alignment requirement of `T`
#[inline]
pub const fn type_alignment<T>() -> Size {
    std::mem::align_of::<T>()
}

/// Round `value` up to a multiple of `align` (a power of two, or 0 for no-op)
#[inline]
pub const fn align_up(value: Size, align: Size) -> Size {
    if align == 0 {
        return value;
    }
    (value + align - 1) & !(align - 1)
}

/// Round `value` down to a multiple of `align` (a power of two, or 0 for no-op)
#[inline]
pub const fn align_down(value: Size, align: Size) -> Size {
    if align == 0 {
        return value;
    }
    value & !(align - 1)
}

#[inline]
pub const fn is_aligned(address: Address, align: Size) -> bool {
    align == 0 || address & (align - 1) == 0
}

/// Bytes to add to `address` to reach the next multiple of `align`
#[inline]
pub const fn alignment_offset(address: Address, align: Size) -> Size {
    if align == 0 {
        return 0;
    }
    (align - (address % align)) % align
}

/// Largest power of two that is `<= value` (0 for 0)
#[inline]
pub const fn prev_power_of_two(value: Size) -> Size {
    if value == 0 {
        return 0;
    }
    1 << (usize::BITS - 1 - value.leading_zeros())
}
