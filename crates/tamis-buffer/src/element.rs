//! Element types storable in a [`Buffer`](crate::Buffer).

#![allow(unsafe_code)]

/// A fixed-size, plain-data element type.
///
/// # Safety
///
/// The all-zero bit pattern must be a valid value of `Self` and must equal
/// [`Element::ZERO`]. Providers rely on this to hand out zero-filled memory
/// straight from the allocator.
pub unsafe trait Element: Copy + Send + Sync + 'static {
    /// The zero value, bitwise all zeros.
    const ZERO: Self;
}

macro_rules! impl_element {
    ($($ty:ty => $zero:expr),* $(,)?) => {
        $(
            // SAFETY: primitive numeric types are valid for any bit pattern,
            // and all zeros is their zero value.
            unsafe impl Element for $ty {
                const ZERO: Self = $zero;
            }
        )*
    };
}

impl_element! {
    u8 => 0, u16 => 0, u32 => 0, u64 => 0, u128 => 0, usize => 0,
    i8 => 0, i16 => 0, i32 => 0, i64 => 0, i128 => 0, isize => 0,
    f32 => 0.0, f64 => 0.0,
}

// SAFETY: an array of zero-valid elements is zero-valid, and its zero is the
// array of element zeros.
unsafe impl<T: Element, const N: usize> Element for [T; N] {
    const ZERO: Self = [T::ZERO; N];
}
