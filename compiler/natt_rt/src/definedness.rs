//! Sentinels and the definedness bitmap codec.
//!
//! Representations with a spare bit pattern encode "undefined" in-band:
//!
//! | Representation | Sentinel |
//! |---|---|
//! | boxed reference | null pointer |
//! | tagged integer | [`INT_TAG`](crate::INT_TAG) |
//! | boolean | [`BOOL_UNDEFINED`] |
//!
//! Floats and fixed-width integers have no spare pattern. Their slots hold
//! [`FLOAT_ERROR`] / [`NativeInt::ERROR`] when undefined, and a bit in a `u32`
//! word inside the instance tells "undefined" apart from "defined and equal
//! to the sentinel". The bit is only consulted after the sentinel matched.
//!
//! # Concurrency
//!
//! By default [`set_defined`] is a plain read-modify-write of the whole word.
//! Attributes sharing a word are therefore not safe against concurrent
//! writers, even when each writer touches a different attribute. The
//! `atomic-bitmap` feature switches to relaxed atomic `fetch_or`/`fetch_and`.
//!
//! ```text
//!   cargo test -p natt_rt --features atomic-bitmap
//! ```

use std::fmt::Debug;

use crate::descriptor::BitmapRef;
use crate::instance::Instance;

/// Byte stored in a boolean slot when the attribute is undefined.
pub const BOOL_UNDEFINED: u8 = 2;

/// Value stored in a float slot when the attribute is undefined.
pub const FLOAT_ERROR: f64 = -113.0;

/// Fixed-width signed integer slot types.
pub trait NativeInt: Copy + PartialEq + Debug + 'static {
    /// Value stored in the slot when the attribute is undefined.
    const ERROR: Self;
    /// Diagnostic name (`i16`, `i32`, `i64`).
    const NAME: &'static str;

    /// Narrow an `i64`; `None` when out of range.
    fn narrow(value: i64) -> Option<Self>;

    fn widen(self) -> i64;
}

macro_rules! impl_native_int {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl NativeInt for $ty {
                const ERROR: Self = -113;
                const NAME: &'static str = $name;

                #[inline]
                fn narrow(value: i64) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }

                #[inline]
                fn widen(self) -> i64 {
                    i64::from(self)
                }
            }
        )*
    };
}

impl_native_int!(i16 => "i16", i32 => "i32", i64 => "i64");

/// Set or clear the bitmap bit named by `bitmap`.
///
/// Only the bits in `bitmap.mask` change; sibling bits in the same word are
/// preserved.
#[cfg(not(feature = "atomic-bitmap"))]
#[inline]
pub fn set_defined(instance: Instance, bitmap: BitmapRef, defined: bool) {
    let word: u32 = instance.read(bitmap.offset);
    let word = if defined {
        word | bitmap.mask
    } else {
        word & !bitmap.mask
    };
    instance.write(bitmap.offset, word);
}

/// Set or clear the bitmap bit named by `bitmap`.
///
/// Only the bits in `bitmap.mask` change; sibling bits in the same word are
/// preserved.
#[cfg(feature = "atomic-bitmap")]
#[inline]
pub fn set_defined(instance: Instance, bitmap: BitmapRef, defined: bool) {
    use std::sync::atomic::{AtomicU32, Ordering};

    // SAFETY: the word is in bounds and 4-aligned per the `Instance` contract.
    let word = unsafe { AtomicU32::from_ptr(instance.slot::<u32>(bitmap.offset)) };
    if defined {
        word.fetch_or(bitmap.mask, Ordering::Relaxed);
    } else {
        word.fetch_and(!bitmap.mask, Ordering::Relaxed);
    }
}

/// Whether the bit named by `bitmap` is clear.
#[cfg(not(feature = "atomic-bitmap"))]
#[inline]
pub fn is_undefined(instance: Instance, bitmap: BitmapRef) -> bool {
    instance.read::<u32>(bitmap.offset) & bitmap.mask == 0
}

/// Whether the bit named by `bitmap` is clear.
#[cfg(feature = "atomic-bitmap")]
#[inline]
pub fn is_undefined(instance: Instance, bitmap: BitmapRef) -> bool {
    use std::sync::atomic::{AtomicU32, Ordering};

    // SAFETY: the word is in bounds and 4-aligned per the `Instance` contract.
    let word = unsafe { AtomicU32::from_ptr(instance.slot::<u32>(bitmap.offset)) };
    word.load(Ordering::Relaxed) & bitmap.mask == 0
}

/// Whether a float slot value means "undefined" under the given policy.
///
/// The bitmap is read only when the slot holds the sentinel and the
/// attribute is not always-defined.
#[inline]
pub(crate) fn float_is_undefined(
    instance: Instance,
    value: f64,
    always_defined: bool,
    bitmap: BitmapRef,
) -> bool {
    #[allow(
        clippy::float_cmp,
        reason = "the sentinel is compared exactly, as stored"
    )]
    let is_sentinel = value == FLOAT_ERROR;
    is_sentinel && !always_defined && is_undefined(instance, bitmap)
}

/// Integer counterpart of [`float_is_undefined`].
#[inline]
pub(crate) fn int_is_undefined<T: NativeInt>(
    instance: Instance,
    value: T,
    always_defined: bool,
    bitmap: BitmapRef,
) -> bool {
    value == T::ERROR && !always_defined && is_undefined(instance, bitmap)
}
