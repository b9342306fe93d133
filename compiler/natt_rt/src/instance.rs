//! Raw handle to a native-class instance record.
//!
//! An instance is a flat record of bytes. Each attribute occupies a fixed
//! offset from the base; the accessors read and write the slot at the width
//! of the attribute's representation and never look at anything else.

use std::ptr::NonNull;

/// Base address of an instance record.
///
/// `Instance` is `Copy` and carries no ownership: allocation, layout and
/// destruction belong to the host runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Instance(NonNull<u8>);

impl Instance {
    /// Wrap the base address of an instance record.
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// - `base` must point to a live instance record that stays valid for as
    ///   long as the handle (or any copy of it) is used.
    /// - Every descriptor passed to an accessor together with this handle must
    ///   describe this record: slot and bitmap offsets in bounds and aligned
    ///   for their representation (see [`AttrDescriptor::validate`]).
    /// - No other code may access the same slot (or, for bitmap
    ///   representations, the same bitmap word) while an accessor runs.
    ///
    /// [`AttrDescriptor::validate`]: crate::AttrDescriptor::validate
    pub unsafe fn from_raw(base: *mut u8) -> Option<Self> {
        NonNull::new(base).map(Self)
    }

    /// The base address.
    #[inline]
    pub fn as_ptr(self) -> *mut u8 {
        self.0.as_ptr()
    }

    /// Pointer to the slot at `offset`, typed as `T`.
    #[inline]
    pub(crate) fn slot<T>(self, offset: usize) -> *mut T {
        // SAFETY: `from_raw` guarantees offsets used with this instance lie
        // within the record.
        unsafe { self.0.as_ptr().add(offset).cast::<T>() }
    }

    #[inline]
    pub(crate) fn read<T: Copy>(self, offset: usize) -> T {
        // SAFETY: in bounds and aligned per the `from_raw` contract.
        unsafe { self.slot::<T>(offset).read() }
    }

    #[inline]
    pub(crate) fn write<T: Copy>(self, offset: usize, value: T) {
        // SAFETY: in bounds and aligned per the `from_raw` contract.
        unsafe { self.slot::<T>(offset).write(value) }
    }
}
