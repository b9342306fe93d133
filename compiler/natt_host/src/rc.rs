//! Reference-counted allocations.
//!
//! Every host value lives in an RC allocation. The data area starts at
//! `data_offset(align)` from the base so it keeps the alignment it asked for;
//! the strong count always occupies the 8 bytes right before the data:
//!
//! ```text
//!   [ padding ... | strong_count: i64 | data bytes ... ]
//!    ^                                  ^
//!    base                               data_ptr (the object pointer handed out)
//!    |<------ data_offset(align) ------>|
//! ```
//!
//! With `align <= 8` there is no padding. The data pointer is at least
//! 8-aligned, so its low bit is free for the tagged integer encoding. Counts
//! are plain (non-atomic) integers: the runtime is single-threaded.

use std::alloc::Layout;

/// Size of the strong count.
const COUNT_SIZE: usize = 8;

/// Distance from the allocation base to the data pointer.
fn data_offset(align: usize) -> usize {
    align.max(COUNT_SIZE)
}

fn layout_for(size: usize, align: usize) -> Option<Layout> {
    let total = size.checked_add(data_offset(align))?;
    Layout::from_size_align(total, data_offset(align)).ok()
}

/// The count slot of an allocation made by [`rc_alloc`].
fn count_of(data_ptr: *const u8) -> *mut i64 {
    data_ptr.wrapping_sub(COUNT_SIZE).cast::<i64>().cast_mut()
}

/// Allocate `size` data bytes aligned to `align`, with a strong count of 1.
///
/// Returns the data pointer, or null on allocation failure or an invalid
/// `align`.
pub fn rc_alloc(size: usize, align: usize) -> *mut u8 {
    let Some(layout) = layout_for(size, align) else {
        return std::ptr::null_mut();
    };

    // SAFETY: the layout is at least COUNT_SIZE bytes
    let base = unsafe { std::alloc::alloc(layout) };
    if base.is_null() {
        return std::ptr::null_mut();
    }

    // SAFETY: the data offset is a multiple of `align` and at least 8, so the
    // data pointer is aligned for the caller and the count slot before it is
    // in bounds and 8-aligned.
    unsafe {
        let data = base.add(data_offset(align));
        count_of(data).write(1);
        data
    }
}

/// Increment the strong count. Null is ignored.
pub fn rc_inc(data_ptr: *mut u8) {
    if data_ptr.is_null() {
        return;
    }
    // SAFETY: live allocation from rc_alloc; the count sits right before data
    unsafe { *count_of(data_ptr) += 1 };
}

/// Decrement the strong count and run `drop_fn` when it reaches zero.
///
/// `drop_fn` releases whatever the data area owns and finally calls
/// [`rc_free`]. Null is ignored.
pub fn rc_dec(data_ptr: *mut u8, drop_fn: Option<fn(*mut u8)>) {
    if data_ptr.is_null() {
        return;
    }

    let count = count_of(data_ptr);
    // SAFETY: live allocation from rc_alloc; the count sits right before data
    let remaining = unsafe {
        *count -= 1;
        *count
    };

    if remaining <= 0 {
        if let Some(f) = drop_fn {
            f(data_ptr);
        }
    }
}

/// Free an RC allocation unconditionally.
///
/// `size` and `align` must be the values passed to [`rc_alloc`].
pub fn rc_free(data_ptr: *mut u8, size: usize, align: usize) {
    if data_ptr.is_null() {
        return;
    }
    let Some(layout) = layout_for(size, align) else {
        return;
    };

    // SAFETY: same size and align as rc_alloc, so the base is data_offset
    // bytes before the data pointer and the layout matches
    unsafe { std::alloc::dealloc(data_ptr.sub(data_offset(align)), layout) }
}

/// Current strong count; 0 for null.
pub fn rc_count(data_ptr: *const u8) -> i64 {
    if data_ptr.is_null() {
        return 0;
    }
    // SAFETY: live allocation from rc_alloc; the count sits right before data
    unsafe { count_of(data_ptr).read() }
}
