//! Setter family.
//!
//! Every setter follows the same three phases:
//!
//! 1. **Delete or assign.** `None` means delete: allowed only for deletable
//!    attributes, and resets the slot (and bitmap bit) to undefined.
//! 2. **Type check / coerce.** Convert the host value to the slot
//!    representation. Any failure returns before the store.
//! 3. **Store.** Write the slot, set the bitmap bit when the stored value
//!    collides with the sentinel, and pair every acquired reference with the
//!    release of the one it replaces.
//!
//! A failed setter leaves slot and bitmap untouched.

use crate::definedness::{set_defined, NativeInt, BOOL_UNDEFINED, FLOAT_ERROR};
use crate::descriptor::{AttrDescriptor, BoxedType};
use crate::error::{type_mismatch, undeletable_error, AttrError};
use crate::host::{Host, HostObj};
use crate::instance::Instance;
use crate::tagged::{Tagged, INT_TAG};

/// Phase 1: `Ok(Some(value))` to assign, `Ok(None)` to delete.
#[inline]
fn assign_or_delete<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<Option<HostObj>, AttrError> {
    if value.is_none() && !desc.is_deletable() {
        return Err(undeletable_error(host, instance, desc));
    }
    Ok(value)
}

/// Boxed reference slot.
///
/// The value must pass `desc.setter_type`; with `optional` the host's
/// null-like singleton is accepted regardless of the declared type.
pub fn set_boxed<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<(), AttrError> {
    let new = assign_or_delete(host, instance, value, desc)?;

    if let Some(value) = new {
        let ty = desc.setter_type;
        if ty.is_checked()
            && !host.is_instance(value, ty.ty)
            && !(ty.optional && value == host.none())
        {
            return Err(type_mismatch(host, ty.name, value));
        }
        host.incref(value);
    }

    let new_raw = new.map_or(std::ptr::null_mut(), HostObj::as_ptr);
    let old: *mut u8 = instance.read(desc.offset);
    instance.write(desc.offset, new_raw);
    if let Some(old) = HostObj::from_raw(old) {
        host.decref(old);
    }
    Ok(())
}

/// Tagged integer slot. Accepts any host integer; small values are stored
/// inline, large ones keep a reference to the boxed integer.
pub fn set_tagged<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<(), AttrError> {
    let new = match assign_or_delete(host, instance, value, desc)? {
        Some(value) => {
            if !host.is_instance(value, BoxedType::Int) {
                return Err(type_mismatch(host, BoxedType::Int.name(), value));
            }
            Tagged::from_host(host, value)
        }
        None => INT_TAG,
    };

    let old = Tagged::from_bits(instance.read(desc.offset));
    instance.write(desc.offset, new.bits());
    old.release(host);
    Ok(())
}

/// Boolean byte. Accepts only the canonical booleans.
pub fn set_bool<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<(), AttrError> {
    let byte = match assign_or_delete(host, instance, value, desc)? {
        Some(value) => {
            if !host.is_instance(value, BoxedType::Bool) {
                return Err(type_mismatch(host, BoxedType::Bool.name(), value));
            }
            u8::from(value == host.bool_obj(true))
        }
        None => BOOL_UNDEFINED,
    };
    instance.write(desc.offset, byte);
    Ok(())
}

/// `f64` slot with bitmap disambiguation.
pub fn set_float<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<(), AttrError> {
    let Some(value) = assign_or_delete(host, instance, value, desc)? else {
        instance.write(desc.offset, FLOAT_ERROR);
        set_defined(instance, desc.bitmap, false);
        return Ok(());
    };

    if !host.is_instance(value, BoxedType::Float) {
        return Err(type_mismatch(host, BoxedType::Float.name(), value));
    }
    let raw = host.float_as_f64(value)?;

    instance.write(desc.offset, raw);
    #[allow(
        clippy::float_cmp,
        reason = "the sentinel is compared exactly, as stored"
    )]
    let is_sentinel = raw == FLOAT_ERROR;
    if is_sentinel {
        set_defined(instance, desc.bitmap, true);
    }
    Ok(())
}

fn set_int<T: NativeInt, H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<(), AttrError> {
    let Some(value) = assign_or_delete(host, instance, value, desc)? else {
        instance.write(desc.offset, T::ERROR);
        set_defined(instance, desc.bitmap, false);
        return Ok(());
    };

    if !host.is_instance(value, BoxedType::Int) {
        return Err(type_mismatch(host, BoxedType::Int.name(), value));
    }
    let narrowed = host
        .int_as_i64(value)
        .and_then(T::narrow)
        .ok_or(AttrError::Overflow { target: T::NAME })?;

    instance.write(desc.offset, narrowed);
    if narrowed == T::ERROR {
        set_defined(instance, desc.bitmap, true);
    }
    Ok(())
}

/// `i16` slot with bitmap disambiguation.
pub fn set_int16<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<(), AttrError> {
    set_int::<i16, H>(host, instance, value, desc)
}

/// `i32` slot with bitmap disambiguation.
pub fn set_int32<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<(), AttrError> {
    set_int::<i32, H>(host, instance, value, desc)
}

/// `i64` slot with bitmap disambiguation.
pub fn set_int64<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<(), AttrError> {
    set_int::<i64, H>(host, instance, value, desc)
}
