//! Getter family.
//!
//! Every getter reads the primary slot, decides definedness, and on success
//! returns a new strong reference to a host value. The sentinel comparison
//! is always the first branch; bitmap representations probe the bitmap word
//! only after the sentinel matched.

use crate::definedness::{
    float_is_undefined, int_is_undefined, NativeInt, BOOL_UNDEFINED,
};
use crate::descriptor::AttrDescriptor;
use crate::error::{undefined_error, AttrError};
use crate::host::{Host, HostObj};
use crate::instance::Instance;
use crate::tagged::Tagged;

/// Boxed reference slot: null means undefined.
pub fn get_boxed<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Result<HostObj, AttrError> {
    let raw: *mut u8 = instance.read(desc.offset);
    let Some(value) = HostObj::from_raw(raw) else {
        return Err(undefined_error(host, instance, desc));
    };
    host.incref(value);
    Ok(value)
}

/// Tagged integer slot: [`INT_TAG`](crate::INT_TAG) means undefined.
pub fn get_tagged<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Result<HostObj, AttrError> {
    let value = Tagged::from_bits(instance.read(desc.offset));
    if value.is_undefined() {
        return Err(undefined_error(host, instance, desc));
    }
    Ok(value.to_host(host)?)
}

/// Boolean byte: [`BOOL_UNDEFINED`] means undefined; otherwise the canonical
/// `true`/`false` singleton.
pub fn get_bool<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Result<HostObj, AttrError> {
    let value: u8 = instance.read(desc.offset);
    if value == BOOL_UNDEFINED {
        return Err(undefined_error(host, instance, desc));
    }
    let obj = host.bool_obj(value != 0);
    host.incref(obj);
    Ok(obj)
}

/// `f64` slot with bitmap disambiguation.
pub fn get_float<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Result<HostObj, AttrError> {
    let value: f64 = instance.read(desc.offset);
    if float_is_undefined(instance, value, desc.is_always_defined(), desc.bitmap) {
        return Err(undefined_error(host, instance, desc));
    }
    Ok(host.box_f64(value)?)
}

fn get_int<T: NativeInt, H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Result<HostObj, AttrError> {
    let value: T = instance.read(desc.offset);
    if int_is_undefined(instance, value, desc.is_always_defined(), desc.bitmap) {
        return Err(undefined_error(host, instance, desc));
    }
    Ok(host.box_i64(value.widen())?)
}

/// `i16` slot with bitmap disambiguation.
pub fn get_int16<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Result<HostObj, AttrError> {
    get_int::<i16, H>(host, instance, desc)
}

/// `i32` slot with bitmap disambiguation.
pub fn get_int32<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Result<HostObj, AttrError> {
    get_int::<i32, H>(host, instance, desc)
}

/// `i64` slot with bitmap disambiguation.
pub fn get_int64<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Result<HostObj, AttrError> {
    get_int::<i64, H>(host, instance, desc)
}

#[cfg(test)]
mod tests;
