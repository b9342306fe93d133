//! ABI-shaped entry points.
//!
//! Generated code does not handle [`AttrError`] values. It calls an accessor
//! through one of these wrappers, which raise the failure through the
//! [`Host`] and return the host's error sentinel: `None` for getters, `-1`
//! for setters.
//!
//! A native class's dispatch table stores one [`AttrAccessors`] per
//! attribute, obtained from [`AttrRepr::accessors`].

use std::ffi::c_int;

use crate::descriptor::{AttrDescriptor, AttrRepr};
use crate::error::AttrError;
use crate::getter::{get_bool, get_boxed, get_float, get_int16, get_int32, get_int64, get_tagged};
use crate::host::{Host, HostObj};
use crate::instance::Instance;
use crate::setter::{set_bool, set_boxed, set_float, set_int16, set_int32, set_int64, set_tagged};

/// A getter from the accessor family.
pub type GetterFn<H> = fn(&H, Instance, &AttrDescriptor) -> Result<HostObj, AttrError>;

/// A setter from the accessor family. `None` as the value means delete.
pub type SetterFn<H> =
    fn(&H, Instance, Option<HostObj>, &AttrDescriptor) -> Result<(), AttrError>;

/// Call `getter`, raising any failure through `host`.
///
/// Returns a new reference, or `None` after an exception was raised.
pub fn getter_entry<H: Host>(
    getter: GetterFn<H>,
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Option<HostObj> {
    match getter(host, instance, desc) {
        Ok(value) => Some(value),
        Err(err) => {
            err.raise(host);
            None
        }
    }
}

/// Call `setter`, raising any failure through `host`.
///
/// Returns 0 on success and -1 after an exception was raised.
pub fn setter_entry<H: Host>(
    setter: SetterFn<H>,
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> c_int {
    match setter(host, instance, value, desc) {
        Ok(()) => 0,
        Err(err) => {
            err.raise(host);
            -1
        }
    }
}

/// The getter/setter pair bound to one attribute.
pub struct AttrAccessors<H> {
    pub getter: GetterFn<H>,
    pub setter: SetterFn<H>,
}

impl<H> Clone for AttrAccessors<H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for AttrAccessors<H> {}

impl<H: Host> AttrAccessors<H> {
    /// [`getter_entry`] with this pair's getter.
    #[inline]
    pub fn get(&self, host: &H, instance: Instance, desc: &AttrDescriptor) -> Option<HostObj> {
        getter_entry(self.getter, host, instance, desc)
    }

    /// [`setter_entry`] with this pair's setter.
    #[inline]
    pub fn set(
        &self,
        host: &H,
        instance: Instance,
        value: Option<HostObj>,
        desc: &AttrDescriptor,
    ) -> c_int {
        setter_entry(self.setter, host, instance, value, desc)
    }
}

impl AttrRepr {
    /// The accessor pair for slots of this representation.
    pub fn accessors<H: Host>(self) -> AttrAccessors<H> {
        let (getter, setter): (GetterFn<H>, SetterFn<H>) = match self {
            AttrRepr::Boxed => (get_boxed::<H>, set_boxed::<H>),
            AttrRepr::Tagged => (get_tagged::<H>, set_tagged::<H>),
            AttrRepr::Bool => (get_bool::<H>, set_bool::<H>),
            AttrRepr::Float => (get_float::<H>, set_float::<H>),
            AttrRepr::Int16 => (get_int16::<H>, set_int16::<H>),
            AttrRepr::Int32 => (get_int32::<H>, set_int32::<H>),
            AttrRepr::Int64 => (get_int64::<H>, set_int64::<H>),
        };
        AttrAccessors { getter, setter }
    }
}
