//! Generic dispatch and per-class attribute tables.
//!
//! [`get_attr`]/[`set_attr`] are the single-entry alternative to binding
//! one accessor per attribute: they switch on the descriptor's
//! representation. [`ClassAttrs`] maps attribute names of one native class
//! to their descriptors, so a host can route `getattr`/`setattr`/`delattr`
//! by name.

use rustc_hash::FxHashMap;

use crate::descriptor::{AttrDescriptor, AttrRepr, DescriptorError};
use crate::error::AttrError;
use crate::getter::{get_bool, get_boxed, get_float, get_int16, get_int32, get_int64, get_tagged};
use crate::host::{Host, HostObj};
use crate::instance::Instance;
use crate::setter::{set_bool, set_boxed, set_float, set_int16, set_int32, set_int64, set_tagged};

/// Read the attribute described by `desc`, whatever its representation.
pub fn get_attr<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> Result<HostObj, AttrError> {
    match desc.repr {
        AttrRepr::Boxed => get_boxed(host, instance, desc),
        AttrRepr::Tagged => get_tagged(host, instance, desc),
        AttrRepr::Bool => get_bool(host, instance, desc),
        AttrRepr::Float => get_float(host, instance, desc),
        AttrRepr::Int16 => get_int16(host, instance, desc),
        AttrRepr::Int32 => get_int32(host, instance, desc),
        AttrRepr::Int64 => get_int64(host, instance, desc),
    }
}

/// Assign (`Some`) or delete (`None`) the attribute described by `desc`.
pub fn set_attr<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    value: Option<HostObj>,
    desc: &AttrDescriptor,
) -> Result<(), AttrError> {
    match desc.repr {
        AttrRepr::Boxed => set_boxed(host, instance, value, desc),
        AttrRepr::Tagged => set_tagged(host, instance, value, desc),
        AttrRepr::Bool => set_bool(host, instance, value, desc),
        AttrRepr::Float => set_float(host, instance, value, desc),
        AttrRepr::Int16 => set_int16(host, instance, value, desc),
        AttrRepr::Int32 => set_int32(host, instance, value, desc),
        AttrRepr::Int64 => set_int64(host, instance, value, desc),
    }
}

/// Validated attribute table of one native class.
///
/// Flat: attributes inherited from a base class must be listed again.
#[derive(Clone, Debug)]
pub struct ClassAttrs {
    type_name: String,
    instance_size: usize,
    /// Declaration order.
    attrs: Vec<AttrDescriptor>,
    by_name: FxHashMap<&'static str, usize>,
}

impl ClassAttrs {
    /// Build the table, validating every descriptor against
    /// `instance_size`.
    ///
    /// Also rejects repeated names and two bitmap attributes on the same bit.
    #[tracing::instrument(level = "debug", skip_all, fields(class = type_name, count = descriptors.len()))]
    pub fn new(
        type_name: &str,
        instance_size: usize,
        descriptors: &[AttrDescriptor],
    ) -> Result<Self, DescriptorError> {
        let mut by_name =
            FxHashMap::with_capacity_and_hasher(descriptors.len(), Default::default());
        let mut bits: FxHashMap<(usize, u32), &'static str> = FxHashMap::default();

        for (index, desc) in descriptors.iter().enumerate() {
            desc.validate(instance_size)?;
            if by_name.insert(desc.attr_name, index).is_some() {
                return Err(DescriptorError::DuplicateAttribute {
                    attr: desc.attr_name,
                });
            }
            if desc.repr.uses_bitmap() {
                let key = (desc.bitmap.offset, desc.bitmap.mask);
                if let Some(other) = bits.insert(key, desc.attr_name) {
                    return Err(DescriptorError::SharedBitmapBit {
                        attr: desc.attr_name,
                        other,
                    });
                }
            }
        }

        tracing::debug!(bitmap_bits = bits.len(), "class attribute table registered");
        Ok(ClassAttrs {
            type_name: type_name.to_owned(),
            instance_size,
            attrs: descriptors.to_vec(),
            by_name,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn instance_size(&self) -> usize {
        self.instance_size
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Descriptors in declaration order.
    pub fn descriptors(&self) -> &[AttrDescriptor] {
        &self.attrs
    }

    pub fn descriptor(&self, name: &str) -> Option<&AttrDescriptor> {
        self.by_name.get(name).map(|&index| &self.attrs[index])
    }

    fn lookup(&self, name: &str) -> Result<&AttrDescriptor, AttrError> {
        self.descriptor(name).ok_or_else(|| {
            tracing::trace!(class = %self.type_name, attr = name, "no such attribute");
            AttrError::NoAttribute {
                attr: name.to_owned(),
                type_name: self.type_name.clone(),
            }
        })
    }

    /// Read attribute `name`. Returns a new reference.
    pub fn get<H: Host + ?Sized>(
        &self,
        host: &H,
        instance: Instance,
        name: &str,
    ) -> Result<HostObj, AttrError> {
        get_attr(host, instance, self.lookup(name)?)
    }

    /// Assign attribute `name`. `value` is borrowed.
    pub fn set<H: Host + ?Sized>(
        &self,
        host: &H,
        instance: Instance,
        name: &str,
        value: HostObj,
    ) -> Result<(), AttrError> {
        set_attr(host, instance, Some(value), self.lookup(name)?)
    }

    /// Delete attribute `name`.
    pub fn delete<H: Host + ?Sized>(
        &self,
        host: &H,
        instance: Instance,
        name: &str,
    ) -> Result<(), AttrError> {
        set_attr(host, instance, None, self.lookup(name)?)
    }
}
