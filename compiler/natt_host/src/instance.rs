//! Owned native-class instances.

use std::alloc::{alloc_zeroed, dealloc};
use std::rc::Rc;

use natt_rt::{
    AttrError, AttrRepr, Host, HostObj, Instance, NativeInt, Tagged, BOOL_UNDEFINED, FLOAT_ERROR,
    INT_TAG,
};

use crate::layout::NativeClass;
use crate::runtime::Runtime;

/// An instance record allocated for a [`NativeClass`].
///
/// Construction leaves every attribute undefined. Dropping the instance
/// releases the references held by boxed and tagged slots.
pub struct NativeInstance<'rt> {
    runtime: &'rt Runtime,
    class: Rc<NativeClass>,
    instance: Instance,
}

impl<'rt> NativeInstance<'rt> {
    pub fn new(runtime: &'rt Runtime, class: &Rc<NativeClass>) -> Self {
        let layout = class.layout();
        // SAFETY: the layout is at least HEADER_SIZE bytes
        let base = unsafe { alloc_zeroed(layout) };
        // SAFETY: `base` is a fresh record laid out by `class`, whose
        // descriptors were validated against this size. It lives until drop.
        let Some(instance) = (unsafe { Instance::from_raw(base) }) else {
            std::alloc::handle_alloc_error(layout);
        };

        // SAFETY: the header is the first 8 bytes of the record
        unsafe { base.cast::<*const NativeClass>().write(Rc::as_ptr(class)) };

        // Zeroed memory already encodes undefined for boxed slots and leaves
        // every bitmap bit clear.
        for desc in class.attrs().descriptors() {
            // SAFETY: offset is in bounds and aligned for the representation
            unsafe {
                let slot = base.add(desc.offset);
                match desc.repr {
                    AttrRepr::Boxed => {}
                    AttrRepr::Tagged => slot.cast::<usize>().write(INT_TAG.bits()),
                    AttrRepr::Bool => slot.write(BOOL_UNDEFINED),
                    AttrRepr::Float => slot.cast::<f64>().write(FLOAT_ERROR),
                    AttrRepr::Int16 => slot.cast::<i16>().write(i16::ERROR),
                    AttrRepr::Int32 => slot.cast::<i32>().write(i32::ERROR),
                    AttrRepr::Int64 => slot.cast::<i64>().write(i64::ERROR),
                }
            }
        }

        tracing::trace!(class = class.name(), "instance allocated");
        NativeInstance {
            runtime,
            class: Rc::clone(class),
            instance,
        }
    }

    /// Handle for the accessor family.
    pub fn instance(&self) -> Instance {
        self.instance
    }

    pub fn class(&self) -> &NativeClass {
        &self.class
    }

    /// Read attribute `name`. Returns a new reference.
    pub fn get(&self, name: &str) -> Result<HostObj, AttrError> {
        self.class.attrs().get(self.runtime, self.instance, name)
    }

    /// Assign attribute `name`; `value` is borrowed.
    pub fn set(&self, name: &str, value: HostObj) -> Result<(), AttrError> {
        self.class
            .attrs()
            .set(self.runtime, self.instance, name, value)
    }

    pub fn delete(&self, name: &str) -> Result<(), AttrError> {
        self.class.attrs().delete(self.runtime, self.instance, name)
    }

    /// Raw bitmap word at `offset`, for inspection.
    pub fn bitmap_word(&self, offset: usize) -> u32 {
        debug_assert!(self.class.bitmap_words().contains(&offset));
        // SAFETY: bitmap words are 4-aligned and inside the record
        unsafe { self.instance.as_ptr().add(offset).cast::<u32>().read() }
    }
}

impl Drop for NativeInstance<'_> {
    fn drop(&mut self) {
        let base = self.instance.as_ptr();
        for desc in self.class.attrs().descriptors() {
            // SAFETY: offset is in bounds and aligned for the representation
            let slot = unsafe { base.add(desc.offset) };
            match desc.repr {
                AttrRepr::Boxed => {
                    // SAFETY: as above
                    let raw = unsafe { slot.cast::<*mut u8>().read() };
                    if let Some(obj) = HostObj::from_raw(raw) {
                        self.runtime.decref(obj);
                    }
                }
                AttrRepr::Tagged => {
                    // SAFETY: as above
                    let bits = unsafe { slot.cast::<usize>().read() };
                    Tagged::from_bits(bits).release(self.runtime);
                }
                AttrRepr::Bool
                | AttrRepr::Float
                | AttrRepr::Int16
                | AttrRepr::Int32
                | AttrRepr::Int64 => {}
            }
        }
        // SAFETY: allocated in `new` with this layout
        unsafe { dealloc(base, self.class.layout()) };
    }
}
