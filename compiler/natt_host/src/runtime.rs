//! The reference host.
//!
//! [`Runtime`] implements [`Host`] on top of the RC value store and the
//! per-thread pending exception. It owns one reference to each of the
//! `None`/`True`/`False` singletons for its lifetime.

use std::cell::Cell;

use natt_rt::{BoxedType, ExcKind, Host, HostError, HostObj, Instance};
use smallvec::SmallVec;

use crate::exc;
use crate::layout::NativeClass;
use crate::value::{self, Value};

/// Reference host runtime.
///
/// Every [`Instance`] handed to this runtime must come from a
/// [`NativeInstance`](crate::NativeInstance), whose record starts with the
/// class pointer.
pub struct Runtime {
    none: HostObj,
    true_obj: HostObj,
    false_obj: HostObj,
    fail_unbox: Cell<bool>,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            none: value::alloc(Value::None),
            true_obj: value::alloc(Value::Bool(true)),
            false_obj: value::alloc(Value::Bool(false)),
            fail_unbox: Cell::new(false),
        }
    }

    // Constructors return a new reference.

    pub fn int(&self, v: i128) -> HostObj {
        value::alloc(Value::Int(v))
    }

    pub fn float(&self, v: f64) -> HostObj {
        value::alloc(Value::Float(v))
    }

    pub fn string(&self, s: &str) -> HostObj {
        value::alloc(Value::Str(s.to_owned()))
    }

    /// Items are borrowed; the tuple takes its own references.
    pub fn tuple(&self, items: &[HostObj]) -> HostObj {
        items.iter().copied().for_each(value::incref);
        value::alloc(Value::Tuple(SmallVec::from_slice(items)))
    }

    pub fn list(&self, items: &[HostObj]) -> HostObj {
        items.iter().copied().for_each(value::incref);
        value::alloc(Value::List(items.to_vec()))
    }

    pub fn dict(&self, entries: &[(HostObj, HostObj)]) -> HostObj {
        for &(k, v) in entries {
            value::incref(k);
            value::incref(v);
        }
        value::alloc(Value::Dict(entries.to_vec()))
    }

    pub fn set_of(&self, items: &[HostObj]) -> HostObj {
        items.iter().copied().for_each(value::incref);
        value::alloc(Value::Set(items.to_vec()))
    }

    /// Payload of `obj`, borrowed for as long as the runtime.
    ///
    /// The caller must hold a reference to `obj` while using the result.
    pub fn value(&self, obj: HostObj) -> &Value {
        value::payload(obj)
    }

    pub fn refcount(&self, obj: HostObj) -> i64 {
        value::refcount(obj)
    }

    /// Release a reference obtained from this runtime or from a getter.
    pub fn release(&self, obj: HostObj) {
        value::decref(obj);
    }

    /// Make the next float unboxing raise `TypeError` and fail.
    pub fn fail_next_unbox(&self) {
        self.fail_unbox.set(true);
    }

    fn class_of(instance: Instance) -> *const NativeClass {
        // SAFETY: runtime instances begin with the class pointer, and the
        // instance keeps its class alive
        unsafe { instance.as_ptr().cast::<*const NativeClass>().read() }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        value::decref(self.none);
        value::decref(self.true_obj);
        value::decref(self.false_obj);
    }
}

impl Host for Runtime {
    fn instance_type_name(&self, instance: Instance) -> String {
        let class = Self::class_of(instance);
        // SAFETY: see `class_of`
        match unsafe { class.as_ref() } {
            Some(class) => class.name().to_owned(),
            None => "object".to_owned(),
        }
    }

    fn value_type_name(&self, value: HostObj) -> String {
        self.value(value).type_name().to_owned()
    }

    fn incref(&self, obj: HostObj) {
        value::incref(obj);
    }

    fn decref(&self, obj: HostObj) {
        value::decref(obj);
    }

    fn none(&self) -> HostObj {
        self.none
    }

    fn bool_obj(&self, value: bool) -> HostObj {
        if value {
            self.true_obj
        } else {
            self.false_obj
        }
    }

    fn is_instance(&self, value: HostObj, ty: BoxedType) -> bool {
        self.value(value).is_instance(ty)
    }

    fn int_as_i64(&self, value: HostObj) -> Option<i64> {
        match self.value(value) {
            Value::Int(v) => i64::try_from(*v).ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    fn box_i64(&self, value: i64) -> Result<HostObj, HostError> {
        Ok(self.int(i128::from(value)))
    }

    fn float_as_f64(&self, value: HostObj) -> Result<f64, HostError> {
        if self.fail_unbox.replace(false) {
            exc::raise(ExcKind::TypeError, "float unboxing failed");
            return Err(HostError);
        }
        match self.value(value) {
            Value::Float(v) => Ok(*v),
            other => {
                let message = format!("must be real number, not {}", other.type_name());
                exc::raise(ExcKind::TypeError, &message);
                Err(HostError)
            }
        }
    }

    fn box_f64(&self, value: f64) -> Result<HostObj, HostError> {
        Ok(self.float(value))
    }

    fn raise(&self, kind: ExcKind, message: &str) {
        exc::raise(kind, message);
    }

    fn raise_type_error(&self, expected: &str, value: HostObj) {
        let got = if value == self.none {
            "None"
        } else {
            self.value(value).type_name()
        };
        exc::raise(ExcKind::TypeError, &format!("{expected} object expected; got {got}"));
    }
}
