//! Host values.
//!
//! A [`Value`] is stored in the data area of an RC allocation (see
//! [`rc`](crate::rc)); the data pointer is the [`HostObj`]. Container values
//! own one reference to each element, released when the container is freed.

use std::mem::{align_of, size_of};

use natt_rt::{BoxedType, HostObj};
use smallvec::SmallVec;

use crate::rc::{rc_alloc, rc_count, rc_dec, rc_free, rc_inc};

/// Payload of a host object.
#[derive(Debug)]
pub enum Value {
    None,
    Bool(bool),
    /// Wide enough for the big-integer paths of the tagged encoding.
    Int(i128),
    Float(f64),
    Str(String),
    Tuple(SmallVec<[HostObj; 4]>),
    List(Vec<HostObj>),
    Dict(Vec<(HostObj, HostObj)>),
    Set(Vec<HostObj>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
        }
    }

    /// Whether this value is an instance of `ty`. `bool` is a subtype of
    /// `int`.
    pub fn is_instance(&self, ty: BoxedType) -> bool {
        matches!(
            (ty, self),
            (BoxedType::Any, _)
                | (BoxedType::Int, Value::Int(_) | Value::Bool(_))
                | (BoxedType::Bool, Value::Bool(_))
                | (BoxedType::Float, Value::Float(_))
                | (BoxedType::Str, Value::Str(_))
                | (BoxedType::Tuple, Value::Tuple(_))
                | (BoxedType::List, Value::List(_))
                | (BoxedType::Dict, Value::Dict(_))
                | (BoxedType::Set, Value::Set(_))
        )
    }

    fn for_each_child(&self, mut f: impl FnMut(HostObj)) {
        match self {
            Value::Tuple(items) => items.iter().copied().for_each(f),
            Value::List(items) | Value::Set(items) => items.iter().copied().for_each(f),
            Value::Dict(entries) => {
                for &(key, value) in entries {
                    f(key);
                    f(value);
                }
            }
            Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => {}
        }
    }
}

/// Move `value` into a new RC allocation. Returns the only reference.
///
/// Children of a container must already be owned by `value`.
pub(crate) fn alloc(value: Value) -> HostObj {
    let data = rc_alloc(size_of::<Value>(), align_of::<Value>());
    let Some(obj) = HostObj::from_raw(data) else {
        let layout = std::alloc::Layout::new::<Value>();
        std::alloc::handle_alloc_error(layout);
    };
    // SAFETY: data is valid for a Value and aligned for it
    unsafe { data.cast::<Value>().write(value) };
    obj
}

/// Borrow the payload of `obj`.
///
/// The returned reference must not outlive the caller's reference to `obj`.
pub(crate) fn payload<'a>(obj: HostObj) -> &'a Value {
    // SAFETY: every HostObj of this runtime was produced by `alloc` and is
    // kept alive by the caller's reference
    unsafe { &*obj.as_ptr().cast::<Value>() }
}

pub(crate) fn incref(obj: HostObj) {
    rc_inc(obj.as_ptr());
}

/// Release one reference; frees `obj` and releases its children at zero.
pub(crate) fn decref(obj: HostObj) {
    rc_dec(obj.as_ptr(), Some(drop_value));
}

pub(crate) fn refcount(obj: HostObj) -> i64 {
    rc_count(obj.as_ptr())
}

fn drop_value(data: *mut u8) {
    // SAFETY: called once, when the count reached zero; data holds a Value
    let value = unsafe { data.cast::<Value>().read() };
    rc_free(data, size_of::<Value>(), align_of::<Value>());
    value.for_each_child(decref);
}
