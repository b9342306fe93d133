//! The host-runtime seam.
//!
//! Everything the accessors need from the dynamic language runtime goes
//! through [`Host`]: reference counting, boxing and unboxing of machine
//! values, type checks, the canonical singletons and the diagnostic channel.
//! The accessor family itself holds no state.

use std::fmt;
use std::ptr::NonNull;

use crate::descriptor::BoxedType;
use crate::instance::Instance;

/// Pointer to a host value object.
///
/// Identity comparison only: two `HostObj`s are equal iff they point at the
/// same object. Objects must be at least 2-byte aligned so the tagged integer
/// encoding can use the low bit (see [`Tagged`](crate::Tagged)).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct HostObj(NonNull<u8>);

impl HostObj {
    /// Wrap a raw object pointer. Returns `None` for null.
    #[inline]
    pub fn from_raw(ptr: *mut u8) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    #[inline]
    pub fn as_ptr(self) -> *mut u8 {
        self.0.as_ptr()
    }

    #[inline]
    pub(crate) fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for HostObj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObj({:p})", self.0)
    }
}

/// Exception classes the accessors raise through [`Host::raise`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExcKind {
    AttributeError,
    TypeError,
    OverflowError,
}

impl ExcKind {
    pub const fn name(self) -> &'static str {
        match self {
            ExcKind::AttributeError => "AttributeError",
            ExcKind::TypeError => "TypeError",
            ExcKind::OverflowError => "OverflowError",
        }
    }
}

impl fmt::Display for ExcKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The host has already raised an exception; propagate without raising again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, thiserror::Error)]
#[error("error raised by host runtime")]
pub struct HostError;

/// Services the accessor family consumes from the host runtime.
///
/// Reference discipline: methods taking a `HostObj` borrow it. Methods that
/// return a `HostObj` document whether the caller receives a new reference.
pub trait Host {
    /// Dynamic type name of an instance, for diagnostics.
    fn instance_type_name(&self, instance: Instance) -> String;

    /// Type name of a host value, for diagnostics.
    fn value_type_name(&self, value: HostObj) -> String;

    /// Acquire a strong reference.
    fn incref(&self, obj: HostObj);

    /// Release a strong reference.
    fn decref(&self, obj: HostObj);

    /// The null-like singleton (borrowed).
    fn none(&self) -> HostObj;

    /// The canonical `true`/`false` singleton (borrowed).
    fn bool_obj(&self, value: bool) -> HostObj;

    /// Whether `value` is an instance of `ty`, subtypes included.
    ///
    /// Never called with [`BoxedType::Any`].
    fn is_instance(&self, value: HostObj, ty: BoxedType) -> bool;

    /// The value of a host integer if it fits in `i64`.
    ///
    /// Only called after `is_instance(value, BoxedType::Int)` succeeded.
    /// Does not raise.
    fn int_as_i64(&self, value: HostObj) -> Option<i64>;

    /// Box a machine integer. Returns a new reference.
    fn box_i64(&self, value: i64) -> Result<HostObj, HostError>;

    /// Unbox a host float. On failure the host has raised.
    fn float_as_f64(&self, value: HostObj) -> Result<f64, HostError>;

    /// Box a machine float. Returns a new reference.
    fn box_f64(&self, value: f64) -> Result<HostObj, HostError>;

    /// Raise an exception of `kind` with `message`.
    fn raise(&self, kind: ExcKind, message: &str);

    /// The host's type-error primitive: `value` was not a `expected`.
    fn raise_type_error(&self, expected: &str, value: HostObj);
}
