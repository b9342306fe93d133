//! Accessor failures and the standard attribute diagnostics.
//!
//! The Rust API returns [`AttrError`]. The ABI-shaped entry points turn it
//! into a raised host exception with [`AttrError::raise`]. Messages for
//! undefined and undeletable attributes are fixed strings that user code
//! and tests match on.

use tracing::trace;

use crate::descriptor::AttrDescriptor;
use crate::host::{ExcKind, Host, HostError, HostObj};
use crate::instance::Instance;

/// Why an accessor call failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttrError {
    /// Getter on an undefined attribute.
    #[error("attribute '{attr}' of '{type_name}' undefined")]
    Undefined {
        attr: &'static str,
        type_name: String,
    },

    /// Delete on an attribute that is not deletable.
    #[error("'{type_name}' object attribute '{attr}' cannot be deleted")]
    Undeletable {
        attr: &'static str,
        type_name: String,
    },

    /// Setter received a value of the wrong type.
    ///
    /// Raised through the host's type-error primitive, which gets `value`.
    /// `value` is borrowed from the setter's caller, not owned by the error:
    /// raise it while that reference is still held, as the entry points in
    /// [`abi`](crate::abi) do.
    #[error("{expected} object expected; got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: String,
        value: HostObj,
    },

    /// Integer did not fit the slot width.
    #[error("int too large or small to convert to {target}")]
    Overflow { target: &'static str },

    /// Name lookup in a class attribute table failed.
    #[error("'{type_name}' object has no attribute '{attr}'")]
    NoAttribute { attr: String, type_name: String },

    /// The host already raised.
    #[error(transparent)]
    Host(#[from] HostError),
}

impl AttrError {
    /// Exception class this error is raised as; `None` when the host has
    /// already raised.
    pub fn exc_kind(&self) -> Option<ExcKind> {
        match self {
            AttrError::Undefined { .. }
            | AttrError::Undeletable { .. }
            | AttrError::NoAttribute { .. } => Some(ExcKind::AttributeError),
            AttrError::TypeMismatch { .. } => Some(ExcKind::TypeError),
            AttrError::Overflow { .. } => Some(ExcKind::OverflowError),
            AttrError::Host(_) => None,
        }
    }

    /// Raise this error through the host's diagnostic channel.
    ///
    /// For [`AttrError::TypeMismatch`] the host inspects `value`, so the
    /// caller must still hold its reference to it.
    pub fn raise<H: Host + ?Sized>(&self, host: &H) {
        match self {
            AttrError::Host(_) => {}
            AttrError::TypeMismatch {
                expected, value, ..
            } => host.raise_type_error(expected, *value),
            other => {
                if let Some(kind) = other.exc_kind() {
                    host.raise(kind, &other.to_string());
                }
            }
        }
    }
}

/// Build the undefined-access error for `desc`.
///
/// Calling this for an always-defined attribute is a compiler bug.
pub fn undefined_error<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> AttrError {
    debug_assert!(
        !desc.is_always_defined(),
        "attribute '{}' should be initialized",
        desc.attr_name
    );
    trace!(attr = desc.attr_name, repr = desc.repr.name(), "undefined attribute read");
    AttrError::Undefined {
        attr: desc.attr_name,
        type_name: host.instance_type_name(instance),
    }
}

/// Build the undeletable-attribute error for `desc`.
pub fn undeletable_error<H: Host + ?Sized>(
    host: &H,
    instance: Instance,
    desc: &AttrDescriptor,
) -> AttrError {
    trace!(attr = desc.attr_name, "delete of undeletable attribute");
    AttrError::Undeletable {
        attr: desc.attr_name,
        type_name: host.instance_type_name(instance),
    }
}

/// Build a type-mismatch error for `value`, which was expected to be an
/// `expected`.
pub(crate) fn type_mismatch<H: Host + ?Sized>(
    host: &H,
    expected: &'static str,
    value: HostObj,
) -> AttrError {
    let got = if value == host.none() {
        "None".to_owned()
    } else {
        host.value_type_name(value)
    };
    trace!(expected, got = %got, "setter type mismatch");
    AttrError::TypeMismatch {
        expected,
        got,
        value,
    }
}
