//! Native Attribute Runtime (`libnatt_rt`)
//!
//! Generic attribute accessors for native classes whose instances have a
//! fixed, ahead-of-time-known memory layout. Instead of emitting one accessor
//! per field, a compiler emits an [`AttrDescriptor`] per attribute and binds
//! it to one getter/setter pair from the family in this crate.
//!
//! # Build Modes
//!
//! - **rlib**: For Rust embedders (host runtimes written in Rust)
//! - **staticlib**: For AOT linking alongside generated code
//!
//! # Accessor Family
//!
//! | Representation | Getter | Setter | Undefined encoding |
//! |---|---|---|---|
//! | boxed reference | [`get_boxed`] | [`set_boxed`] | null pointer |
//! | tagged integer | [`get_tagged`] | [`set_tagged`] | [`INT_TAG`] |
//! | boolean | [`get_bool`] | [`set_bool`] | byte [`BOOL_UNDEFINED`] |
//! | `f64` | [`get_float`] | [`set_float`] | [`FLOAT_ERROR`] + bitmap bit |
//! | `i16`/`i32`/`i64` | [`get_int16`] ... | [`set_int16`] ... | [`NativeInt::ERROR`] + bitmap bit |
//!
//! Float and fixed-width integer slots have no spare bit pattern, so a value
//! equal to the sentinel is disambiguated by one bit in a `u32` bitmap word
//! stored in the instance (see [`definedness`]).
//!
//! # Entry Shapes
//!
//! The Rust API returns [`AttrError`] values. The ABI-shaped wrappers in
//! [`abi`] raise those errors through the [`Host`] and return the host's
//! error sentinel instead (`None` for getters, `-1` for setters).
//!
//! # Safety
//!
//! Accessors dereference `base + offset` inside the instance record. The
//! obligations for that live on [`Instance::from_raw`]: once an embedder has
//! promised that the instance matches the descriptors used with it, the
//! accessors themselves are safe to call.

#![warn(clippy::allow_attributes_without_reason)]
#![allow(
    unsafe_code,
    reason = "accessors read and write raw instance memory at descriptor offsets"
)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_ptr_alignment,
    reason = "tagged words and slot pointers are reinterpreted at the fixed widths of the layout"
)]

pub mod abi;
pub mod definedness;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod getter;
pub mod host;
pub mod instance;
pub mod setter;
pub mod tagged;

pub use abi::{getter_entry, setter_entry, AttrAccessors, GetterFn, SetterFn};
pub use definedness::{is_undefined, set_defined, NativeInt, BOOL_UNDEFINED, FLOAT_ERROR};
pub use descriptor::{
    AttrDescriptor, AttrFlags, AttrRepr, BitmapRef, BoxedType, DescriptorError, SetterType,
};
pub use dispatch::{get_attr, set_attr, ClassAttrs};
pub use error::{undefined_error, undeletable_error, AttrError};
pub use getter::{get_bool, get_boxed, get_float, get_int16, get_int32, get_int64, get_tagged};
pub use host::{ExcKind, Host, HostError, HostObj};
pub use instance::Instance;
pub use setter::{set_bool, set_boxed, set_float, set_int16, set_int32, set_int64, set_tagged};
pub use tagged::{Tagged, INT_TAG};

#[cfg(test)]
mod test_helpers;
