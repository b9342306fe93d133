//! Reference host runtime for `natt_rt`.
//!
//! A small single-threaded dynamic runtime that implements the
//! [`natt_rt::Host`] seam, so the accessor family can be exercised end to
//! end:
//!
//! - [`rc`]: refcounted allocations with an 8-byte count header in front of
//!   the data pointer
//! - [`value`]: host values (`None`, `bool`, `int`, `float`, `str` and the
//!   containers) stored in those allocations
//! - [`exc`]: the per-thread pending exception
//! - [`layout`]: the layout pass that turns a class's attribute list into
//!   descriptors
//! - [`NativeInstance`]: instance records initialized to all-undefined
//!
//! ```text
//!   let rt = Runtime::new();
//!   let class = Rc::new(LayoutBuilder::new("Point").field(...).build()?);
//!   let p = NativeInstance::new(&rt, &class);
//!   p.set("x", rt.float(1.5))?;
//! ```

pub mod exc;
mod instance;
pub mod layout;
pub mod rc;
mod runtime;
pub mod value;

pub use exc::{error_occurred, reset_error_state, take_error, PendingError};
pub use instance::NativeInstance;
pub use layout::{FieldKind, LayoutBuilder, LayoutError, NativeClass, HEADER_SIZE};
pub use runtime::Runtime;
pub use value::Value;
