//! Shared test utilities for the accessor family.
//!
//! A zeroed raw instance record and a minimal [`Host`] whose objects are
//! never freed, so tests can inspect reference counts after every call.
//! Only compiled in test builds.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "tests can panic")]

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::cell::{Cell, RefCell};

use crate::descriptor::BoxedType;
use crate::host::{ExcKind, Host, HostError, HostObj};
use crate::instance::Instance;

/// A zero-filled, 8-aligned instance record.
pub(crate) struct Record {
    ptr: *mut u8,
    layout: Layout,
}

impl Record {
    pub(crate) fn new(size: usize) -> Self {
        let layout = Layout::from_size_align(size, 8).unwrap();
        // SAFETY: size is non-zero in every test.
        let ptr = unsafe { alloc_zeroed(layout) };
        assert!(!ptr.is_null());
        Record { ptr, layout }
    }

    pub(crate) fn instance(&self) -> Instance {
        // SAFETY: the record outlives every handle used in a test, and tests
        // only use descriptors that fit the record.
        unsafe { Instance::from_raw(self.ptr) }.unwrap()
    }

    pub(crate) fn read<T: Copy>(&self, offset: usize) -> T {
        assert!(offset + std::mem::size_of::<T>() <= self.layout.size());
        // SAFETY: bounds checked above; tests use aligned offsets.
        unsafe { self.ptr.add(offset).cast::<T>().read() }
    }

    pub(crate) fn write<T: Copy>(&self, offset: usize, value: T) {
        assert!(offset + std::mem::size_of::<T>() <= self.layout.size());
        // SAFETY: bounds checked above; tests use aligned offsets.
        unsafe { self.ptr.add(offset).cast::<T>().write(value) }
    }
}

impl Drop for Record {
    fn drop(&mut self) {
        // SAFETY: allocated in `new` with the same layout.
        unsafe { dealloc(self.ptr, self.layout) }
    }
}

#[derive(Debug)]
pub(crate) enum MockValue {
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str,
    List,
}

#[repr(align(8))]
struct MockObj {
    refcnt: Cell<i64>,
    value: MockValue,
}

/// Host whose objects live until the host is dropped.
pub(crate) struct MockHost {
    objects: RefCell<Vec<*mut MockObj>>,
    none: HostObj,
    true_obj: HostObj,
    false_obj: HostObj,
    raised: RefCell<Vec<(ExcKind, String)>>,
    fail_unbox: Cell<bool>,
}

fn leak(value: MockValue) -> *mut MockObj {
    Box::into_raw(Box::new(MockObj {
        refcnt: Cell::new(1),
        value,
    }))
}

impl MockHost {
    pub(crate) fn new() -> Self {
        let none = leak(MockValue::None);
        let true_obj = leak(MockValue::Bool(true));
        let false_obj = leak(MockValue::Bool(false));
        MockHost {
            objects: RefCell::new(vec![none, true_obj, false_obj]),
            none: HostObj::from_raw(none.cast()).unwrap(),
            true_obj: HostObj::from_raw(true_obj.cast()).unwrap(),
            false_obj: HostObj::from_raw(false_obj.cast()).unwrap(),
            raised: RefCell::new(Vec::new()),
            fail_unbox: Cell::new(false),
        }
    }

    /// Allocate an object with one reference owned by the test.
    pub(crate) fn new_obj(&self, value: MockValue) -> HostObj {
        let ptr = leak(value);
        self.objects.borrow_mut().push(ptr);
        HostObj::from_raw(ptr.cast()).unwrap()
    }

    pub(crate) fn refcount(&self, obj: HostObj) -> i64 {
        self.get(obj).refcnt.get()
    }

    pub(crate) fn value(&self, obj: HostObj) -> &MockValue {
        &self.get(obj).value
    }

    /// Drain exceptions raised so far.
    pub(crate) fn take_raised(&self) -> Vec<(ExcKind, String)> {
        std::mem::take(&mut *self.raised.borrow_mut())
    }

    pub(crate) fn fail_next_unbox(&self) {
        self.fail_unbox.set(true);
    }

    fn get(&self, obj: HostObj) -> &MockObj {
        // SAFETY: every HostObj in a test comes from this host, and objects
        // are only freed when the host drops.
        unsafe { &*obj.as_ptr().cast::<MockObj>() }
    }
}

impl Drop for MockHost {
    fn drop(&mut self) {
        for ptr in self.objects.borrow_mut().drain(..) {
            // SAFETY: allocated by `leak` and freed exactly once here.
            drop(unsafe { Box::from_raw(ptr) });
        }
    }
}

impl Host for MockHost {
    fn instance_type_name(&self, _instance: Instance) -> String {
        "C".to_owned()
    }

    fn value_type_name(&self, value: HostObj) -> String {
        match self.value(value) {
            MockValue::None => "NoneType",
            MockValue::Bool(_) => "bool",
            MockValue::Int(_) => "int",
            MockValue::Float(_) => "float",
            MockValue::Str => "str",
            MockValue::List => "list",
        }
        .to_owned()
    }

    fn incref(&self, obj: HostObj) {
        let cnt = &self.get(obj).refcnt;
        cnt.set(cnt.get() + 1);
    }

    fn decref(&self, obj: HostObj) {
        let cnt = &self.get(obj).refcnt;
        cnt.set(cnt.get() - 1);
        assert!(cnt.get() >= 0, "refcount underflow");
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
        matches!(
            (ty, self.value(value)),
            (BoxedType::Int, MockValue::Int(_) | MockValue::Bool(_))
                | (BoxedType::Bool, MockValue::Bool(_))
                | (BoxedType::Float, MockValue::Float(_))
                | (BoxedType::Str, MockValue::Str)
                | (BoxedType::List, MockValue::List)
        )
    }

    fn int_as_i64(&self, value: HostObj) -> Option<i64> {
        match self.value(value) {
            MockValue::Int(v) => i64::try_from(*v).ok(),
            MockValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    fn box_i64(&self, value: i64) -> Result<HostObj, HostError> {
        Ok(self.new_obj(MockValue::Int(i128::from(value))))
    }

    fn float_as_f64(&self, value: HostObj) -> Result<f64, HostError> {
        if self.fail_unbox.replace(false) {
            self.raise(ExcKind::TypeError, "unboxing failed");
            return Err(HostError);
        }
        match self.value(value) {
            MockValue::Float(v) => Ok(*v),
            _ => Err(HostError),
        }
    }

    fn box_f64(&self, value: f64) -> Result<HostObj, HostError> {
        Ok(self.new_obj(MockValue::Float(value)))
    }

    fn raise(&self, kind: ExcKind, message: &str) {
        self.raised.borrow_mut().push((kind, message.to_owned()));
    }

    fn raise_type_error(&self, expected: &str, value: HostObj) {
        let got = if value == self.none {
            "None".to_owned()
        } else {
            self.value_type_name(value)
        };
        self.raise(
            ExcKind::TypeError,
            &format!("{expected} object expected; got {got}"),
        );
    }
}
