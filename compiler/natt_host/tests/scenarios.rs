//! End-to-end scenarios through the ABI-shaped entry points.
//!
//! Every accessor call goes through `AttrAccessors` the way generated code
//! would: getters return `None` and setters `-1` after raising, and the
//! raised exception is read back from the runtime's pending state.

#![allow(clippy::unwrap_used, reason = "tests can panic")]

use std::rc::Rc;

use natt_host::{
    reset_error_state, take_error, FieldKind, LayoutBuilder, NativeInstance, Runtime, Value,
};
use natt_rt::{
    AttrDescriptor, AttrFlags, BoxedType, ExcKind, Host, HostObj, NativeInt, SetterType,
};
use pretty_assertions::assert_eq;

struct Attr<'a> {
    rt: &'a Runtime,
    obj: &'a NativeInstance<'a>,
    desc: AttrDescriptor,
}

impl<'a> Attr<'a> {
    fn new(rt: &'a Runtime, obj: &'a NativeInstance<'a>, name: &str) -> Self {
        let desc = *obj.class().descriptor(name).unwrap();
        Attr { rt, obj, desc }
    }

    fn get(&self) -> Option<HostObj> {
        let acc = self.desc.repr.accessors::<Runtime>();
        acc.get(self.rt, self.obj.instance(), &self.desc)
    }

    fn set(&self, value: HostObj) -> i32 {
        let acc = self.desc.repr.accessors::<Runtime>();
        acc.set(self.rt, self.obj.instance(), Some(value), &self.desc)
    }

    fn delete(&self) -> i32 {
        let acc = self.desc.repr.accessors::<Runtime>();
        acc.set(self.rt, self.obj.instance(), None, &self.desc)
    }
}

fn class_with(name: &'static str, kind: FieldKind, flags: AttrFlags) -> Rc<natt_host::NativeClass> {
    Rc::new(LayoutBuilder::new("C").field(name, kind, flags).build().unwrap())
}

fn pending() -> (ExcKind, String) {
    let err = take_error().unwrap();
    (err.kind, err.message)
}

#[test]
fn boxed_str_deletable() {
    reset_error_state();
    let rt = Runtime::new();
    let class = class_with(
        "x",
        FieldKind::Boxed(SetterType::of(BoxedType::Str)),
        AttrFlags::DELETABLE,
    );
    let obj = NativeInstance::new(&rt, &class);
    let x = Attr::new(&rt, &obj, "x");

    let hi = rt.string("hi");
    assert_eq!(x.set(hi), 0);
    let got = x.get().unwrap();
    assert_eq!(got, hi);
    rt.release(got);

    let n = rt.int(42);
    assert_eq!(x.set(n), -1);
    assert_eq!(
        pending(),
        (ExcKind::TypeError, "str object expected; got int".to_owned())
    );
    let got = x.get().unwrap();
    assert!(matches!(rt.value(got), Value::Str(s) if s == "hi"));
    rt.release(got);

    assert_eq!(x.delete(), 0);
    assert_eq!(x.get(), None);
    assert_eq!(
        pending(),
        (ExcKind::AttributeError, "attribute 'x' of 'C' undefined".to_owned())
    );

    assert_eq!(rt.refcount(hi), 1);
    rt.release(hi);
    rt.release(n);
}

#[test]
fn tagged_int_not_deletable() {
    reset_error_state();
    let rt = Runtime::new();
    let class = class_with("n", FieldKind::Tagged, AttrFlags::empty());
    let obj = NativeInstance::new(&rt, &class);
    let n = Attr::new(&rt, &obj, "n");

    let three = rt.int(3);
    assert_eq!(n.set(three), 0);
    let got = n.get().unwrap();
    assert!(matches!(rt.value(got), Value::Int(3)));
    rt.release(got);

    let big = rt.int(1 << 100);
    assert_eq!(n.set(big), 0);
    let got = n.get().unwrap();
    assert_eq!(got, big, "large values keep the boxed object");
    rt.release(got);

    assert_eq!(n.delete(), -1);
    assert_eq!(
        pending(),
        (
            ExcKind::AttributeError,
            "'C' object attribute 'n' cannot be deleted".to_owned()
        )
    );
    let got = n.get().unwrap();
    assert!(matches!(rt.value(got), Value::Int(v) if *v == 1 << 100));
    rt.release(got);

    rt.release(three);
    rt.release(big);
}

#[test]
fn float_sentinel_with_bitmap() {
    reset_error_state();
    let rt = Runtime::new();
    let class = class_with("f", FieldKind::Float, AttrFlags::DELETABLE);
    let obj = NativeInstance::new(&rt, &class);
    let f = Attr::new(&rt, &obj, "f");
    let sentinel = rt.float(natt_rt::FLOAT_ERROR);
    let one_half = rt.float(1.5);

    assert_eq!(f.set(sentinel), 0);
    let got = f.get().unwrap();
    assert!(matches!(rt.value(got), Value::Float(v) if *v == -113.0));
    rt.release(got);

    assert_eq!(f.delete(), 0);
    assert_eq!(f.get(), None);
    assert_eq!(pending().1, "attribute 'f' of 'C' undefined");

    assert_eq!(f.set(one_half), 0);
    assert_eq!(f.delete(), 0);
    assert_eq!(f.set(sentinel), 0);
    let got = f.get().unwrap();
    assert!(matches!(rt.value(got), Value::Float(v) if *v == -113.0));
    rt.release(got);

    rt.release(sentinel);
    rt.release(one_half);
}

#[test]
fn int32_pair_shares_bitmap_word() {
    reset_error_state();
    let rt = Runtime::new();
    let class = Rc::new(
        LayoutBuilder::new("C")
            .field("a", FieldKind::Int32, AttrFlags::DELETABLE)
            .field("b", FieldKind::Int32, AttrFlags::DELETABLE)
            .build()
            .unwrap(),
    );
    let obj = NativeInstance::new(&rt, &class);
    let a = Attr::new(&rt, &obj, "a");
    let b = Attr::new(&rt, &obj, "b");
    assert_eq!(a.desc.bitmap.offset, b.desc.bitmap.offset);
    assert_eq!((a.desc.bitmap.mask, b.desc.bitmap.mask), (0x1, 0x2));

    let sentinel = rt.int(i128::from(i32::ERROR));
    assert_eq!(a.set(sentinel), 0);
    assert_eq!(b.delete(), 0);

    let got = a.get().unwrap();
    assert!(matches!(rt.value(got), Value::Int(-113)));
    rt.release(got);
    assert_eq!(b.get(), None);
    assert_eq!(pending().1, "attribute 'b' of 'C' undefined");
    assert_eq!(obj.bitmap_word(a.desc.bitmap.offset), 0x1);

    rt.release(sentinel);
}

#[test]
fn bool_deletable() {
    reset_error_state();
    let rt = Runtime::new();
    let class = class_with("flag", FieldKind::Bool, AttrFlags::DELETABLE);
    let obj = NativeInstance::new(&rt, &class);
    let flag = Attr::new(&rt, &obj, "flag");

    assert_eq!(flag.set(rt.bool_obj(true)), 0);
    let got = flag.get().unwrap();
    assert_eq!(got, rt.bool_obj(true));
    rt.release(got);

    let one = rt.int(1);
    assert_eq!(flag.set(one), -1);
    assert_eq!(
        pending(),
        (ExcKind::TypeError, "bool object expected; got int".to_owned())
    );

    assert_eq!(flag.delete(), 0);
    assert_eq!(flag.get(), None);
    assert_eq!(pending().0, ExcKind::AttributeError);
    rt.release(one);
}

#[test]
fn optional_list() {
    reset_error_state();
    let rt = Runtime::new();
    let class = class_with(
        "items",
        FieldKind::Boxed(SetterType::optional(BoxedType::List)),
        AttrFlags::empty(),
    );
    let obj = NativeInstance::new(&rt, &class);
    let items = Attr::new(&rt, &obj, "items");

    let empty = rt.list(&[]);
    assert_eq!(items.set(empty), 0);
    assert_eq!(items.set(rt.none()), 0);
    let got = items.get().unwrap();
    assert_eq!(got, rt.none());
    rt.release(got);

    let n = rt.int(42);
    assert_eq!(items.set(n), -1);
    assert_eq!(
        pending(),
        (ExcKind::TypeError, "list object expected; got int".to_owned())
    );

    assert_eq!(rt.refcount(empty), 1);
    rt.release(empty);
    rt.release(n);
}
