#![allow(clippy::unwrap_used, reason = "tests can panic")]

use pretty_assertions::assert_eq;

use crate::definedness::{set_defined, NativeInt, FLOAT_ERROR};
use crate::descriptor::{AttrDescriptor, BitmapRef, SetterType};
use crate::tagged::{Tagged, INT_TAG};
use crate::test_helpers::{MockHost, MockValue, Record};

use super::*;

// Layout shared by these tests:
//   0: bitmap word   8: boxed   16: tagged   24: f64   32: i64   40: i32   44: i16   46: bool
const BITMAP: usize = 0;
const OBJ: AttrDescriptor = AttrDescriptor::boxed("obj", 8, SetterType::ANY);
const TAG: AttrDescriptor = AttrDescriptor::tagged("tag", 16);
const FLT: AttrDescriptor = AttrDescriptor::float("flt", 24, BitmapRef::bit(BITMAP, 0));
const I64: AttrDescriptor = AttrDescriptor::int64("i64", 32, BitmapRef::bit(BITMAP, 1));
const I32: AttrDescriptor = AttrDescriptor::int32("i32", 40, BitmapRef::bit(BITMAP, 2));
const I16: AttrDescriptor = AttrDescriptor::int16("i16", 44, BitmapRef::bit(BITMAP, 3));
const FLAG: AttrDescriptor = AttrDescriptor::boolean("flag", 46);

fn undefined_record() -> Record {
    let rec = Record::new(48);
    rec.write::<usize>(TAG.offset, INT_TAG.bits());
    rec.write(FLT.offset, FLOAT_ERROR);
    rec.write(I64.offset, i64::ERROR);
    rec.write(I32.offset, i32::ERROR);
    rec.write(I16.offset, i16::ERROR);
    rec.write(FLAG.offset, 2_u8);
    rec
}

fn assert_undefined(result: Result<HostObj, AttrError>, attr: &str) {
    assert_eq!(
        result.unwrap_err().to_string(),
        format!("attribute '{attr}' of 'C' undefined")
    );
}

#[test]
fn every_getter_reports_undefined_on_fresh_record() {
    let host = MockHost::new();
    let rec = undefined_record();
    let inst = rec.instance();

    assert_undefined(get_boxed(&host, inst, &OBJ), "obj");
    assert_undefined(get_tagged(&host, inst, &TAG), "tag");
    assert_undefined(get_float(&host, inst, &FLT), "flt");
    assert_undefined(get_int64(&host, inst, &I64), "i64");
    assert_undefined(get_int32(&host, inst, &I32), "i32");
    assert_undefined(get_int16(&host, inst, &I16), "i16");
    assert_undefined(get_bool(&host, inst, &FLAG), "flag");
}

#[test]
fn boxed_getter_returns_new_reference() {
    let host = MockHost::new();
    let rec = undefined_record();
    let obj = host.new_obj(MockValue::Str);
    rec.write(OBJ.offset, obj.as_ptr());

    let got = get_boxed(&host, rec.instance(), &OBJ).unwrap();
    assert_eq!(got, obj);
    assert_eq!(host.refcount(obj), 2);
}

#[test]
fn tagged_getter_boxes_short_form() {
    let host = MockHost::new();
    let rec = undefined_record();
    rec.write::<usize>(TAG.offset, Tagged::from_short(-3).unwrap().bits());

    let got = get_tagged(&host, rec.instance(), &TAG).unwrap();
    assert!(matches!(host.value(got), MockValue::Int(-3)));
}

#[test]
fn bool_getter_returns_singletons() {
    let host = MockHost::new();
    let rec = undefined_record();

    rec.write(FLAG.offset, 1_u8);
    assert_eq!(get_bool(&host, rec.instance(), &FLAG).unwrap(), host.bool_obj(true));
    rec.write(FLAG.offset, 0_u8);
    assert_eq!(get_bool(&host, rec.instance(), &FLAG).unwrap(), host.bool_obj(false));
    assert_eq!(host.refcount(host.bool_obj(false)), 2);
}

#[test]
fn float_sentinel_with_bit_set_is_a_value() {
    let host = MockHost::new();
    let rec = undefined_record();
    set_defined(rec.instance(), FLT.bitmap, true);

    let got = get_float(&host, rec.instance(), &FLT).unwrap();
    assert!(matches!(host.value(got), MockValue::Float(v) if *v == FLOAT_ERROR));
}

#[test]
fn non_sentinel_float_ignores_bitmap() {
    let host = MockHost::new();
    let rec = undefined_record();
    rec.write(FLT.offset, 2.5_f64);

    let got = get_float(&host, rec.instance(), &FLT).unwrap();
    assert!(matches!(host.value(got), MockValue::Float(v) if *v == 2.5));
}

#[test]
fn int_getters_widen() {
    let host = MockHost::new();
    let rec = undefined_record();
    rec.write(I16.offset, i16::MIN);
    rec.write(I32.offset, 70_000_i32);
    rec.write(I64.offset, i64::MAX);

    let a = get_int16(&host, rec.instance(), &I16).unwrap();
    let b = get_int32(&host, rec.instance(), &I32).unwrap();
    let c = get_int64(&host, rec.instance(), &I64).unwrap();
    assert!(matches!(host.value(a), MockValue::Int(v) if *v == i128::from(i16::MIN)));
    assert!(matches!(host.value(b), MockValue::Int(70_000)));
    assert!(matches!(host.value(c), MockValue::Int(v) if *v == i128::from(i64::MAX)));
}

#[test]
fn int_sentinel_bits_are_per_attribute() {
    let host = MockHost::new();
    let rec = undefined_record();
    set_defined(rec.instance(), I32.bitmap, true);

    assert!(get_int32(&host, rec.instance(), &I32).is_ok());
    assert_undefined(get_int16(&host, rec.instance(), &I16), "i16");
    assert_undefined(get_int64(&host, rec.instance(), &I64), "i64");
}

#[test]
fn always_defined_skips_bitmap() {
    let host = MockHost::new();
    let rec = undefined_record();
    let flt = FLT.always_defined();
    let i32_desc = I32.always_defined();

    let f = get_float(&host, rec.instance(), &flt).unwrap();
    let i = get_int32(&host, rec.instance(), &i32_desc).unwrap();
    assert!(matches!(host.value(f), MockValue::Float(v) if *v == FLOAT_ERROR));
    assert!(matches!(host.value(i), MockValue::Int(-113)));
    assert_eq!(rec.read::<u32>(BITMAP), 0);
}
