//! Tagged integer words.
//!
//! A tagged slot is one machine word holding either a short integer inline
//! or a pointer to a boxed host integer:
//!
//! ```text
//!   low bit 0:  [ value (word_bits - 1 bits, signed) | 0 ]   short form
//!   low bit 1:  [ host integer pointer             | 1 ]     boxed form
//! ```
//!
//! [`INT_TAG`] is the boxed form of a null pointer and marks the slot as
//! undefined. A boxed slot owns one strong reference to its integer object.

use crate::host::{Host, HostError, HostObj};

/// One tagged machine word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Tagged(usize);

/// The undefined tagged word.
pub const INT_TAG: Tagged = Tagged(1);

impl Tagged {
    /// Smallest integer representable in short form.
    pub const SHORT_MIN: i64 = (isize::MIN >> 1) as i64;
    /// Largest integer representable in short form.
    pub const SHORT_MAX: i64 = (isize::MAX >> 1) as i64;

    #[inline]
    pub const fn from_bits(bits: usize) -> Self {
        Tagged(bits)
    }

    #[inline]
    pub const fn bits(self) -> usize {
        self.0
    }

    /// Encode `value` in short form, if it fits.
    pub fn from_short(value: i64) -> Option<Self> {
        if !(Self::SHORT_MIN..=Self::SHORT_MAX).contains(&value) {
            return None;
        }
        Some(Tagged(((value as isize) << 1) as usize))
    }

    /// Boxed form of `obj`. Does not touch the reference count.
    #[inline]
    pub fn from_boxed(obj: HostObj) -> Self {
        debug_assert_eq!(obj.addr() & 1, 0, "host objects must be 2-byte aligned");
        Tagged(obj.addr() | 1)
    }

    #[inline]
    pub const fn is_undefined(self) -> bool {
        self.0 == INT_TAG.0
    }

    #[inline]
    pub const fn is_short(self) -> bool {
        self.0 & 1 == 0
    }

    /// The inline value of a short-form word.
    #[inline]
    pub fn short_value(self) -> Option<i64> {
        self.is_short().then_some(((self.0 as isize) >> 1) as i64)
    }

    /// The integer object of a boxed-form word; `None` for short form and for
    /// [`INT_TAG`].
    #[inline]
    pub fn boxed(self) -> Option<HostObj> {
        if self.is_short() {
            return None;
        }
        HostObj::from_raw((self.0 & !1) as *mut u8)
    }

    /// Encode a host integer, acquiring a reference when it needs the boxed
    /// form.
    ///
    /// `value` must already have passed the host integer check.
    pub fn from_host<H: Host + ?Sized>(host: &H, value: HostObj) -> Self {
        if let Some(tagged) = host.int_as_i64(value).and_then(Self::from_short) {
            return tagged;
        }
        host.incref(value);
        Self::from_boxed(value)
    }

    /// Produce a host integer for this word. Returns a new reference.
    ///
    /// Must not be called on [`INT_TAG`].
    pub fn to_host<H: Host + ?Sized>(self, host: &H) -> Result<HostObj, HostError> {
        debug_assert!(!self.is_undefined(), "undefined tagged word has no value");
        if let Some(value) = self.short_value() {
            return host.box_i64(value);
        }
        match self.boxed() {
            Some(obj) => {
                host.incref(obj);
                Ok(obj)
            }
            None => Err(HostError),
        }
    }

    /// Release the reference owned by a boxed-form word. No-op for short form
    /// and [`INT_TAG`].
    #[inline]
    pub fn release<H: Host + ?Sized>(self, host: &H) {
        if let Some(obj) = self.boxed() {
            host.decref(obj);
        }
    }
}
