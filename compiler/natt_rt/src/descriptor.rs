//! Per-attribute descriptors.
//!
//! A compiler materializes one [`AttrDescriptor`] per attribute of a native
//! class, usually as a `static`, and references it from the class's
//! attribute-dispatch table. The descriptor is immutable and carries
//! everything the accessor family needs: where the slot is, how definedness
//! is encoded, and what the setter accepts.
//!
//! # Contract
//!
//! A descriptor is valid for an instance layout iff:
//! - the slot at `offset` lies within the instance and is aligned for the
//!   representation;
//! - for bitmap representations, `bitmap.offset` names a 4-aligned `u32`
//!   inside the instance and `bitmap.mask` has exactly one bit set.
//!
//! The accessors assume validity. [`AttrDescriptor::validate`] checks it and
//! is run whenever a [`ClassAttrs`](crate::ClassAttrs) table is built.

use bitflags::bitflags;

bitflags! {
    /// Definedness and deletion policy of an attribute.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct AttrFlags: u8 {
        /// The compiler proved the attribute is initialized before every
        /// read; getters skip definedness checks.
        const ALWAYS_DEFINED = 1 << 0;
        /// Deleting the attribute is permitted and makes it undefined.
        const DELETABLE = 1 << 1;
    }
}

/// Expected host type of a boxed-reference setter.
///
/// Closed set; [`Any`](BoxedType::Any) disables the check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoxedType {
    Any,
    /// Host string.
    Str,
    /// Host integer (booleans included).
    Int,
    Bool,
    Float,
    Tuple,
    List,
    /// Host mapping.
    Dict,
    Set,
}

impl BoxedType {
    /// The host-level type name, used as the default diagnostic name.
    pub const fn name(self) -> &'static str {
        match self {
            BoxedType::Any => "object",
            BoxedType::Str => "str",
            BoxedType::Int => "int",
            BoxedType::Bool => "bool",
            BoxedType::Float => "float",
            BoxedType::Tuple => "tuple",
            BoxedType::List => "list",
            BoxedType::Dict => "dict",
            BoxedType::Set => "set",
        }
    }
}

/// Type check applied by the boxed-reference setter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SetterType {
    pub ty: BoxedType,
    /// Name reported in type-mismatch diagnostics.
    pub name: &'static str,
    /// Also accept the host's null-like singleton.
    pub optional: bool,
}

impl SetterType {
    /// Accept anything.
    pub const ANY: SetterType = SetterType::of(BoxedType::Any);

    pub const fn of(ty: BoxedType) -> Self {
        SetterType {
            ty,
            name: ty.name(),
            optional: false,
        }
    }

    /// `ty`, or the null-like singleton.
    pub const fn optional(ty: BoxedType) -> Self {
        SetterType {
            ty,
            name: ty.name(),
            optional: true,
        }
    }

    /// Override the diagnostic name (e.g. a user-visible union spelling).
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Whether the setter performs a type check at all.
    #[inline]
    pub const fn is_checked(&self) -> bool {
        !matches!(self.ty, BoxedType::Any)
    }
}

/// One bit in a `u32` bitmap word stored inside the instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitmapRef {
    /// Byte offset of the bitmap word.
    pub offset: usize,
    pub mask: u32,
}

impl BitmapRef {
    /// Placeholder for representations that never consult a bitmap.
    pub const NONE: BitmapRef = BitmapRef { offset: 0, mask: 0 };

    pub const fn new(offset: usize, mask: u32) -> Self {
        BitmapRef { offset, mask }
    }

    /// Bit `index` (0..32) of the word at `offset`.
    pub const fn bit(offset: usize, index: u32) -> Self {
        BitmapRef {
            offset,
            mask: 1 << index,
        }
    }
}

/// Storage representation of an attribute slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrRepr {
    /// Host object pointer; null means undefined.
    Boxed,
    /// Tagged machine word: short integer inline, large integer boxed.
    Tagged,
    /// One byte: 0, 1, or 2 for undefined.
    Bool,
    Float,
    Int16,
    Int32,
    Int64,
}

impl AttrRepr {
    /// Slot width in bytes.
    pub const fn size(self) -> usize {
        match self {
            AttrRepr::Boxed | AttrRepr::Tagged => std::mem::size_of::<usize>(),
            AttrRepr::Bool => 1,
            AttrRepr::Float | AttrRepr::Int64 => 8,
            AttrRepr::Int16 => 2,
            AttrRepr::Int32 => 4,
        }
    }

    /// Required slot alignment in bytes.
    pub const fn align(self) -> usize {
        match self {
            AttrRepr::Boxed | AttrRepr::Tagged => std::mem::align_of::<usize>(),
            AttrRepr::Bool => 1,
            AttrRepr::Float => std::mem::align_of::<f64>(),
            AttrRepr::Int16 => std::mem::align_of::<i16>(),
            AttrRepr::Int32 => std::mem::align_of::<i32>(),
            AttrRepr::Int64 => std::mem::align_of::<i64>(),
        }
    }

    /// Whether undefined is disambiguated through a bitmap bit.
    pub const fn uses_bitmap(self) -> bool {
        matches!(
            self,
            AttrRepr::Float | AttrRepr::Int16 | AttrRepr::Int32 | AttrRepr::Int64
        )
    }

    /// Whether the slot owns a strong reference when defined.
    pub const fn holds_reference(self) -> bool {
        matches!(self, AttrRepr::Boxed | AttrRepr::Tagged)
    }

    pub const fn name(self) -> &'static str {
        match self {
            AttrRepr::Boxed => "boxed",
            AttrRepr::Tagged => "tagged",
            AttrRepr::Bool => "bool",
            AttrRepr::Float => "float",
            AttrRepr::Int16 => "i16",
            AttrRepr::Int32 => "i32",
            AttrRepr::Int64 => "i64",
        }
    }
}

/// Immutable per-attribute metadata consumed by the accessor family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttrDescriptor {
    /// Source-level attribute name.
    pub attr_name: &'static str,
    /// Byte offset of the primary slot.
    pub offset: usize,
    pub repr: AttrRepr,
    pub flags: AttrFlags,
    /// Only meaningful when `repr.uses_bitmap()`.
    pub bitmap: BitmapRef,
    /// Only meaningful for [`AttrRepr::Boxed`].
    pub setter_type: SetterType,
}

impl AttrDescriptor {
    const fn with_repr(attr_name: &'static str, offset: usize, repr: AttrRepr) -> Self {
        AttrDescriptor {
            attr_name,
            offset,
            repr,
            flags: AttrFlags::empty(),
            bitmap: BitmapRef::NONE,
            setter_type: SetterType::ANY,
        }
    }

    pub const fn boxed(attr_name: &'static str, offset: usize, setter_type: SetterType) -> Self {
        let mut desc = Self::with_repr(attr_name, offset, AttrRepr::Boxed);
        desc.setter_type = setter_type;
        desc
    }

    pub const fn tagged(attr_name: &'static str, offset: usize) -> Self {
        Self::with_repr(attr_name, offset, AttrRepr::Tagged)
    }

    pub const fn boolean(attr_name: &'static str, offset: usize) -> Self {
        Self::with_repr(attr_name, offset, AttrRepr::Bool)
    }

    pub const fn float(attr_name: &'static str, offset: usize, bitmap: BitmapRef) -> Self {
        let mut desc = Self::with_repr(attr_name, offset, AttrRepr::Float);
        desc.bitmap = bitmap;
        desc
    }

    pub const fn int16(attr_name: &'static str, offset: usize, bitmap: BitmapRef) -> Self {
        let mut desc = Self::with_repr(attr_name, offset, AttrRepr::Int16);
        desc.bitmap = bitmap;
        desc
    }

    pub const fn int32(attr_name: &'static str, offset: usize, bitmap: BitmapRef) -> Self {
        let mut desc = Self::with_repr(attr_name, offset, AttrRepr::Int32);
        desc.bitmap = bitmap;
        desc
    }

    pub const fn int64(attr_name: &'static str, offset: usize, bitmap: BitmapRef) -> Self {
        let mut desc = Self::with_repr(attr_name, offset, AttrRepr::Int64);
        desc.bitmap = bitmap;
        desc
    }

    /// Mark the attribute as initialized on every reachable read.
    pub const fn always_defined(mut self) -> Self {
        self.flags = self.flags.union(AttrFlags::ALWAYS_DEFINED);
        self
    }

    /// Permit deletion.
    pub const fn deletable(mut self) -> Self {
        self.flags = self.flags.union(AttrFlags::DELETABLE);
        self
    }

    #[inline]
    pub const fn is_always_defined(&self) -> bool {
        self.flags.contains(AttrFlags::ALWAYS_DEFINED)
    }

    #[inline]
    pub const fn is_deletable(&self) -> bool {
        self.flags.contains(AttrFlags::DELETABLE)
    }

    /// Check the descriptor contract against an instance of `instance_size`
    /// bytes.
    pub fn validate(&self, instance_size: usize) -> Result<(), DescriptorError> {
        let size = self.repr.size();
        let align = self.repr.align();
        if self.offset.checked_add(size).map_or(true, |end| end > instance_size) {
            return Err(DescriptorError::SlotOutOfBounds {
                attr: self.attr_name,
                offset: self.offset,
                size,
                instance_size,
            });
        }
        if self.offset % align != 0 {
            return Err(DescriptorError::MisalignedSlot {
                attr: self.attr_name,
                offset: self.offset,
                align,
            });
        }

        if self.repr.uses_bitmap() {
            let word = self.bitmap.offset;
            let in_bounds = word
                .checked_add(std::mem::size_of::<u32>())
                .is_some_and(|end| end <= instance_size);
            if !in_bounds || word % std::mem::align_of::<u32>() != 0 {
                return Err(DescriptorError::BadBitmapWord {
                    attr: self.attr_name,
                    offset: word,
                });
            }
            if self.bitmap.mask.count_ones() != 1 {
                return Err(DescriptorError::BadBitmapMask {
                    attr: self.attr_name,
                    mask: self.bitmap.mask,
                });
            }
        }

        if self.repr != AttrRepr::Boxed && self.setter_type.is_checked() {
            return Err(DescriptorError::SetterTypeOnUnboxed {
                attr: self.attr_name,
                repr: self.repr.name(),
            });
        }

        Ok(())
    }
}

/// Violation of the descriptor contract.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error(
        "attribute '{attr}': slot at offset {offset} ({size} bytes) exceeds instance size {instance_size}"
    )]
    SlotOutOfBounds {
        attr: &'static str,
        offset: usize,
        size: usize,
        instance_size: usize,
    },
    #[error("attribute '{attr}': slot offset {offset} is not {align}-byte aligned")]
    MisalignedSlot {
        attr: &'static str,
        offset: usize,
        align: usize,
    },
    #[error("attribute '{attr}': bitmap word at offset {offset} is out of bounds or misaligned")]
    BadBitmapWord { attr: &'static str, offset: usize },
    #[error("attribute '{attr}': bitmap mask {mask:#x} must have exactly one bit set")]
    BadBitmapMask { attr: &'static str, mask: u32 },
    #[error("attribute '{attr}': {repr} slots take no setter type")]
    SetterTypeOnUnboxed {
        attr: &'static str,
        repr: &'static str,
    },
    #[error("attribute '{attr}' is described twice")]
    DuplicateAttribute { attr: &'static str },
    #[error("attributes '{attr}' and '{other}' share a bitmap bit")]
    SharedBitmapBit {
        attr: &'static str,
        other: &'static str,
    },
}
