//! Native class layouts.
//!
//! [`LayoutBuilder`] plays the part of the compiler's layout pass: given the
//! attributes of a class in declaration order it assigns slot offsets and
//! bitmap bits and produces the descriptors, wrapped in a validated
//! [`ClassAttrs`] table.
//!
//! Instance record:
//!
//! ```text
//!   0                 8                   8 + 4*words
//!   [ class pointer ] [ bitmap words ... ] [ slots, in declaration order ]
//! ```
//!
//! Bitmap attributes (float and fixed-width integers) take bits in order:
//! the n-th one gets bit `n % 32` of word `n / 32`.

use std::alloc::Layout;

use natt_rt::{
    AttrDescriptor, AttrFlags, AttrRepr, BitmapRef, ClassAttrs, DescriptorError, SetterType,
};
use smallvec::SmallVec;

/// Bytes before the first bitmap word: the class pointer.
pub const HEADER_SIZE: usize = 8;

const BITS_PER_WORD: u32 = u32::BITS;

/// Declared type of an attribute, as the layout pass sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Boxed(SetterType),
    Tagged,
    Bool,
    Float,
    Int16,
    Int32,
    Int64,
}

impl FieldKind {
    pub fn repr(self) -> AttrRepr {
        match self {
            FieldKind::Boxed(_) => AttrRepr::Boxed,
            FieldKind::Tagged => AttrRepr::Tagged,
            FieldKind::Bool => AttrRepr::Bool,
            FieldKind::Float => AttrRepr::Float,
            FieldKind::Int16 => AttrRepr::Int16,
            FieldKind::Int32 => AttrRepr::Int32,
            FieldKind::Int64 => AttrRepr::Int64,
        }
    }
}

/// Failure to lay out a class.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error("instance of '{class}' is too large ({size} bytes)")]
    TooLarge { class: String, size: usize },
}

#[derive(Clone, Copy, Debug)]
struct FieldSpec {
    name: &'static str,
    kind: FieldKind,
    flags: AttrFlags,
}

/// Builder for a [`NativeClass`].
#[derive(Clone, Debug)]
pub struct LayoutBuilder {
    name: String,
    fields: SmallVec<[FieldSpec; 8]>,
}

impl LayoutBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        LayoutBuilder {
            name: name.into(),
            fields: SmallVec::new(),
        }
    }

    /// Append an attribute.
    #[must_use]
    pub fn field(mut self, name: &'static str, kind: FieldKind, flags: AttrFlags) -> Self {
        self.fields.push(FieldSpec { name, kind, flags });
        self
    }

    /// Assign offsets and bitmap bits, then validate the result.
    #[tracing::instrument(level = "debug", skip_all, fields(class = %self.name, count = self.fields.len()))]
    pub fn build(self) -> Result<NativeClass, LayoutError> {
        let bitmap_attrs = self
            .fields
            .iter()
            .filter(|f| f.kind.repr().uses_bitmap())
            .count();
        let words = bitmap_attrs.div_ceil(BITS_PER_WORD as usize);
        let word_size = std::mem::size_of::<u32>();
        let bitmap_words: SmallVec<[usize; 2]> =
            (0..words).map(|i| HEADER_SIZE + word_size * i).collect();

        let mut offset = HEADER_SIZE + word_size * words;
        let mut next_bit: u32 = 0;
        let mut take_bit = || {
            let word = HEADER_SIZE + word_size * (next_bit / BITS_PER_WORD) as usize;
            let bit = BitmapRef::bit(word, next_bit % BITS_PER_WORD);
            next_bit += 1;
            bit
        };

        let mut descriptors = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let repr = field.kind.repr();
            offset = offset.next_multiple_of(repr.align());
            let mut desc = match field.kind {
                FieldKind::Boxed(ty) => AttrDescriptor::boxed(field.name, offset, ty),
                FieldKind::Tagged => AttrDescriptor::tagged(field.name, offset),
                FieldKind::Bool => AttrDescriptor::boolean(field.name, offset),
                FieldKind::Float => AttrDescriptor::float(field.name, offset, take_bit()),
                FieldKind::Int16 => AttrDescriptor::int16(field.name, offset, take_bit()),
                FieldKind::Int32 => AttrDescriptor::int32(field.name, offset, take_bit()),
                FieldKind::Int64 => AttrDescriptor::int64(field.name, offset, take_bit()),
            };
            desc.flags = field.flags;
            descriptors.push(desc);
            offset += repr.size();
        }

        let size = offset.next_multiple_of(HEADER_SIZE);
        let layout = Layout::from_size_align(size, HEADER_SIZE).map_err(|_| LayoutError::TooLarge {
            class: self.name.clone(),
            size,
        })?;
        let attrs = ClassAttrs::new(&self.name, size, &descriptors)?;
        tracing::debug!(size, bitmap_words = words, "native class laid out");

        Ok(NativeClass {
            attrs,
            bitmap_words,
            layout,
        })
    }
}

/// A laid-out native class.
#[derive(Clone, Debug)]
pub struct NativeClass {
    attrs: ClassAttrs,
    bitmap_words: SmallVec<[usize; 2]>,
    layout: Layout,
}

impl NativeClass {
    pub fn name(&self) -> &str {
        self.attrs.type_name()
    }

    pub fn attrs(&self) -> &ClassAttrs {
        &self.attrs
    }

    /// Descriptor of attribute `name`, if the class has one.
    pub fn descriptor(&self, name: &str) -> Option<&AttrDescriptor> {
        self.attrs.descriptor(name)
    }

    /// Offsets of the bitmap words.
    pub fn bitmap_words(&self) -> &[usize] {
        &self.bitmap_words
    }

    /// Instance record size in bytes.
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub(crate) fn layout(&self) -> Layout {
        self.layout
    }
}
