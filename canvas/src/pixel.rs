//! The catalog of image pixel types.
use core::fmt;

use arrayview_texel::ElementKind;

/// The type of the pixels of an [`Image`](crate::Image).
///
/// Scalar and vector types have a direct array element type. The other encodings are valid image
/// pixels but either can not be represented by a dense array of numbers at all, or only by
/// unpacking them into a copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelId {
    /// A single 8-bit integer.
    UInt8,
    /// A single 8-bit signed integer.
    Int8,
    /// A single 16-bit integer.
    UInt16,
    /// A single 16-bit signed integer.
    Int16,
    /// A single 32-bit integer.
    UInt32,
    /// A single 32-bit signed integer.
    Int32,
    /// A single 64-bit integer.
    UInt64,
    /// A single 64-bit signed integer.
    Int64,
    /// A single float.
    Float32,
    /// A single double.
    Float64,
    /// A complex number of two floats, real part first.
    ComplexFloat32,
    /// A complex number of two doubles, real part first.
    ComplexFloat64,
    /// Any number of 8-bit integers.
    VectorUInt8,
    /// Any number of 8-bit signed integers.
    VectorInt8,
    /// Any number of 16-bit integers.
    VectorUInt16,
    /// Any number of 16-bit signed integers.
    VectorInt16,
    /// Any number of 32-bit integers.
    VectorUInt32,
    /// Any number of 32-bit signed integers.
    VectorInt32,
    /// Any number of 64-bit integers.
    VectorUInt64,
    /// Any number of 64-bit signed integers.
    VectorInt64,
    /// Any number of floats.
    VectorFloat32,
    /// Any number of doubles.
    VectorFloat64,
    /// An 8-bit label of a segmentation map.
    LabelUInt8,
    /// A 16-bit label of a segmentation map.
    LabelUInt16,
    /// A 32-bit label of a segmentation map.
    LabelUInt32,
    /// A 64-bit label of a segmentation map.
    LabelUInt64,
    /// A single bit, packed eight pixels to a byte, least significant bit first.
    Bit,
}

impl PixelId {
    /// The array element type of each component.
    ///
    /// Complex numbers and labels have no such type. A bit is presented as an `u8` that is either
    /// zero or one, but only after unpacking it, see [`Self::has_stable_layout`].
    pub const fn element(self) -> Option<ElementKind> {
        use ElementKind::*;
        Some(match self {
            PixelId::UInt8 | PixelId::VectorUInt8 | PixelId::Bit => U8,
            PixelId::Int8 | PixelId::VectorInt8 => I8,
            PixelId::UInt16 | PixelId::VectorUInt16 => U16,
            PixelId::Int16 | PixelId::VectorInt16 => I16,
            PixelId::UInt32 | PixelId::VectorUInt32 => U32,
            PixelId::Int32 | PixelId::VectorInt32 => I32,
            PixelId::UInt64 | PixelId::VectorUInt64 => U64,
            PixelId::Int64 | PixelId::VectorInt64 => I64,
            PixelId::Float32 | PixelId::VectorFloat32 => F32,
            PixelId::Float64 | PixelId::VectorFloat64 => F64,
            PixelId::ComplexFloat32
            | PixelId::ComplexFloat64
            | PixelId::LabelUInt8
            | PixelId::LabelUInt16
            | PixelId::LabelUInt32
            | PixelId::LabelUInt64 => return None,
        })
    }

    /// How the pixel is stored in an image buffer.
    ///
    /// Returns the kind of each stored element and how many of them make up one component. For
    /// [`PixelId::Bit`] this is the byte that holds eight pixels.
    pub(crate) const fn storage(self) -> (ElementKind, usize) {
        match self {
            PixelId::ComplexFloat32 => (ElementKind::F32, 2),
            PixelId::ComplexFloat64 => (ElementKind::F64, 2),
            PixelId::LabelUInt8 => (ElementKind::U8, 1),
            PixelId::LabelUInt16 => (ElementKind::U16, 1),
            PixelId::LabelUInt32 => (ElementKind::U32, 1),
            PixelId::LabelUInt64 => (ElementKind::U64, 1),
            other => match other.element() {
                Some(element) => (element, 1),
                None => (ElementKind::U8, 1),
            },
        }
    }

    /// Check if the buffer of such an image is exactly a dense array of its elements.
    ///
    /// Only then may an array view share the image's bytes.
    pub const fn has_stable_layout(self) -> bool {
        !matches!(self, PixelId::Bit)
    }

    /// Check if pixels may have any number of components.
    pub const fn is_vector(self) -> bool {
        matches!(
            self,
            PixelId::VectorUInt8
                | PixelId::VectorInt8
                | PixelId::VectorUInt16
                | PixelId::VectorInt16
                | PixelId::VectorUInt32
                | PixelId::VectorInt32
                | PixelId::VectorUInt64
                | PixelId::VectorInt64
                | PixelId::VectorFloat32
                | PixelId::VectorFloat64
        )
    }

    /// The pixel type of an image built from an array of some element kind.
    pub const fn from_element(element: ElementKind, vector: bool) -> Self {
        use ElementKind::*;
        match (element, vector) {
            (U8, false) => PixelId::UInt8,
            (I8, false) => PixelId::Int8,
            (U16, false) => PixelId::UInt16,
            (I16, false) => PixelId::Int16,
            (U32, false) => PixelId::UInt32,
            (I32, false) => PixelId::Int32,
            (U64, false) => PixelId::UInt64,
            (I64, false) => PixelId::Int64,
            (F32, false) => PixelId::Float32,
            (F64, false) => PixelId::Float64,
            (U8, true) => PixelId::VectorUInt8,
            (I8, true) => PixelId::VectorInt8,
            (U16, true) => PixelId::VectorUInt16,
            (I16, true) => PixelId::VectorInt16,
            (U32, true) => PixelId::VectorUInt32,
            (I32, true) => PixelId::VectorInt32,
            (U64, true) => PixelId::VectorUInt64,
            (I64, true) => PixelId::VectorInt64,
            (F32, true) => PixelId::VectorFloat32,
            (F64, true) => PixelId::VectorFloat64,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PixelId::UInt8 => "8-bit unsigned integer",
            PixelId::Int8 => "8-bit signed integer",
            PixelId::UInt16 => "16-bit unsigned integer",
            PixelId::Int16 => "16-bit signed integer",
            PixelId::UInt32 => "32-bit unsigned integer",
            PixelId::Int32 => "32-bit signed integer",
            PixelId::UInt64 => "64-bit unsigned integer",
            PixelId::Int64 => "64-bit signed integer",
            PixelId::Float32 => "32-bit float",
            PixelId::Float64 => "64-bit float",
            PixelId::ComplexFloat32 => "complex of 32-bit float",
            PixelId::ComplexFloat64 => "complex of 64-bit float",
            PixelId::VectorUInt8 => "vector of 8-bit unsigned integer",
            PixelId::VectorInt8 => "vector of 8-bit signed integer",
            PixelId::VectorUInt16 => "vector of 16-bit unsigned integer",
            PixelId::VectorInt16 => "vector of 16-bit signed integer",
            PixelId::VectorUInt32 => "vector of 32-bit unsigned integer",
            PixelId::VectorInt32 => "vector of 32-bit signed integer",
            PixelId::VectorUInt64 => "vector of 64-bit unsigned integer",
            PixelId::VectorInt64 => "vector of 64-bit signed integer",
            PixelId::VectorFloat32 => "vector of 32-bit float",
            PixelId::VectorFloat64 => "vector of 64-bit float",
            PixelId::LabelUInt8 => "label of 8-bit unsigned integer",
            PixelId::LabelUInt16 => "label of 16-bit unsigned integer",
            PixelId::LabelUInt32 => "label of 32-bit unsigned integer",
            PixelId::LabelUInt64 => "label of 64-bit unsigned integer",
            PixelId::Bit => "packed bit",
        }
    }
}

impl fmt::Display for PixelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
