// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `arrayview` developers
//! Shape, strides and element type of a region of a shared buffer.
use alloc::vec::Vec;
use core::{fmt, ops::Range};

use crate::element::ElementKind;

/// Describes how to interpret a region of bytes as a dense N-dimensional array.
///
/// The axes are in the conventional array indexing order: axis 0 varies slowest. Strides are
/// given in bytes. When `components` is larger than one then the last axis enumerates the
/// components of a multi-component pixel and has exactly that length.
///
/// The invariants are that every stride and the offset are multiples of the element size, and
/// that the byte past the last element is expressible on the current architecture. All element
/// offsets computed from a descriptor are thus aligned for access as the element kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Descriptor {
    element: ElementKind,
    components: usize,
    extents: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
}

/// Error that occurs when a descriptor can not be constructed.
#[derive(Debug)]
pub struct BadDescriptorError {
    kind: BadDescriptorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BadDescriptorKind {
    NoAxes,
    NoComponents,
    ComponentAxis,
    RankMismatch,
    UnalignedOffset,
    UnalignedStride,
    OutOfMemory,
    ShapeMismatch,
    OutOfBounds,
}

/// Byte offsets of all elements of a descriptor, in row-major index order.
///
/// Created by [`Descriptor::element_offsets`].
pub struct ElementOffsets<'desc> {
    descriptor: &'desc Descriptor,
    index: Vec<usize>,
    current: usize,
    remaining: usize,
}

impl Descriptor {
    /// A packed, row-major descriptor at offset zero.
    ///
    /// The last axis varies fastest and has a stride of the element size. If `components` is
    /// larger than one then the last extent must be equal to it.
    pub fn row_major(
        element: ElementKind,
        components: usize,
        extents: Vec<usize>,
    ) -> Result<Self, BadDescriptorError> {
        let strides = Self::packed_strides(element, &extents).ok_or(BadDescriptorKind::OutOfMemory)?;
        Self::with_strides(element, components, extents, strides, 0)
    }

    /// Translate the axes of an image into a row-major descriptor.
    ///
    /// Images address their pixels with the fastest varying axis first, arrays index with the
    /// slowest varying axis first. The extents are thus reversed. When there is more than one
    /// component per pixel, then an axis enumerating those components is appended. It is always
    /// the last axis and never takes part in the reversal.
    ///
    /// ```
    /// use arrayview_texel::{Descriptor, ElementKind};
    ///
    /// // A 3 wide, 4 high image of 2-vectors.
    /// let desc = Descriptor::from_native_axes(ElementKind::F32, 2, &[3, 4]).unwrap();
    /// assert_eq!(desc.extents(), &[4, 3, 2]);
    /// assert_eq!(desc.strides(), &[24, 8, 4]);
    /// ```
    pub fn from_native_axes(
        element: ElementKind,
        components: usize,
        native: &[usize],
    ) -> Result<Self, BadDescriptorError> {
        if native.is_empty() {
            return Err(BadDescriptorKind::NoAxes.into());
        }

        if components == 0 {
            return Err(BadDescriptorKind::NoComponents.into());
        }

        let mut extents: Vec<usize> = native.iter().rev().copied().collect();
        if components > 1 {
            extents.push(components);
        }

        Self::row_major(element, components, extents)
    }

    /// Construct a descriptor with arbitrary strides.
    pub fn with_strides(
        element: ElementKind,
        components: usize,
        extents: Vec<usize>,
        strides: Vec<usize>,
        offset: usize,
    ) -> Result<Self, BadDescriptorError> {
        if components == 0 {
            return Err(BadDescriptorKind::NoComponents.into());
        }

        if components > 1 && extents.last() != Some(&components) {
            return Err(BadDescriptorKind::ComponentAxis.into());
        }

        if extents.len() != strides.len() {
            return Err(BadDescriptorKind::RankMismatch.into());
        }

        if offset % element.size() != 0 {
            return Err(BadDescriptorKind::UnalignedOffset.into());
        }

        if strides.iter().any(|stride| stride % element.size() != 0) {
            return Err(BadDescriptorKind::UnalignedStride.into());
        }

        let descriptor = Descriptor {
            element,
            components,
            extents,
            strides,
            offset,
        };

        descriptor.end().ok_or(BadDescriptorKind::OutOfMemory)?;
        Ok(descriptor)
    }

    /// Undo the translation of [`Self::from_native_axes`].
    ///
    /// Returns the image extents, fastest axis first, and the number of components per pixel.
    pub fn to_native_axes(&self) -> (Vec<usize>, usize) {
        let spatial = if self.components > 1 {
            &self.extents[..self.extents.len() - 1]
        } else {
            &self.extents[..]
        };

        (spatial.iter().rev().copied().collect(), self.components)
    }

    /// Regard the last axis as enumerating the components of each pixel.
    pub fn with_trailing_components(mut self) -> Result<Self, BadDescriptorError> {
        match self.extents.last() {
            Some(&0) => Err(BadDescriptorKind::NoComponents.into()),
            Some(&components) => {
                self.components = components;
                Ok(self)
            }
            None => Err(BadDescriptorKind::NoAxes.into()),
        }
    }

    /// Regard every axis as spatial, with one component per pixel.
    pub fn into_scalar(mut self) -> Self {
        self.components = 1;
        self
    }

    pub fn element(&self) -> ElementKind {
        self.element
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Byte strides of each axis.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Byte offset of the first element.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// The number of elements, the product of all extents.
    pub fn element_count(&self) -> usize {
        if self.extents.contains(&0) {
            return 0;
        }

        // Zero strides may repeat a single element arbitrarily often.
        self.extents
            .iter()
            .try_fold(1usize, |count, &extent| count.checked_mul(extent))
            .unwrap_or(usize::MAX)
    }

    /// The number of bytes of all elements, if packed.
    pub fn byte_len(&self) -> usize {
        self.element_count().saturating_mul(self.element.size())
    }

    /// The number of bytes a buffer must have to contain all elements.
    pub fn required_len(&self) -> usize {
        // Validated in the constructor.
        self.end().unwrap_or(usize::MAX)
    }

    /// Check if elements are packed in row-major order.
    ///
    /// Axes with a length of one do not matter for this, their stride is never used. The offset
    /// also does not matter, the region may start anywhere in a buffer.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = self.element.size();
        for (&extent, &stride) in self.extents.iter().zip(&self.strides).rev() {
            if extent != 1 && stride != expected {
                return false;
            }

            expected *= extent;
        }

        true
    }

    /// The byte offset of an element.
    ///
    /// Returns `None` if the index does not have one coordinate per axis or if any coordinate is
    /// out of bounds.
    pub fn offset_of(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.rank() {
            return None;
        }

        let mut offset = self.offset;
        for ((&idx, &extent), &stride) in index.iter().zip(&self.extents).zip(&self.strides) {
            if idx >= extent {
                return None;
            }

            offset += idx * stride;
        }

        Some(offset)
    }

    /// Iterate over the byte offset of each element, in row-major index order.
    pub fn element_offsets(&self) -> ElementOffsets<'_> {
        ElementOffsets {
            descriptor: self,
            index: alloc::vec![0; self.rank()],
            current: self.offset,
            remaining: self.element_count(),
        }
    }

    /// Restrict one axis to a range of indices.
    ///
    /// The result describes a subset of the same bytes.
    pub fn slice_axis(&self, axis: usize, range: Range<usize>) -> Option<Self> {
        let extent = *self.extents.get(axis)?;
        if range.start > range.end || range.end > extent {
            return None;
        }

        let mut sliced = self.clone();
        let len = range.end - range.start;
        if len > 0 {
            sliced.offset += range.start * self.strides[axis];
        }

        sliced.extents[axis] = len;
        if self.is_component_axis(axis) {
            sliced.components = len.max(1);
        }

        Some(sliced)
    }

    /// Fix one axis to a single index, removing that axis.
    pub fn index_axis(&self, axis: usize, index: usize) -> Option<Self> {
        if index >= *self.extents.get(axis)? {
            return None;
        }

        let mut indexed = self.clone();
        indexed.offset += index * self.strides[axis];
        indexed.extents.remove(axis);
        indexed.strides.remove(axis);
        if self.is_component_axis(axis) {
            indexed.components = 1;
        }

        Some(indexed)
    }

    /// Describe the same elements with different extents.
    ///
    /// Only possible for contiguous descriptors and when the number of elements stays the same.
    pub fn reshape(&self, extents: Vec<usize>) -> Option<Self> {
        let count = extents
            .iter()
            .try_fold(1usize, |count, &extent| count.checked_mul(extent))?;
        if !self.is_contiguous() || count != self.element_count() {
            return None;
        }

        let strides = Self::packed_strides(self.element, &extents)?;
        let components = match extents.last() {
            Some(&last) if last == self.components => self.components,
            _ => 1,
        };

        Some(Descriptor {
            components,
            extents,
            strides,
            ..self.clone()
        })
    }

    /// Describe the same bytes as elements of another kind.
    ///
    /// The descriptor must be contiguous and the bytes of the last axis must be divisible into
    /// the new elements. The last extent is scaled accordingly.
    pub fn reinterpret(&self, element: ElementKind) -> Option<Self> {
        if !self.is_contiguous() || self.offset % element.size() != 0 {
            return None;
        }

        let mut extents = self.extents.clone();
        let last = extents.last_mut()?;
        let bytes = *last * self.element.size();
        if bytes % element.size() != 0 {
            return None;
        }

        *last = bytes / element.size();
        let strides = Self::packed_strides(element, &extents)?;

        Some(Descriptor {
            element,
            components: 1,
            extents,
            strides,
            offset: self.offset,
        })
    }

    /// Check if two descriptors have the same shape and element kind, ignoring strides.
    pub fn matches(&self, other: &Self) -> bool {
        self.element == other.element && self.extents == other.extents
    }

    fn is_component_axis(&self, axis: usize) -> bool {
        self.components > 1 && axis + 1 == self.rank()
    }

    fn packed_strides(element: ElementKind, extents: &[usize]) -> Option<Vec<usize>> {
        let mut strides = alloc::vec![0; extents.len()];
        let mut stride = element.size();
        for (slot, &extent) in strides.iter_mut().zip(extents).rev() {
            *slot = stride;
            stride = stride.checked_mul(extent)?;
        }

        Some(strides)
    }

    fn end(&self) -> Option<usize> {
        if self.extents.contains(&0) {
            return Some(self.offset);
        }

        let mut relative_past_end = self.element.size();
        for (&extent, &stride) in self.extents.iter().zip(&self.strides) {
            let max_offset = (extent - 1).checked_mul(stride)?;
            relative_past_end = relative_past_end.checked_add(max_offset)?;
        }

        relative_past_end.checked_add(self.offset)
    }
}

impl Iterator for ElementOffsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;
        let offset = self.current;
        if self.remaining == 0 {
            return Some(offset);
        }

        // Intermediate values may leave the range of `usize` while carrying, the next offset
        // never does.
        let desc = self.descriptor;
        for axis in (0..desc.rank()).rev() {
            self.index[axis] += 1;
            self.current = self.current.wrapping_add(desc.strides[axis]);
            if self.index[axis] < desc.extents[axis] {
                break;
            }

            // Wrap around, carry into the next slower axis.
            let span = desc.strides[axis].wrapping_mul(desc.extents[axis]);
            self.current = self.current.wrapping_sub(span);
            self.index[axis] = 0;
        }

        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ElementOffsets<'_> {}

impl BadDescriptorError {
    pub(crate) fn shape_mismatch() -> Self {
        BadDescriptorKind::ShapeMismatch.into()
    }

    pub(crate) fn out_of_bounds() -> Self {
        BadDescriptorKind::OutOfBounds.into()
    }
}

impl From<BadDescriptorKind> for BadDescriptorError {
    fn from(kind: BadDescriptorKind) -> Self {
        BadDescriptorError { kind }
    }
}

impl fmt::Display for BadDescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self.kind {
            BadDescriptorKind::NoAxes => "descriptor has no axes",
            BadDescriptorKind::NoComponents => "pixels must have at least one component",
            BadDescriptorKind::ComponentAxis => "last axis does not enumerate the components",
            BadDescriptorKind::RankMismatch => "number of strides and extents differ",
            BadDescriptorKind::UnalignedOffset => "offset is not a multiple of the element size",
            BadDescriptorKind::UnalignedStride => "stride is not a multiple of the element size",
            BadDescriptorKind::OutOfMemory => "descriptor does not fit into memory",
            BadDescriptorKind::ShapeMismatch => "descriptors differ in shape or element kind",
            BadDescriptorKind::OutOfBounds => "descriptor exceeds its buffer",
        })
    }
}

impl core::error::Error for BadDescriptorError {}
