//! Strided array views of shared buffers.
use core::ops::Range;

use arrayview_texel::{Descriptor, Element, ElementKind, LifetimeOwner, StridedRef};
use log::trace;

use crate::error::BridgeError;

/// The buffer and the descriptor of a view.
#[derive(Clone, Debug)]
struct ViewData {
    owner: LifetimeOwner,
    descriptor: Descriptor,
}

/// An N-dimensional array indexed with the slowest varying axis first.
///
/// A view is a handle. Clones, slices and reshaped views refer to the same bytes, and so may
/// images created from them. A write through any of them is observed by all others.
///
/// Read-only views reject writes when they are attempted, not when the view is created. The
/// buffer of a view is not handed out, only compared:
///
/// ```compile_fail
/// # use arrayview_canvas::{array_view_from_image, Image, PixelId, ViewOptions};
/// let image = Image::new(&[2, 2], PixelId::UInt8)?;
/// let view = array_view_from_image(&image, ViewOptions::default())?;
/// view.owner().store(0, 1u8);
/// # Ok::<_, arrayview_canvas::BridgeError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ArrayView(Access);

#[derive(Clone, Debug)]
enum Access {
    Writable(ViewData),
    ReadOnly(ViewData),
}

impl ArrayView {
    /// Wrap a region that is known to lie within the buffer.
    pub(crate) fn new(owner: LifetimeOwner, descriptor: Descriptor, writable: bool) -> Self {
        let data = ViewData { owner, descriptor };
        ArrayView(if writable {
            Access::Writable(data)
        } else {
            Access::ReadOnly(data)
        })
    }

    /// View a region of a buffer.
    ///
    /// Fails if the descriptor reaches past the end of the buffer.
    pub fn from_parts(
        owner: LifetimeOwner,
        descriptor: Descriptor,
        writable: bool,
    ) -> Result<Self, BridgeError> {
        if StridedRef::new(&owner, &descriptor).is_err() {
            return Err(BridgeError::ShapeMismatch {
                expected: descriptor.required_len(),
                found: owner.byte_len(),
            });
        }

        Ok(Self::new(owner, descriptor, writable))
    }

    /// A writable array holding a copy of some elements, in row-major order.
    ///
    /// ```
    /// use arrayview_canvas::ArrayView;
    ///
    /// let view = ArrayView::from_elements(&[2, 3], &[0u8, 1, 2, 3, 4, 5])?;
    /// assert_eq!(view.get::<u8>(&[1, 0])?, 3);
    /// # Ok::<_, arrayview_canvas::BridgeError>(())
    /// ```
    pub fn from_elements<T: Element>(shape: &[usize], elements: &[T]) -> Result<Self, BridgeError> {
        let descriptor = Descriptor::row_major(T::KIND, 1, shape.to_vec())?;
        if descriptor.element_count() != elements.len() {
            return Err(BridgeError::ShapeMismatch {
                expected: descriptor.byte_len(),
                found: core::mem::size_of_val(elements),
            });
        }

        Ok(Self::new(
            LifetimeOwner::from_elements(elements),
            descriptor,
            true,
        ))
    }

    /// A writable, zeroed array.
    pub fn zeros(element: ElementKind, shape: &[usize]) -> Result<Self, BridgeError> {
        let descriptor = Descriptor::row_major(element, 1, shape.to_vec())?;
        let owner = LifetimeOwner::new(descriptor.byte_len());
        Ok(Self::new(owner, descriptor, true))
    }

    fn data(&self) -> &ViewData {
        match &self.0 {
            Access::Writable(data) | Access::ReadOnly(data) => data,
        }
    }

    pub(crate) fn owner(&self) -> &LifetimeOwner {
        &self.data().owner
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.data().descriptor
    }

    /// The number of images and views holding the buffer.
    pub fn holders(&self) -> usize {
        self.owner().holders()
    }

    /// Whether the view refers to the bytes of this buffer.
    pub fn shares_buffer_with(&self, owner: &LifetimeOwner) -> bool {
        self.owner().ptr_eq(owner)
    }

    /// The extent of each axis, slowest varying first.
    pub fn shape(&self) -> &[usize] {
        self.descriptor().extents()
    }

    /// The byte stride of each axis.
    pub fn strides(&self) -> &[usize] {
        self.descriptor().strides()
    }

    pub fn element_kind(&self) -> ElementKind {
        self.descriptor().element()
    }

    pub fn ndim(&self) -> usize {
        self.descriptor().rank()
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.descriptor().element_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.0, Access::Writable(_))
    }

    pub fn is_contiguous(&self) -> bool {
        self.descriptor().is_contiguous()
    }

    /// The address of the first element, for identity comparisons.
    pub fn address(&self) -> usize {
        self.owner().address() + self.descriptor().offset()
    }

    pub fn get<T: Element>(&self, index: &[usize]) -> Result<T, BridgeError> {
        self.check_element::<T>()?;
        let offset = self.offset_of(index)?;
        self.owner()
            .load(offset)
            .ok_or_else(|| self.out_of_bounds(index))
    }

    /// Write one element.
    ///
    /// Fails with [`BridgeError::ReadOnlyViolation`] on a read-only view.
    pub fn set<T: Element>(&self, index: &[usize], value: T) -> Result<(), BridgeError> {
        let Access::Writable(data) = &self.0 else {
            return Err(BridgeError::ReadOnlyViolation);
        };

        self.check_element::<T>()?;
        let offset = self.offset_of(index)?;
        data.owner
            .store(offset, value)
            .ok_or_else(|| self.out_of_bounds(index))
    }

    /// Read all elements along the last axis, with all other axes fixed.
    ///
    /// For the view of a vector image these are the components of one pixel.
    pub fn lane<T: Element>(&self, index: &[usize]) -> Result<Vec<T>, BridgeError> {
        self.check_element::<T>()?;
        if index.len() + 1 != self.ndim() {
            return Err(self.out_of_bounds(index));
        }

        let mut lane = self.descriptor().clone();
        for &idx in index {
            lane = lane
                .index_axis(0, idx)
                .ok_or_else(|| self.out_of_bounds(index))?;
        }

        self.load_all(&lane)
    }

    /// Read all elements in row-major order.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, BridgeError> {
        self.check_element::<T>()?;
        self.load_all(self.descriptor())
    }

    /// Copy all element bytes in row-major order.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Validated when the view was created.
        match StridedRef::new(self.owner(), self.descriptor()) {
            Ok(region) => region.to_packed_bytes(),
            Err(_) => Vec::new(),
        }
    }

    /// Restrict an axis to a range, sharing the same bytes.
    pub fn slice_axis(&self, axis: usize, range: Range<usize>) -> Result<Self, BridgeError> {
        let descriptor = self
            .descriptor()
            .slice_axis(axis, range.clone())
            .ok_or_else(|| self.out_of_bounds(&[range.start, range.end]))?;
        Ok(self.with_descriptor(descriptor))
    }

    /// Fix an axis to one index and remove it, sharing the same bytes.
    pub fn index_axis(&self, axis: usize, index: usize) -> Result<Self, BridgeError> {
        let descriptor = self
            .descriptor()
            .index_axis(axis, index)
            .ok_or_else(|| self.out_of_bounds(&[index]))?;
        Ok(self.with_descriptor(descriptor))
    }

    /// View the same elements with another shape.
    ///
    /// Only possible for contiguous views, copy others first.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self, BridgeError> {
        let descriptor = self.descriptor().reshape(shape.to_vec()).ok_or_else(|| {
            BridgeError::ShapeMismatch {
                expected: self.descriptor().byte_len(),
                found: shape
                    .iter()
                    .product::<usize>()
                    .saturating_mul(self.element_kind().size()),
            }
        })?;
        Ok(self.with_descriptor(descriptor))
    }

    /// View the same bytes as elements of another kind.
    ///
    /// The bytes along the last axis are split or merged into the new elements.
    pub fn reinterpret(&self, element: ElementKind) -> Result<Self, BridgeError> {
        let descriptor = self.descriptor().reinterpret(element).ok_or(
            BridgeError::ElementMismatch {
                expected: element,
                found: self.element_kind(),
            },
        )?;
        Ok(self.with_descriptor(descriptor))
    }

    /// The same bytes, but rejecting writes.
    pub fn read_only(&self) -> Self {
        ArrayView(Access::ReadOnly(self.data().clone()))
    }

    /// A writable copy that shares nothing with this view.
    pub fn to_owned_copy(&self) -> Result<Self, BridgeError> {
        crate::copy::copy_out(self.owner(), self.descriptor())
    }

    fn with_descriptor(&self, descriptor: Descriptor) -> Self {
        Self::new(self.owner().clone(), descriptor, self.is_writable())
    }

    fn check_element<T: Element>(&self) -> Result<(), BridgeError> {
        if self.element_kind().is::<T>() {
            Ok(())
        } else {
            Err(BridgeError::ElementMismatch {
                expected: T::KIND,
                found: self.element_kind(),
            })
        }
    }

    fn offset_of(&self, index: &[usize]) -> Result<usize, BridgeError> {
        self.descriptor()
            .offset_of(index)
            .ok_or_else(|| self.out_of_bounds(index))
    }

    fn load_all<T: Element>(&self, descriptor: &Descriptor) -> Result<Vec<T>, BridgeError> {
        descriptor
            .element_offsets()
            .map(|offset| {
                self.owner()
                    .load(offset)
                    .ok_or_else(|| self.out_of_bounds(&[]))
            })
            .collect()
    }

    fn out_of_bounds(&self, index: &[usize]) -> BridgeError {
        BridgeError::IndexOutOfBounds {
            index: index.to_vec(),
            extents: self.shape().to_vec(),
        }
    }
}

impl Drop for ViewData {
    fn drop(&mut self) {
        trace!(
            "view releases buffer at {:#x}, {} other holders",
            self.owner.address(),
            self.owner.holders() - 1
        );
    }
}
