// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `arrayview` developers
//! Strided copies between regions of shared buffers.
//!
//! The source and target may use arbitrary, different strides. The result is always as if
//! copying element by element in row-major index order of the common shape, except where
//! otherwise noted.
use alloc::vec::Vec;

use crate::buf::LifetimeOwner;
use crate::descriptor::{BadDescriptorError, Descriptor};

/// A region of a shared buffer, interpreted through a descriptor.
///
/// The invariant is that all elements of the descriptor lie within the buffer, so that every
/// offset produced by the descriptor can be accessed.
#[derive(Clone, Copy)]
pub struct StridedRef<'data> {
    owner: &'data LifetimeOwner,
    descriptor: &'data Descriptor,
}

impl<'data> StridedRef<'data> {
    /// View a buffer under a descriptor.
    ///
    /// Fails if the descriptor reaches past the end of the buffer.
    pub fn new(
        owner: &'data LifetimeOwner,
        descriptor: &'data Descriptor,
    ) -> Result<Self, BadDescriptorError> {
        if descriptor.element_count() > 0 && descriptor.required_len() > owner.byte_len() {
            return Err(BadDescriptorError::out_of_bounds());
        }

        Ok(StridedRef { owner, descriptor })
    }

    pub fn owner(&self) -> &'data LifetimeOwner {
        self.owner
    }

    pub fn descriptor(&self) -> &'data Descriptor {
        self.descriptor
    }

    /// Copy the elements to another region.
    ///
    /// The target must have the same extents and element kind. Regions of the same allocation
    /// must not overlap, otherwise the result is unspecified (but sound).
    pub fn copy_to(&self, target: StridedRef<'_>) -> Result<(), BadDescriptorError> {
        if !self.descriptor.matches(target.descriptor) {
            return Err(BadDescriptorError::shape_mismatch());
        }

        if self.descriptor.is_contiguous() && target.descriptor.is_contiguous() {
            let mut scratch = alloc::vec![0; self.descriptor.byte_len()];
            return Self::copy_run(
                self.owner,
                self.descriptor.offset(),
                target.owner,
                target.descriptor.offset(),
                &mut scratch,
            );
        }

        if let (Some((rows, len)), Some((target_rows, _))) = (self.rows(), target.rows()) {
            let mut scratch = alloc::vec![0; len];
            for (from, into) in rows.element_offsets().zip(target_rows.element_offsets()) {
                Self::copy_run(self.owner, from, target.owner, into, &mut scratch)?;
            }

            return Ok(());
        }

        let mut scratch = [0; 8];
        let scratch = &mut scratch[..self.descriptor.element().size()];
        let offsets = self.descriptor.element_offsets();
        for (from, into) in offsets.zip(target.descriptor.element_offsets()) {
            Self::copy_run(self.owner, from, target.owner, into, scratch)?;
        }

        Ok(())
    }

    /// Copy the elements into a new allocation, packed in row-major order.
    pub fn to_independent(&self) -> Result<(LifetimeOwner, Descriptor), BadDescriptorError> {
        let packed = Descriptor::row_major(
            self.descriptor.element(),
            self.descriptor.components(),
            self.descriptor.extents().to_vec(),
        )?;

        let owner = LifetimeOwner::new(packed.byte_len());
        self.copy_to(StridedRef::new(&owner, &packed)?)?;
        Ok((owner, packed))
    }

    /// Copy the elements into a byte vector, packed in row-major order.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let size = self.descriptor.element().size();
        let mut bytes = alloc::vec![0; self.descriptor.byte_len()];
        for (element, offset) in bytes
            .chunks_exact_mut(size)
            .zip(self.descriptor.element_offsets())
        {
            // Validated in the constructor.
            let _ = self.owner.read_bytes(offset, element);
        }

        bytes
    }

    /// Split into runs along the last axis, if elements are packed along it.
    ///
    /// Returns a descriptor of the first element of each run, and the byte length of a run.
    fn rows(&self) -> Option<(Descriptor, usize)> {
        let desc = self.descriptor;
        let last = desc.rank().checked_sub(1)?;
        let extent = desc.extents()[last];
        if extent > 1 && desc.strides()[last] != desc.element().size() {
            return None;
        }

        let rows = desc.index_axis(last, 0)?;
        Some((rows, extent * desc.element().size()))
    }

    fn copy_run(
        from: &LifetimeOwner,
        from_offset: usize,
        into: &LifetimeOwner,
        into_offset: usize,
        scratch: &mut [u8],
    ) -> Result<(), BadDescriptorError> {
        from.read_bytes(from_offset, scratch)
            .and_then(|()| into.write_bytes(into_offset, scratch))
            .ok_or_else(BadDescriptorError::out_of_bounds)
    }
}
