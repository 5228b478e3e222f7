//! Conversions that copy, for layouts that can not be shared or when sharing is not wanted.
use arrayview_texel::{Descriptor, ElementKind, LifetimeOwner, StridedRef};

use crate::bridge::{image_descriptor, interpret};
use crate::error::BridgeError;
use crate::image::Image;
use crate::options::{ImportOptions, ViewOptions};
use crate::pixel::PixelId;
use crate::view::ArrayView;

/// Copy a region of a buffer into a new, packed and writable array.
pub fn copy_out(owner: &LifetimeOwner, descriptor: &Descriptor) -> Result<ArrayView, BridgeError> {
    let (copy, packed) = StridedRef::new(owner, descriptor)?.to_independent()?;
    Ok(ArrayView::new(copy, packed, true))
}

/// Copy the elements of an array into a new image.
///
/// The array is interpreted as by [`image_from_array`](crate::image_from_array), but the image
/// shares nothing with it.
pub fn copy_in(view: &ArrayView, options: &ImportOptions) -> Result<Image, BridgeError> {
    let interpretation = interpret(view.descriptor(), options)?;
    let (copy, _) = StridedRef::new(view.owner(), view.descriptor())?.to_independent()?;

    Ok(Image::from_parts(
        interpretation.pixel,
        interpretation.size,
        interpretation.components,
        copy,
        0,
    ))
}

pub(crate) fn copy_out_image(image: &Image, writable: bool) -> Result<ArrayView, BridgeError> {
    let descriptor = image_descriptor(image)?;

    let copy = if image.pixel_id() == PixelId::Bit {
        let unpacked = Descriptor::row_major(ElementKind::U8, 1, descriptor.extents().to_vec())?;
        ArrayView::new(LifetimeOwner::with_bytes(&unpack_bits(image)), unpacked, true)
    } else {
        copy_out(image.lifetime_owner(), &descriptor)?
    };

    Ok(if writable { copy } else { copy.read_only() })
}

/// A writable array holding a copy of the pixels of an image.
///
/// Works for every image with an array element type, including bit images which are unpacked
/// into one byte per pixel.
pub fn array_from_image(image: &Image) -> Result<ArrayView, BridgeError> {
    crate::array_view_from_image(image, ViewOptions::default().writable().copied())
}

/// The pixels of an image as bytes in array order.
///
/// Bit images are unpacked into one byte per pixel.
pub fn bytes_from_image(image: &Image) -> Result<Vec<u8>, BridgeError> {
    let descriptor = image_descriptor(image)?;

    if image.pixel_id() == PixelId::Bit {
        return Ok(unpack_bits(image));
    }

    Ok(StridedRef::new(image.lifetime_owner(), &descriptor)?.to_packed_bytes())
}

/// Overwrite all pixels of an image with the elements of an array.
///
/// The array must have the image's element type and exactly as many elements. If its shape
/// differs, it is read in row-major order, which requires it to be contiguous.
pub fn copy_into_image(image: &mut Image, view: &ArrayView) -> Result<(), BridgeError> {
    let target = image_descriptor(image)?;

    if view.element_kind() != target.element() {
        return Err(BridgeError::ElementMismatch {
            expected: target.element(),
            found: view.element_kind(),
        });
    }

    let mismatch = || BridgeError::ShapeMismatch {
        expected: target.byte_len(),
        found: view.descriptor().byte_len(),
    };

    if view.descriptor().byte_len() != target.byte_len() {
        return Err(mismatch());
    }

    let source = if view.descriptor().matches(&target) {
        view.descriptor().clone()
    } else {
        view.descriptor()
            .reshape(target.extents().to_vec())
            .ok_or_else(mismatch)?
    };

    if image.pixel_id() == PixelId::Bit {
        let owner = view.owner();
        for (linear, offset) in source.element_offsets().enumerate() {
            let value: u8 = owner.load(offset).unwrap_or(0);
            image.write_bit(linear, value != 0);
        }

        return Ok(());
    }

    let source = StridedRef::new(view.owner(), &source)?;
    source.copy_to(StridedRef::new(image.lifetime_owner(), &target)?)?;
    Ok(())
}

fn unpack_bits(image: &Image) -> Vec<u8> {
    (0..image.number_of_pixels())
        .map(|linear| u8::from(image.read_bit(linear)))
        .collect()
}
