//! Conversions that share a buffer between an image and an array view.
//!
//! Both directions hand out a new holder of the same [`LifetimeOwner`]. The buffer is released
//! when the last image or view referring to it is dropped, in whatever order that happens.
use arrayview_texel::{Descriptor, LifetimeOwner};
use log::debug;

use crate::copy;
use crate::error::BridgeError;
use crate::image::Image;
use crate::options::{ImportOptions, ViewOptions};
use crate::pixel::PixelId;
use crate::view::ArrayView;

/// How the axes of an array map onto an image.
pub(crate) struct Interpretation {
    pub(crate) pixel: PixelId,
    /// Fastest axis first.
    pub(crate) size: Vec<usize>,
    pub(crate) components: usize,
}

/// The descriptor of a packed image of some pixel type.
///
/// The `extents` are the image's size, fastest axis first. The result lists them in reverse,
/// followed by an axis of the components if there is more than one.
///
/// ```
/// use arrayview_canvas::{compute_descriptor, PixelId};
///
/// let desc = compute_descriptor(PixelId::Int32, 1, &[4, 5])?;
/// assert_eq!(desc.extents(), &[5, 4]);
/// assert_eq!(desc.strides(), &[16, 4]);
/// # Ok::<_, arrayview_canvas::BridgeError>(())
/// ```
pub fn compute_descriptor(
    pixel: PixelId,
    components: usize,
    extents: &[usize],
) -> Result<Descriptor, BridgeError> {
    let element = pixel
        .element()
        .ok_or(BridgeError::UnsupportedPixelKind(pixel))?;
    Ok(Descriptor::from_native_axes(element, components, extents)?)
}

/// The descriptor of the pixels of an image within its buffer.
///
/// For bit images this describes the unpacked bytes, which do not match the buffer.
pub(crate) fn image_descriptor(image: &Image) -> Result<Descriptor, BridgeError> {
    let packed = compute_descriptor(
        image.pixel_id(),
        image.components_per_pixel(),
        image.size(),
    )?;

    Ok(Descriptor::with_strides(
        packed.element(),
        packed.components(),
        packed.extents().to_vec(),
        packed.strides().to_vec(),
        image.buffer_offset(),
    )?)
}

/// Present an image as an array.
///
/// With `zero_copy` the view shares the image's buffer, and the buffer stays alive for as long
/// as the view does even if the image is dropped first. Otherwise the view holds a copy.
///
/// ```
/// use arrayview_canvas::{array_view_from_image, Image, PixelId, ViewOptions};
///
/// let mut image = Image::new(&[4, 5], PixelId::Int32)?;
/// image.set_pixel(&[2, 3], 17i32)?;
///
/// let view = array_view_from_image(&image, ViewOptions::default().writable())?;
/// assert_eq!(view.shape(), &[5, 4]);
/// assert_eq!(view.get::<i32>(&[3, 2])?, 17);
///
/// view.set(&[3, 2], -5i32)?;
/// assert_eq!(image.get_pixel::<i32>(&[2, 3])?, -5);
/// # Ok::<_, arrayview_canvas::BridgeError>(())
/// ```
pub fn array_view_from_image(
    image: &Image,
    options: ViewOptions,
) -> Result<ArrayView, BridgeError> {
    let descriptor = image_descriptor(image)?;

    if !options.zero_copy {
        debug!(
            "copying {} image of size {:?} into an array",
            image.pixel_id(),
            image.size()
        );
        return copy::copy_out_image(image, options.writable);
    }

    if !image.pixel_id().has_stable_layout() {
        return Err(BridgeError::UnviewableLayout(image.pixel_id()));
    }

    let owner = image.lifetime_owner().clone();
    debug!(
        "sharing {} bytes at {:#x} as {} view of shape {:?}",
        descriptor.byte_len(),
        image.buffer_address(),
        if options.writable { "writable" } else { "read-only" },
        descriptor.extents()
    );

    Ok(ArrayView::new(owner, descriptor, options.writable))
}

/// Present an array as an image.
///
/// With `zero_copy` the image adopts the array's buffer if the view is writable and the elements
/// are packed in row-major order. Images can always be written, so read-only views and arrays of
/// any other layout are copied, as are all arrays without `zero_copy`.
///
/// The last axis enumerates the components of vector pixels when the options ask for it or the
/// descriptor already marks it so. It also does when there are more axes than an image may have.
///
/// ```
/// use arrayview_canvas::{image_from_array, ArrayView, ImportOptions, PixelId};
///
/// let array = ArrayView::from_elements(&[2, 3], &[0f32, 1., 2., 3., 4., 5.])?;
/// let image = image_from_array(&array, ImportOptions::default())?;
/// assert_eq!(image.pixel_id(), PixelId::Float32);
/// assert_eq!(image.size(), &[3, 2]);
/// assert_eq!(image.buffer_address(), array.address());
/// # Ok::<_, arrayview_canvas::BridgeError>(())
/// ```
pub fn image_from_array(view: &ArrayView, options: ImportOptions) -> Result<Image, BridgeError> {
    let interpretation = interpret(view.descriptor(), &options)?;

    if !options.zero_copy {
        return copy::copy_in(view, &options);
    }

    if !view.is_writable() {
        debug!("array of shape {:?} is read-only, copying", view.shape());
        return copy::copy_in(view, &options);
    }

    if !view.is_contiguous() {
        debug!(
            "array of shape {:?} with strides {:?} is not contiguous, copying",
            view.shape(),
            view.strides()
        );
        return copy::copy_in(view, &options);
    }

    debug!(
        "adopting {} bytes at {:#x} as {} image of size {:?}",
        view.descriptor().byte_len(),
        view.address(),
        interpretation.pixel,
        interpretation.size
    );

    Ok(Image::from_parts(
        interpretation.pixel,
        interpretation.size,
        interpretation.components,
        view.owner().clone(),
        view.descriptor().offset(),
    ))
}

/// Present a buffer as an image.
///
/// The descriptor must account for exactly all bytes of the buffer. The image becomes another
/// holder of the buffer, so the caller may keep its own handle.
pub fn image_from_buffer(
    buffer: LifetimeOwner,
    descriptor: Descriptor,
    options: ImportOptions,
) -> Result<Image, BridgeError> {
    if descriptor.byte_len() != buffer.byte_len() {
        return Err(BridgeError::ShapeMismatch {
            expected: descriptor.byte_len(),
            found: buffer.byte_len(),
        });
    }

    let view = ArrayView::from_parts(buffer, descriptor, true)?;
    image_from_array(&view, options)
}

/// Decide the pixel type, size and components of an image of an array.
pub(crate) fn interpret(
    descriptor: &Descriptor,
    options: &ImportOptions,
) -> Result<Interpretation, BridgeError> {
    let extents = descriptor.extents();
    let vector = options.is_vector
        || descriptor.components() > 1
        || extents.len() > options.max_dimension;

    let spatial = match extents.split_last() {
        Some((_, spatial)) if vector => spatial,
        _ => extents,
    };

    if spatial.len() < 2 || spatial.len() > options.max_dimension {
        return Err(BridgeError::InvalidRank {
            rank: spatial.len(),
        });
    }

    let pixel = PixelId::from_element(descriptor.element(), vector);
    let layout = if vector {
        descriptor
            .clone()
            .with_trailing_components()
            .map_err(|_| BridgeError::InvalidComponents {
                pixel,
                components: 0,
            })?
    } else {
        descriptor.clone().into_scalar()
    };

    Ok(Interpretation {
        pixel,
        size: spatial.iter().rev().copied().collect(),
        components: layout.components(),
    })
}
