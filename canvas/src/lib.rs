//! Images and array views over one shared buffer.
//!
//! An [`Image`] addresses its pixels with the fastest varying axis first, like a raster. An
//! [`ArrayView`] indexes elements with the slowest varying axis first, like a matrix. Both can
//! be presented as the other without copying a single byte:
//!
//! 1. [`array_view_from_image`] gives an array whose shape is the image size reversed, with the
//!    components of vector pixels as an additional last axis.
//! 2. [`image_from_array`] gives an image over the bytes of a contiguous array.
//!
//! The bytes are kept alive by a reference counted [`LifetimeOwner`](layout::LifetimeOwner).
//! Every image and every view is one holder, and the buffer is released exactly once, when the
//! last of them is dropped.
//!
//! # Usage
//!
//! ```
//! use arrayview_canvas::{array_view_from_image, image_from_array};
//! use arrayview_canvas::{Image, ImportOptions, PixelId, ViewOptions};
//!
//! // A 3 wide and 4 high image of 2-vectors.
//! let mut image = Image::new(&[3, 4], PixelId::VectorFloat32)?;
//! image.set_pixel_vector(&[1, 2], &[1.0f32, 2.0])?;
//!
//! let view = array_view_from_image(&image, ViewOptions::default().writable())?;
//! assert_eq!(view.shape(), &[4, 3, 2]);
//! assert_eq!(view.lane::<f32>(&[2, 1])?, [1.0, 2.0]);
//!
//! // The view keeps the pixels alive on its own.
//! drop(image);
//! let image = image_from_array(&view, ImportOptions::default())?;
//! assert_eq!(image.buffer_address(), view.address());
//! assert_eq!(image.size(), &[3, 4]);
//! assert_eq!(image.get_pixel_vector::<f32>(&[1, 2])?, [1.0, 2.0]);
//! # Ok::<_, arrayview_canvas::BridgeError>(())
//! ```
//!
//! Writes are visible on both sides. Views are read-only unless requested otherwise, and images
//! of read-only views are copies. Copying is always available through [`ViewOptions::copied`]
//! or [`array_from_image`].
#![deny(unsafe_code)]

/// Sharing buffers between images and views.
mod bridge;
/// The copying fallback.
mod copy;
mod error;
mod image;
mod options;
mod pixel;
mod view;


pub use self::bridge::{array_view_from_image, compute_descriptor, image_from_array, image_from_buffer};
pub use self::copy::{array_from_image, bytes_from_image, copy_in, copy_into_image, copy_out};
pub use self::error::BridgeError;
pub use self::image::Image;
pub use self::options::{ImportOptions, ViewOptions};
pub use self::pixel::PixelId;
pub use self::view::ArrayView;

pub mod layout {
    pub use arrayview_texel::{
        BadDescriptorError, Descriptor, Element, ElementKind, ElementOffsets, LifetimeOwner,
    };
}
