use arrayview_texel::{BadDescriptorError, ElementKind};

use crate::pixel::PixelId;

/// Error that occurs when converting between images and array views.
///
/// All conversions either succeed completely or fail without modifying any image, view or
/// buffer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BridgeError {
    /// The pixel type has no array element type.
    #[error("images of {0} pixels are not supported")]
    UnsupportedPixelKind(PixelId),
    /// The number of bytes of a buffer differs from what its shape requires.
    #[error("size mismatch of image and buffer: {expected} bytes required, {found} provided")]
    ShapeMismatch { expected: usize, found: usize },
    /// The pixels can not be shared without unpacking them. Retry with a copy.
    #[error("{0} pixels have no layout to share, request a copy instead")]
    UnviewableLayout(PixelId),
    /// A write through a view that was created read-only.
    #[error("the array view is read-only")]
    ReadOnlyViolation,
    /// An image can not have this number of spatial axes.
    #[error("an image can not have {rank} axes")]
    InvalidRank { rank: usize },
    /// A pixel type can not have this number of components.
    #[error("{pixel} pixels can not have {components} components")]
    InvalidComponents { pixel: PixelId, components: usize },
    #[error("index {index:?} is out of bounds for extents {extents:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        extents: Vec<usize>,
    },
    /// A typed access with a Rust type of another element kind.
    #[error("elements are {found}, not {expected}")]
    ElementMismatch {
        expected: ElementKind,
        found: ElementKind,
    },
    #[error(transparent)]
    BadDescriptor(#[from] BadDescriptorError),
}
