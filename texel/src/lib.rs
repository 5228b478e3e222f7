// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `arrayview` developers
//! # Shared element buffers
//!
//! Reference counted byte allocations that may be aliased by any number of images and array
//! views at the same time, together with the descriptors that interpret them.
//!
//! This library is strictly `no_std`. It does not know about pixel types or images, only about:
//!
//! - [`ElementKind`], the scalar numeric types a buffer element may have.
//! - [`LifetimeOwner`], a handle that keeps an allocation alive for as long as any image or view
//!   refers to it, and frees it exactly once afterwards.
//! - [`Descriptor`], the element kind, extents and byte strides of a region of a buffer, and the
//!   translation from an image's axis order into the conventional array indexing order.
//! - [`StridedRef`], copies between differently strided regions.
//!
//! ## Usage
//!
//! ```
//! use arrayview_texel::{Descriptor, ElementKind, LifetimeOwner, StridedRef};
//!
//! // A 4 wide and 5 high image of `i32`.
//! let desc = Descriptor::from_native_axes(ElementKind::I32, 1, &[4, 5]).unwrap();
//! assert_eq!(desc.extents(), &[5, 4]);
//!
//! let image_bytes = LifetimeOwner::new(desc.byte_len());
//! let view = image_bytes.clone();
//!
//! // Pixel (2, 3) of the image is element [3, 2] of the view.
//! image_bytes.store(desc.offset_of(&[3, 2]).unwrap(), 17i32).unwrap();
//! assert_eq!(view.load::<i32>(desc.offset_of(&[3, 2]).unwrap()), Some(17));
//!
//! // A copy no longer aliases.
//! let (copy, _) = StridedRef::new(&view, &desc).unwrap().to_independent().unwrap();
//! view.store(desc.offset_of(&[3, 2]).unwrap(), -5i32).unwrap();
//! assert_eq!(copy.load::<i32>(desc.offset_of(&[3, 2]).unwrap()), Some(17));
//! ```
// Be std for tests and doctests, avoids a weird warning about missing allocator.
#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]
extern crate alloc;

mod buf;
mod descriptor;
mod element;
mod stride;

pub use self::buf::LifetimeOwner;
pub use self::descriptor::{BadDescriptorError, Descriptor, ElementOffsets};
pub use self::element::{Element, ElementKind};
pub use self::stride::StridedRef;
