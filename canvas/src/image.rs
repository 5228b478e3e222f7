//! The image, a pixel buffer addressed with its fastest axis first.
use arrayview_texel::{Descriptor, Element, ElementKind, LifetimeOwner};
use log::trace;
use sha1::{Digest, Sha1};

use crate::error::BridgeError;
use crate::pixel::PixelId;

/// An N-dimensional image.
///
/// The pixel at index `[i0, i1, …]` is stored at linear position `i0 + size[0] * (i1 + …)`, with
/// all components of a pixel adjacent. The bytes live in a [`LifetimeOwner`] that array views may
/// share, so the image is only one of potentially many holders of its buffer.
///
/// Cloning an image copies its pixels. To alias them, create an array view instead.
#[derive(Debug)]
pub struct Image {
    pixel: PixelId,
    size: Vec<usize>,
    components: usize,
    buffer: LifetimeOwner,
    /// Where the first pixel starts within the buffer.
    offset: usize,
}

impl Image {
    /// Allocate a zeroed image.
    ///
    /// Vector pixels get as many components as there are axes, every other pixel type has one.
    ///
    /// ```
    /// use arrayview_canvas::{Image, PixelId};
    ///
    /// let image = Image::new(&[4, 5], PixelId::VectorFloat32)?;
    /// assert_eq!(image.components_per_pixel(), 2);
    /// assert_eq!(image.buffer_byte_len(), 4 * 5 * 2 * 4);
    /// # Ok::<_, arrayview_canvas::BridgeError>(())
    /// ```
    pub fn new(size: &[usize], pixel: PixelId) -> Result<Self, BridgeError> {
        let components = if pixel.is_vector() { size.len() } else { 1 };
        Self::with_components(size, pixel, components)
    }

    /// Allocate a zeroed image with a chosen number of components per pixel.
    pub fn with_components(
        size: &[usize],
        pixel: PixelId,
        components: usize,
    ) -> Result<Self, BridgeError> {
        if size.len() < 2 {
            return Err(BridgeError::InvalidRank { rank: size.len() });
        }

        let valid = if pixel.is_vector() {
            components > 0
        } else {
            components == 1
        };

        if !valid {
            return Err(BridgeError::InvalidComponents { pixel, components });
        }

        let byte_len = Self::storage_len(pixel, components, size)?;
        Ok(Image {
            pixel,
            size: size.to_vec(),
            components,
            buffer: LifetimeOwner::new(byte_len),
            offset: 0,
        })
    }

    /// Assemble an image from validated parts.
    pub(crate) fn from_parts(
        pixel: PixelId,
        size: Vec<usize>,
        components: usize,
        buffer: LifetimeOwner,
        offset: usize,
    ) -> Self {
        trace!(
            "image of {} pixels at {:#x} now held {} times",
            pixel,
            buffer.address(),
            buffer.holders()
        );

        Image {
            pixel,
            size,
            components,
            buffer,
            offset,
        }
    }

    fn storage_len(pixel: PixelId, components: usize, size: &[usize]) -> Result<usize, BridgeError> {
        let (element, per_component) = pixel.storage();
        let components = components
            .checked_mul(per_component)
            .ok_or(BridgeError::InvalidComponents { pixel, components })?;
        let storage = Descriptor::from_native_axes(element, components, size)?;

        if pixel == PixelId::Bit {
            Ok(storage.element_count().div_ceil(8))
        } else {
            Ok(storage.byte_len())
        }
    }

    pub fn pixel_id(&self) -> PixelId {
        self.pixel
    }

    pub fn components_per_pixel(&self) -> usize {
        self.components
    }

    /// The extent of each axis, fastest varying first.
    pub fn size(&self) -> &[usize] {
        &self.size
    }

    pub fn dimension(&self) -> usize {
        self.size.len()
    }

    pub fn number_of_pixels(&self) -> usize {
        self.size.iter().product()
    }

    /// The shared buffer holding the pixels.
    ///
    /// Cloning it keeps the pixels alive independent of this image.
    pub fn lifetime_owner(&self) -> &LifetimeOwner {
        &self.buffer
    }

    /// The byte offset of the first pixel in the buffer.
    pub fn buffer_offset(&self) -> usize {
        self.offset
    }

    /// The address of the first pixel, for identity comparisons.
    pub fn buffer_address(&self) -> usize {
        self.buffer.address() + self.offset
    }

    /// The number of bytes occupied by all pixels.
    pub fn buffer_byte_len(&self) -> usize {
        // Validated when the image was created.
        Self::storage_len(self.pixel, self.components, &self.size).unwrap_or(0)
    }

    /// Replace the buffer of this image, returning the previous one.
    ///
    /// The new buffer must have exactly as many bytes as the pixels occupy. Views of the previous
    /// buffer are not affected and keep it alive for as long as they need it.
    pub fn attach_owner(&mut self, owner: LifetimeOwner) -> Result<LifetimeOwner, BridgeError> {
        let expected = self.buffer_byte_len();
        if owner.byte_len() != expected {
            return Err(BridgeError::ShapeMismatch {
                expected,
                found: owner.byte_len(),
            });
        }

        self.offset = 0;
        Ok(core::mem::replace(&mut self.buffer, owner))
    }

    /// Read a single component pixel.
    pub fn get_pixel<T: Element>(&self, index: &[usize]) -> Result<T, BridgeError> {
        self.check_element::<T>()?;
        self.check_scalar()?;
        let linear = self.linear_index(index)?;

        if self.pixel == PixelId::Bit {
            let bit = u8::from(self.read_bit(linear));
            return bytemuck::try_cast(bit).map_err(|_| self.element_mismatch::<T>());
        }

        self.load(linear, 0, index)
    }

    /// Write a single component pixel.
    ///
    /// For [`PixelId::Bit`] images every non-zero value sets the bit.
    pub fn set_pixel<T: Element>(&mut self, index: &[usize], value: T) -> Result<(), BridgeError> {
        self.check_element::<T>()?;
        self.check_scalar()?;
        let linear = self.linear_index(index)?;

        if self.pixel == PixelId::Bit {
            let set = bytemuck::bytes_of(&value).iter().any(|&byte| byte != 0);
            self.write_bit(linear, set);
            return Ok(());
        }

        self.store(linear, 0, value, index)
    }

    /// Read all components of a pixel.
    pub fn get_pixel_vector<T: Element>(&self, index: &[usize]) -> Result<Vec<T>, BridgeError> {
        if self.pixel == PixelId::Bit {
            return Ok(vec![self.get_pixel(index)?]);
        }

        self.check_element::<T>()?;
        let linear = self.linear_index(index)?;
        (0..self.components)
            .map(|component| self.load(linear, component, index))
            .collect()
    }

    /// Write all components of a pixel.
    pub fn set_pixel_vector<T: Element>(
        &mut self,
        index: &[usize],
        values: &[T],
    ) -> Result<(), BridgeError> {
        self.check_element::<T>()?;
        if values.len() != self.components {
            return Err(BridgeError::InvalidComponents {
                pixel: self.pixel,
                components: values.len(),
            });
        }

        if self.pixel == PixelId::Bit {
            return self.set_pixel(index, values[0]);
        }

        let linear = self.linear_index(index)?;
        for (component, &value) in values.iter().enumerate() {
            self.store(linear, component, value, index)?;
        }

        Ok(())
    }

    /// The SHA-1 digest of the pixel bytes.
    ///
    /// Two images with equal pixel types and sizes have equal contents if their hashes agree.
    pub fn content_hash(&self) -> [u8; 20] {
        let mut hasher = Sha1::new();
        hasher.update(self.to_bytes());
        let mut hash = [0; 20];
        hash.copy_from_slice(&hasher.finalize());
        hash
    }

    /// Copy the stored bytes of all pixels.
    ///
    /// Bit images return their packed representation here.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; self.buffer_byte_len()];
        // Validated when the image was created.
        let _ = self.buffer.read_bytes(self.offset, &mut bytes);
        bytes
    }

    pub(crate) fn read_bit(&self, linear: usize) -> bool {
        let byte: u8 = self.buffer.load(self.offset + linear / 8).unwrap_or(0);
        byte & (1 << (linear % 8)) != 0
    }

    /// Change one bit of a packed image.
    ///
    /// Other images may share the buffer, so the other bits of the byte are kept atomically.
    pub(crate) fn write_bit(&mut self, linear: usize, set: bool) {
        let at = self.offset + linear / 8;
        let mask = 1u8 << (linear % 8);
        let _ = self
            .buffer
            .update_byte(at, |byte| if set { byte | mask } else { byte & !mask });
    }

    fn element(&self) -> Result<ElementKind, BridgeError> {
        self.pixel
            .element()
            .ok_or(BridgeError::UnsupportedPixelKind(self.pixel))
    }

    fn check_element<T: Element>(&self) -> Result<(), BridgeError> {
        if self.element()?.is::<T>() {
            Ok(())
        } else {
            Err(self.element_mismatch::<T>())
        }
    }

    fn element_mismatch<T: Element>(&self) -> BridgeError {
        BridgeError::ElementMismatch {
            expected: T::KIND,
            found: self.pixel.storage().0,
        }
    }

    fn check_scalar(&self) -> Result<(), BridgeError> {
        if self.components == 1 {
            Ok(())
        } else {
            Err(BridgeError::InvalidComponents {
                pixel: self.pixel,
                components: self.components,
            })
        }
    }

    fn linear_index(&self, index: &[usize]) -> Result<usize, BridgeError> {
        let in_bounds = index.len() == self.size.len()
            && index.iter().zip(&self.size).all(|(&idx, &extent)| idx < extent);

        if !in_bounds {
            return Err(BridgeError::IndexOutOfBounds {
                index: index.to_vec(),
                extents: self.size.clone(),
            });
        }

        Ok(index
            .iter()
            .zip(&self.size)
            .rev()
            .fold(0, |linear, (&idx, &extent)| linear * extent + idx))
    }

    fn component_offset(&self, linear: usize, component: usize) -> usize {
        let size = self.pixel.storage().0.size();
        self.offset + (linear * self.components + component) * size
    }

    fn load<T: Element>(
        &self,
        linear: usize,
        component: usize,
        index: &[usize],
    ) -> Result<T, BridgeError> {
        self.buffer
            .load(self.component_offset(linear, component))
            .ok_or_else(|| self.out_of_bounds(index))
    }

    fn store<T: Element>(
        &self,
        linear: usize,
        component: usize,
        value: T,
        index: &[usize],
    ) -> Result<(), BridgeError> {
        self.buffer
            .store(self.component_offset(linear, component), value)
            .ok_or_else(|| self.out_of_bounds(index))
    }

    fn out_of_bounds(&self, index: &[usize]) -> BridgeError {
        BridgeError::IndexOutOfBounds {
            index: index.to_vec(),
            extents: self.size.clone(),
        }
    }
}

impl Clone for Image {
    fn clone(&self) -> Self {
        Image {
            pixel: self.pixel,
            size: self.size.clone(),
            components: self.components,
            buffer: LifetimeOwner::with_bytes(&self.to_bytes()),
            offset: 0,
        }
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        trace!(
            "image releases buffer at {:#x}, {} other holders",
            self.buffer.address(),
            self.buffer.holders() - 1
        );
    }
}
