// Distributed under The MIT License (MIT)
//
// Copyright (c) 2024 The `arrayview` developers
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};
use core::{fmt, mem};

use crate::element::Element;

/// The unit of atomic access. Every element kind fits into one, see [`ElementKind::size`].
///
/// [`ElementKind::size`]: crate::ElementKind::size
const WORD: usize = mem::size_of::<u64>();

type Finalizer = Box<dyn FnOnce() + Send + Sync>;

/// A reference counted handle to a shared allocation of bytes.
///
/// Cloning the handle never copies any bytes, it only registers another holder of the same
/// allocation. The allocation is released precisely once, by whichever holder is dropped last,
/// no matter on which thread or in which order images and views referencing it go away. This is
/// the only piece of synchronization that views and images need among each other.
///
/// The bytes themselves are stored in atomic words. All reads and writes are performed with
/// relaxed atomic instructions, so that any number of holders may alias and mutate the bytes
/// concurrently. An individual element, accessed at an offset that is a multiple of its size, is
/// never torn. Accesses spanning multiple elements are not synchronized with each other; use an
/// external synchronization if such a guarantee is required.
///
/// ```
/// use arrayview_texel::LifetimeOwner;
///
/// let owner = LifetimeOwner::new(16);
/// let alias = owner.clone();
/// assert_eq!(owner.holders(), 2);
///
/// alias.store(4, -7i32).unwrap();
/// assert_eq!(owner.load::<i32>(4), Some(-7));
///
/// drop(owner);
/// assert_eq!(alias.holders(), 1);
/// ```
#[derive(Clone)]
pub struct LifetimeOwner {
    inner: Arc<Allocation>,
}

struct Allocation {
    words: Box<[AtomicU64]>,
    /// The logical length in bytes, at most the byte size of `words`.
    len: usize,
    finalizer: Option<Finalizer>,
}

impl LifetimeOwner {
    /// Allocate a zeroed buffer with a number of bytes.
    pub fn new(byte_len: usize) -> Self {
        let words = (0..Self::alloc_len(byte_len))
            .map(|_| AtomicU64::new(0))
            .collect();
        Self::with_words(words, byte_len)
    }

    /// Allocate a buffer with initial byte contents.
    pub fn with_bytes(bytes: &[u8]) -> Self {
        let words = bytes
            .chunks(WORD)
            .map(|chunk| {
                let mut word = [0; WORD];
                word[..chunk.len()].copy_from_slice(chunk);
                AtomicU64::new(u64::from_ne_bytes(word))
            })
            .collect();
        Self::with_words(words, bytes.len())
    }

    /// Allocate a buffer holding a copy of some elements, in native endian.
    pub fn from_elements<T: Element>(elements: &[T]) -> Self {
        Self::with_bytes(bytemuck::cast_slice(elements))
    }

    fn with_words(words: Box<[AtomicU64]>, len: usize) -> Self {
        LifetimeOwner {
            inner: Arc::new(Allocation {
                words,
                len,
                finalizer: None,
            }),
        }
    }

    /// Register a function to run when the last holder releases the allocation.
    ///
    /// This is the deletion hook for allocations whose bytes mirror memory managed by someone
    /// else. It can only be installed while this is the only holder, otherwise the handle is
    /// returned unchanged in `Err`.
    ///
    /// ```
    /// use arrayview_texel::LifetimeOwner;
    /// use std::sync::atomic::{AtomicBool, Ordering};
    /// use std::sync::Arc;
    ///
    /// let released = Arc::new(AtomicBool::new(false));
    /// let flag = released.clone();
    /// let owner = LifetimeOwner::new(4)
    ///     .with_finalizer(move || flag.store(true, Ordering::SeqCst))
    ///     .ok()
    ///     .unwrap();
    ///
    /// let view = owner.clone();
    /// drop(owner);
    /// assert!(!released.load(Ordering::SeqCst));
    /// drop(view);
    /// assert!(released.load(Ordering::SeqCst));
    /// ```
    pub fn with_finalizer(
        mut self,
        finalize: impl FnOnce() + Send + Sync + 'static,
    ) -> Result<Self, Self> {
        match Arc::get_mut(&mut self.inner) {
            Some(allocation) => {
                allocation.finalizer = Some(Box::new(finalize));
                Ok(self)
            }
            None => Err(self),
        }
    }

    /// The number of logical bytes in the allocation.
    pub fn byte_len(&self) -> usize {
        self.inner.len
    }

    /// The number of handles currently keeping the allocation alive.
    ///
    /// Note that other threads may register or release holders at any time, the value is only a
    /// snapshot.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check if this handle is the only holder of the allocation.
    pub fn is_unique(&self) -> bool {
        self.holders() == 1
    }

    /// Query if two handles share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The address of the first byte of the allocation.
    ///
    /// Stable for the whole lifetime of the allocation, which makes it suitable to identify a
    /// buffer across the views and images sharing it.
    pub fn address(&self) -> usize {
        self.inner.words.as_ptr() as usize
    }

    /// Load one element at a byte offset.
    ///
    /// Returns `None` if the offset is not a multiple of the element size or if the element is
    /// not fully contained in the buffer.
    pub fn load<T: Element>(&self, offset: usize) -> Option<T> {
        if offset % mem::size_of::<T>() != 0 {
            return None;
        }

        let mut value = T::zeroed();
        self.read_bytes(offset, bytemuck::bytes_of_mut(&mut value))?;
        Some(value)
    }

    /// Store one element at a byte offset.
    ///
    /// Returns `None`, without modifying any byte, under the same conditions as [`Self::load`].
    pub fn store<T: Element>(&self, offset: usize, value: T) -> Option<()> {
        if offset % mem::size_of::<T>() != 0 {
            return None;
        }

        self.write_bytes(offset, bytemuck::bytes_of(&value))
    }

    /// Copy bytes starting at an offset into a slice.
    pub fn read_bytes(&self, offset: usize, into: &mut [u8]) -> Option<()> {
        self.check_range(offset, into.len())?;

        let mut done = 0;
        while done < into.len() {
            let (word, within) = Self::locate(offset + done);
            let take = (WORD - within).min(into.len() - done);
            let bytes = self.inner.words[word].load(Ordering::Relaxed).to_ne_bytes();
            into[done..done + take].copy_from_slice(&bytes[within..within + take]);
            done += take;
        }

        Some(())
    }

    /// Copy bytes from a slice into the buffer, starting at an offset.
    pub fn write_bytes(&self, offset: usize, from: &[u8]) -> Option<()> {
        self.check_range(offset, from.len())?;

        let mut done = 0;
        while done < from.len() {
            let (word, within) = Self::locate(offset + done);
            let take = (WORD - within).min(from.len() - done);
            let part = &from[done..done + take];
            let cell = &self.inner.words[word];

            if take == WORD {
                let mut bytes = [0; WORD];
                bytes.copy_from_slice(part);
                cell.store(u64::from_ne_bytes(bytes), Ordering::Relaxed);
            } else {
                // Only replace our bytes, other elements in the same word may be written
                // concurrently by another holder.
                let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                    let mut bytes = current.to_ne_bytes();
                    bytes[within..within + take].copy_from_slice(part);
                    Some(u64::from_ne_bytes(bytes))
                });
            }

            done += take;
        }

        Some(())
    }

    /// Replace one byte by a function of its current value, as a single atomic operation.
    ///
    /// Returns the previous value, or `None` if the offset is out of bounds.
    pub fn update_byte(&self, offset: usize, mut update: impl FnMut(u8) -> u8) -> Option<u8> {
        self.check_range(offset, 1)?;

        let (word, within) = Self::locate(offset);
        let previous = self.inner.words[word]
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                let mut bytes = current.to_ne_bytes();
                bytes[within] = update(bytes[within]);
                Some(u64::from_ne_bytes(bytes))
            })
            .unwrap_or_else(|current| current);

        Some(previous.to_ne_bytes()[within])
    }

    /// Copy all logical bytes into an owned vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = alloc::vec![0; self.byte_len()];
        // The range is the full logical length, which is always in bounds.
        let _ = self.read_bytes(0, &mut bytes);
        bytes
    }

    /// Copy the data into a new, independent allocation.
    ///
    /// The new buffer will _never_ share memory with the current buffer and has no finalizer.
    pub fn to_independent(&self) -> Self {
        Self::with_bytes(&self.to_bytes())
    }

    fn check_range(&self, offset: usize, len: usize) -> Option<()> {
        let end = offset.checked_add(len)?;
        (end <= self.byte_len()).then_some(())
    }

    fn locate(offset: usize) -> (usize, usize) {
        (offset / WORD, offset % WORD)
    }

    /// Calculates the number of words to have a byte buffer of requested length.
    fn alloc_len(length: usize) -> usize {
        // This can never overflow.
        length / WORD + usize::from(length % WORD != 0)
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if let Some(finalize) = self.finalizer.take() {
            finalize();
        }
    }
}

impl fmt::Debug for LifetimeOwner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LifetimeOwner")
            .field("address", &self.address())
            .field("byte_len", &self.byte_len())
            .field("holders", &self.holders())
            .finish()
    }
}

impl From<&'_ [u8]> for LifetimeOwner {
    fn from(bytes: &'_ [u8]) -> Self {
        LifetimeOwner::with_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unaligned_element_access_is_refused() {
        let owner = LifetimeOwner::new(16);
        assert_eq!(owner.load::<u32>(2), None);
        assert_eq!(owner.store(6, 1u16), Some(()));
        assert_eq!(owner.store(6, 1u32), None);
        assert_eq!(owner.load::<u64>(8), Some(0));
    }

    #[test]
    fn out_of_bounds_is_refused() {
        let owner = LifetimeOwner::new(6);
        assert_eq!(owner.load::<u16>(4), Some(0));
        assert_eq!(owner.load::<u16>(6), None);
        assert_eq!(owner.store(4, 0u32), None);
        assert_eq!(owner.read_bytes(usize::MAX, &mut [0]), None);
    }

    #[test]
    fn bytes_straddle_words() {
        let data: Vec<u8> = (0..20).collect();
        let owner = LifetimeOwner::with_bytes(&data);
        assert_eq!(owner.to_bytes(), data);

        let mut middle = [0; 10];
        owner.read_bytes(5, &mut middle).unwrap();
        assert_eq!(middle, [5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);

        owner.write_bytes(3, &[0xff; 14]).unwrap();
        let bytes = owner.to_bytes();
        assert_eq!(&bytes[..3], &[0, 1, 2]);
        assert!(bytes[3..17].iter().all(|&b| b == 0xff));
        assert_eq!(&bytes[17..], &[17, 18, 19]);
    }

    #[test]
    fn byte_updates_do_not_lose_neighbours() {
        let owner = LifetimeOwner::with_bytes(&[0b1000_0001, 7, 0]);
        assert_eq!(owner.update_byte(0, |byte| byte | 0b10), Some(0b1000_0001));
        assert_eq!(owner.update_byte(2, |byte| byte + 1), Some(0));
        assert_eq!(owner.to_bytes(), [0b1000_0011, 7, 1]);
        assert_eq!(owner.update_byte(3, |byte| byte), None);

        let shared = LifetimeOwner::new(1);
        std::thread::scope(|join| {
            for bit in 0..8 {
                let shared = shared.clone();
                join.spawn(move || {
                    for _ in 0..1000 {
                        shared.update_byte(0, |byte| byte ^ (1 << bit)).unwrap();
                    }
                    shared.update_byte(0, |byte| byte | (1 << bit)).unwrap();
                });
            }
        });
        assert_eq!(shared.load::<u8>(0), Some(0xff));
    }

    #[test]
    fn independent_copy_does_not_alias() {
        let owner = LifetimeOwner::from_elements(&[1u16, 2, 3]);
        let copy = owner.to_independent();
        assert!(!owner.ptr_eq(&copy));

        owner.store(0, 9u16).unwrap();
        assert_eq!(copy.load::<u16>(0), Some(1));
        assert_eq!(owner.load::<u16>(0), Some(9));
    }

    #[test]
    fn finalizer_requires_unique_holder() {
        let owner = LifetimeOwner::new(1);
        let alias = owner.clone();
        let owner = owner.with_finalizer(|| ()).unwrap_err();
        assert!(owner.ptr_eq(&alias));
    }
}
