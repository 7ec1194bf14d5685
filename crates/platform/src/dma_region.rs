//! DMA-coherent memory regions.
//!
//! A [`DmaRegion`] pairs the CPU view of a physically contiguous buffer with
//! the address the DMA controller uses for it. The DMA engine writes and reads
//! the region behind the CPU's back, so all CPU access is volatile and goes
//! through bounds-checked word accessors; no Rust reference into the region is
//! ever handed out.
//!
//! Writes take `&self`: like the DMA controller, several CPU contexts (the
//! period callback and the consumer) touch the region at once, each confined
//! to the words the double-buffer discipline gives it.
//!
//! ## Addressing
//!
//! | View | Type | Used by |
//! |------|------|---------|
//! | CPU  | `NonNull<u32>` | consumer, gate relay, FIFO priming |
//! | Bus  | `u32`          | cyclic DMA descriptors |
//!
//! Offsets are in bytes and must be word aligned.

use core::marker::PhantomData;
use core::ptr::NonNull;

/// Size of one word in the region.
pub const WORD_BYTES: usize = core::mem::size_of::<u32>();

/// Error returned by region accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegionError {
    /// Access extends past the end of the region.
    #[error("access at byte {offset} (+{len}) exceeds region of {size} bytes")]
    OutOfBounds {
        /// Byte offset of the access
        offset: usize,
        /// Length of the access in bytes
        len: usize,
        /// Region size in bytes
        size: usize,
    },
    /// Offset is not word aligned.
    #[error("offset {0} is not word aligned")]
    Misaligned(usize),
}

/// Physically contiguous, DMA-addressable memory.
pub struct DmaRegion<'a> {
    cpu: NonNull<u32>,
    bus_addr: u32,
    len: usize,
    _memory: PhantomData<&'a mut [u32]>,
}

impl<'a> DmaRegion<'a> {
    /// Borrow `words` as a region visible to the DMA controller at `bus_addr`.
    pub fn from_slice(words: &'a mut [u32], bus_addr: u32) -> Self {
        let len = words.len().saturating_mul(WORD_BYTES);
        Self {
            cpu: NonNull::from(words).cast(),
            bus_addr,
            len,
            _memory: PhantomData,
        }
    }

    /// Wrap memory handed out by a platform allocator.
    ///
    /// # Safety
    ///
    /// `cpu` must be valid for volatile reads and writes of `len` bytes for
    /// `'a`, word aligned, and mapped at `bus_addr` for the DMA controller.
    pub unsafe fn from_raw_parts(cpu: NonNull<u32>, bus_addr: u32, len: usize) -> Self {
        Self {
            cpu,
            bus_addr,
            len,
            _memory: PhantomData,
        }
    }

    /// Region size in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` for a zero-sized region.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bus address of the first byte.
    pub fn bus_addr(&self) -> u32 {
        self.bus_addr
    }

    /// Word pointer for `[offset, offset + len)` after checking bounds and alignment.
    fn word_ptr(&self, offset: usize, len: usize) -> Result<*mut u32, RegionError> {
        if offset % WORD_BYTES != 0 {
            return Err(RegionError::Misaligned(offset));
        }
        let end = offset.checked_add(len).ok_or(RegionError::OutOfBounds {
            offset,
            len,
            size: self.len,
        })?;
        if end > self.len {
            return Err(RegionError::OutOfBounds {
                offset,
                len,
                size: self.len,
            });
        }
        Ok(self.cpu.as_ptr().wrapping_byte_add(offset))
    }

    /// Volatile read of the word at byte `offset`.
    pub fn read_word(&self, offset: usize) -> Result<u32, RegionError> {
        let ptr = self.word_ptr(offset, WORD_BYTES)?;
        // SAFETY: bounds and alignment checked by `word_ptr`; the region is
        // valid for volatile access per the constructor contract.
        Ok(unsafe { core::ptr::read_volatile(ptr) })
    }

    /// Volatile write of `value` to the word at byte `offset`.
    pub fn write_word(&self, offset: usize, value: u32) -> Result<(), RegionError> {
        let ptr = self.word_ptr(offset, WORD_BYTES)?;
        // SAFETY: see `read_word`.
        unsafe { core::ptr::write_volatile(ptr, value) };
        Ok(())
    }

    /// Copy `out.len()` words starting at byte `offset` into `out`.
    pub fn read_words(&self, offset: usize, out: &mut [u32]) -> Result<(), RegionError> {
        let base = self.word_ptr(offset, out.len().saturating_mul(WORD_BYTES))?;
        for (i, slot) in out.iter_mut().enumerate() {
            // SAFETY: the whole span was checked above; `i < out.len()`.
            *slot = unsafe { core::ptr::read_volatile(base.wrapping_add(i)) };
        }
        Ok(())
    }

    /// Copy `words` into the region starting at byte `offset`.
    pub fn write_words(&self, offset: usize, words: &[u32]) -> Result<(), RegionError> {
        let base = self.word_ptr(offset, words.len().saturating_mul(WORD_BYTES))?;
        for (i, word) in words.iter().enumerate() {
            // SAFETY: the whole span was checked above; `i < words.len()`.
            unsafe { core::ptr::write_volatile(base.wrapping_add(i), *word) };
        }
        Ok(())
    }

    /// Set `len` bytes starting at `offset` to `value`, one word at a time.
    pub fn fill(&self, offset: usize, len: usize, value: u32) -> Result<(), RegionError> {
        let base = self.word_ptr(offset, len)?;
        for i in 0..len / WORD_BYTES {
            // SAFETY: the whole span was checked above.
            unsafe { core::ptr::write_volatile(base.wrapping_add(i), value) };
        }
        Ok(())
    }
}

// SAFETY: the region is uniquely owned (constructed from `&mut` or an
// allocator hand-off), so moving it between contexts is sound.
unsafe impl Send for DmaRegion<'_> {}

// SAFETY: every access is a bounds-checked volatile word read or write
// through the raw pointer; no reference into the memory is ever created.
// Which context owns which words is the double-buffer discipline, the same
// one the DMA controller follows.
unsafe impl Sync for DmaRegion<'_> {}

impl core::fmt::Debug for DmaRegion<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DmaRegion")
            .field("bus_addr", &format_args!("{:#010x}", self.bus_addr))
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Source of DMA-coherent memory (the platform's coherent allocator).
pub trait CoherentAllocator<'a> {
    /// Error type
    type Error: core::fmt::Debug;

    /// Allocate `bytes` of zeroed, DMA-coherent memory.
    fn alloc_coherent(&mut self, bytes: usize) -> Result<DmaRegion<'a>, Self::Error>;
}
