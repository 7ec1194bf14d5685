//! Memory-mapped register access
//!
//! The PCM block exposes nine 32-bit registers at word-aligned offsets from
//! its base address. [`RegisterBus`] is the seam the transfer engine uses; on
//! hardware it is backed by [`MmioBus`], in tests by
//! [`mocks::MockPcmBlock`](crate::mocks::MockPcmBlock).

/// 32-bit register access relative to a peripheral base address.
///
/// Every call performs a real device access; implementations must not cache.
pub trait RegisterBus {
    /// Error type
    type Error: core::fmt::Debug;

    /// Read the register at byte `offset`.
    fn read(&mut self, offset: u32) -> Result<u32, Self::Error>;

    /// Write `value` to the register at byte `offset`.
    fn write(&mut self, offset: u32, value: u32) -> Result<(), Self::Error>;
}

/// Volatile MMIO implementation of [`RegisterBus`].
///
/// Accesses never fail; `Error` is [`core::convert::Infallible`].
pub struct MmioBus {
    base: *mut u32,
}

impl MmioBus {
    /// Wrap a mapped register block.
    ///
    /// # Safety
    ///
    /// `base` must be the virtual address of a mapped, word-aligned register
    /// block that stays mapped for the lifetime of the returned value, and no
    /// other code may access the block concurrently.
    pub const unsafe fn new(base: *mut u32) -> Self {
        Self { base }
    }

    /// Pointer to the register at byte `offset`.
    fn reg(&self, offset: u32) -> *mut u32 {
        self.base.wrapping_byte_add(offset as usize)
    }
}

impl RegisterBus for MmioBus {
    type Error = core::convert::Infallible;

    fn read(&mut self, offset: u32) -> Result<u32, Self::Error> {
        // SAFETY: `new` guarantees the block is mapped and exclusively ours;
        // offsets come from the register map and stay inside the block.
        Ok(unsafe { core::ptr::read_volatile(self.reg(offset)) })
    }

    fn write(&mut self, offset: u32, value: u32) -> Result<(), Self::Error> {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(self.reg(offset), value) };
        Ok(())
    }
}

// SAFETY: the bus is the single owner of the register block (see `new`), so
// moving it to the context that services the peripheral is sound.
unsafe impl Send for MmioBus {}
