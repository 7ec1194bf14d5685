//! Register interface over a [`RegisterBus`].
//!
//! Every call is a real device access; nothing is cached. Bus faults are
//! reported as [`Error::Bus`] with the offending offset.

use platform::RegisterBus;

use crate::error::Error;

/// Read/write/update access to the PCM register block.
pub struct RegMap<B> {
    bus: B,
}

impl<B: RegisterBus> RegMap<B> {
    /// Wrap a register bus.
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Read the register at `reg`.
    pub fn read(&mut self, reg: u32) -> Result<u32, Error> {
        self.bus.read(reg).map_err(|_| {
            error!("register read at offset {} failed", reg);
            Error::Bus(reg)
        })
    }

    /// Write `value` to the register at `reg`.
    pub fn write(&mut self, reg: u32, value: u32) -> Result<(), Error> {
        self.bus.write(reg, value).map_err(|_| {
            error!("register write at offset {} failed", reg);
            Error::Bus(reg)
        })
    }

    /// Read-modify-write the bits selected by `mask` to `value`.
    ///
    /// The write is skipped when the register already holds the result.
    pub fn update_bits(&mut self, reg: u32, mask: u32, value: u32) -> Result<(), Error> {
        let old = self.read(reg)?;
        let new = (old & !mask) | (value & mask);
        if new != old {
            self.write(reg, new)?;
        }
        Ok(())
    }

    /// Borrow the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give the bus back.
    pub fn into_inner(self) -> B {
        self.bus
    }
}
