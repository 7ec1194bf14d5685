//! Device configuration and fixed engine limits.
//!
//! # Reserved DMA region
//!
//! One DMA-coherent region of [`RESERVED_BUFFER_BYTES`] is allocated at
//! `init`. It holds, in address order:
//!
//! ```text
//! capture  [2 × period]   half 0 | half 1
//! playback [2 × period]   half 0 | half 1
//! gate_out u32
//! gate_in  u32
//! ```
//!
//! period = frames × channels × 4 bytes; the largest layout
//! (128 frames × 8 channels) needs 16 392 bytes of the 20 480 reserved.

use platform::{BusWidth, ChannelCount, PeriodFrames, SampleRateHz};

use crate::error::Error;

/// Period sizes accepted by `buffers_setup`.
pub const SUPPORTED_PERIOD_FRAMES: [u32; 4] = PeriodFrames::SUPPORTED;
/// Largest channel count.
pub const MAX_CHANNELS: u32 = ChannelCount::MAX;
/// Period size used when the consumer does not ask for one.
pub const DEFAULT_PERIOD_FRAMES: u32 = 64;
/// Channels per frame used when the consumer does not ask.
pub const DEFAULT_CHANNELS: u32 = 8;
/// Pages reserved for the DMA region.
pub const RESERVED_BUFFER_PAGES: usize = 5;
/// Page size of the coherent allocator.
pub const PAGE_SIZE: usize = 4096;
/// Bytes requested from the coherent allocator at `init`.
pub const RESERVED_BUFFER_BYTES: usize = RESERVED_BUFFER_PAGES * PAGE_SIZE;
/// Bytes per sample word.
pub const SAMPLE_BYTES: usize = 4;
/// Value written to the gate-out word at buffer setup.
pub const GATE_OUT_INIT: u32 = 0x0F;

/// Runtime configuration of one device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// Device-visible address of the FIFO register (DMA slave address).
    pub fifo_bus_addr: u32,
    /// DMA slave bus width.
    pub dma_addr_width: BusWidth,
    /// DMA maximum burst, in beats.
    pub dma_burst: u32,
    /// SYNC poll budget while clearing the FIFOs.
    pub fifo_clear_polls: u32,
    /// Iteration cap of the frame synchronizer.
    pub frame_sync_polls: u32,
    /// Mirror the gate words to the gate lines once per period; passed to
    /// [`GateRelay::new`](crate::gate_relay::GateRelay::new).
    pub gate_relay: bool,
    /// Target sample rate for profiles that drive the bit clock.
    pub sample_rate: SampleRateHz,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            fifo_bus_addr: 0x7E20_3004,
            dma_addr_width: BusWidth::Bytes4,
            dma_burst: 2,
            fifo_clear_polls: 1000,
            frame_sync_polls: 1_000_000,
            gate_relay: false,
            sample_rate: SampleRateHz::HZ_48000,
        }
    }
}

impl DeviceConfig {
    /// Check the fields that have no type-level guarantee.
    pub fn validate(&self) -> Result<(), Error> {
        if self.fifo_bus_addr % 4 != 0 {
            return Err(Error::InvalidConfig("fifo_bus_addr must be word aligned"));
        }
        if self.dma_burst == 0 {
            return Err(Error::InvalidConfig("dma_burst must be non-zero"));
        }
        if self.fifo_clear_polls == 0 {
            return Err(Error::InvalidConfig("fifo_clear_polls must be non-zero"));
        }
        if self.frame_sync_polls == 0 {
            return Err(Error::InvalidConfig("frame_sync_polls must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DeviceConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.fifo_clear_polls, 1000);
        assert_eq!(config.dma_addr_width.bytes(), 4);
        assert!(!config.gate_relay);
    }

    #[test]
    fn zero_budgets_are_rejected() {
        let config = DeviceConfig {
            frame_sync_polls: 0,
            ..DeviceConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = DeviceConfig {
            fifo_bus_addr: 0x7E20_3006,
            ..DeviceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn largest_layout_fits_the_reserved_region() {
        let period = 128 * MAX_CHANNELS as usize * SAMPLE_BYTES;
        assert!(4 * period + 8 <= RESERVED_BUFFER_BYTES);
    }
}
