//! Double-buffer layout inside the reserved DMA region.
//!
//! All offsets are computed once from validated geometry; nothing else in
//! the engine does address arithmetic on the region.

use platform::{ChannelCount, PeriodFrames};

use crate::config::SAMPLE_BYTES;
use crate::dma::Direction;
use crate::error::Error;

/// A byte range inside the DMA region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Span {
    /// Byte offset from the start of the region
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

/// Named sub-regions of the shared capture/playback buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferSet {
    period_frames: PeriodFrames,
    channels: ChannelCount,
    period_len: usize,
    bus_base: u32,
    capture: Span,
    playback: Span,
    gate_out: usize,
    gate_in: usize,
}

impl BufferSet {
    /// Lay out buffers for `period_frames` × `channels` in a region of
    /// `region_len` bytes mapped at `bus_base`.
    pub fn new(
        period_frames: u32,
        channels: u32,
        region_len: usize,
        bus_base: u32,
    ) -> Result<Self, Error> {
        let period_frames =
            PeriodFrames::new(period_frames).map_err(|e| Error::UnsupportedPeriod(e.value))?;
        let channels =
            ChannelCount::new(channels).map_err(|e| Error::InvalidChannelCount(e.value))?;
        if bus_base % 4 != 0 {
            return Err(Error::InvalidGeometry);
        }

        let frames = usize::try_from(period_frames.get()).map_err(|_| Error::InvalidGeometry)?;
        let chans = usize::try_from(channels.get()).map_err(|_| Error::InvalidGeometry)?;
        // Bounded by 128 × 8 × 4.
        let period_len = frames
            .checked_mul(chans)
            .and_then(|n| n.checked_mul(SAMPLE_BYTES))
            .ok_or(Error::InvalidGeometry)?;
        let buffer_len = period_len.checked_mul(2).ok_or(Error::InvalidGeometry)?;
        let playback_offset = buffer_len;
        let gate_out = buffer_len.checked_mul(2).ok_or(Error::InvalidGeometry)?;
        let gate_in = gate_out.checked_add(SAMPLE_BYTES).ok_or(Error::InvalidGeometry)?;
        let needed = gate_in.checked_add(SAMPLE_BYTES).ok_or(Error::InvalidGeometry)?;

        if needed > region_len {
            return Err(Error::BufferTooSmall {
                needed,
                available: region_len,
            });
        }
        let end = u32::try_from(needed).map_err(|_| Error::InvalidGeometry)?;
        bus_base.checked_add(end).ok_or(Error::InvalidGeometry)?;

        Ok(Self {
            period_frames,
            channels,
            period_len,
            bus_base,
            capture: Span {
                offset: 0,
                len: buffer_len,
            },
            playback: Span {
                offset: playback_offset,
                len: buffer_len,
            },
            gate_out,
            gate_in,
        })
    }

    /// Frames per period.
    pub fn period_frames(&self) -> PeriodFrames {
        self.period_frames
    }

    /// Interleaved channels per frame.
    pub fn channels(&self) -> ChannelCount {
        self.channels
    }

    /// Bytes per period (one half of a direction's buffer).
    pub fn period_len(&self) -> usize {
        self.period_len
    }

    /// Bytes per direction (two periods).
    pub fn buffer_len(&self) -> usize {
        self.capture.len
    }

    /// Words per period.
    pub fn period_words(&self) -> usize {
        self.period_len / SAMPLE_BYTES
    }

    /// Capture buffer, both halves.
    pub fn capture(&self) -> Span {
        self.capture
    }

    /// Playback buffer, both halves. Directly follows the capture buffer.
    pub fn playback(&self) -> Span {
        self.playback
    }

    /// Buffer for `direction`.
    pub fn buffer(&self, direction: Direction) -> Span {
        match direction {
            Direction::Capture => self.capture,
            Direction::Playback => self.playback,
        }
    }

    /// One half (`0` or `1`) of the buffer for `direction`.
    pub fn half(&self, direction: Direction, half: u8) -> Result<Span, Error> {
        let buffer = self.buffer(direction);
        let offset = match half {
            0 => buffer.offset,
            1 => buffer.offset.saturating_add(self.period_len),
            _ => return Err(Error::InvalidGeometry),
        };
        Ok(Span {
            offset,
            len: self.period_len,
        })
    }

    /// Bus address of the buffer for `direction`.
    pub fn bus_addr(&self, direction: Direction) -> u32 {
        // Checked against the region end in `new`.
        let offset = u32::try_from(self.buffer(direction).offset).unwrap_or(u32::MAX);
        self.bus_base.saturating_add(offset)
    }

    /// Offset of the gate-out word (bit *i* drives gate output *i*).
    pub fn gate_out(&self) -> usize {
        self.gate_out
    }

    /// Offset of the gate-in word (bit *i* reflects gate input *i*).
    pub fn gate_in(&self) -> usize {
        self.gate_in
    }

    /// Bytes used from the start of the region.
    pub fn total_len(&self) -> usize {
        self.gate_in.saturating_add(SAMPLE_BYTES)
    }
}
