//! Audio domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common errors:
//! - `SampleRateHz`: validates 8000–192000 Hz range
//! - `PeriodFrames`: only the period sizes the DMA layout is sized for
//! - `ChannelCount`: 1–8 interleaved channels

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: u32,
    /// The inclusive minimum allowed value.
    pub min: u32,
    /// The inclusive maximum allowed value.
    pub max: u32,
}

// ── SampleRateHz ─────────────────────────────────────────────────────────────

/// Sample rate in Hz, validated to the range the PCM block can clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct SampleRateHz(u32);

impl SampleRateHz {
    /// Minimum supported sample rate: 8000 Hz (telephony).
    pub const MIN_HZ: u32 = 8_000;

    /// Maximum supported sample rate: 192000 Hz.
    pub const MAX_HZ: u32 = 192_000;

    /// 48 kHz, the rate every supported board runs at by default.
    pub const HZ_48000: Self = Self(48_000);

    /// Create a `SampleRateHz`, returning an error if out of 8000–192000 Hz.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `hz < 8000` or `hz > 192000`.
    pub fn new(hz: u32) -> Result<Self, OutOfRangeError> {
        if (Self::MIN_HZ..=Self::MAX_HZ).contains(&hz) {
            Ok(Self(hz))
        } else {
            Err(OutOfRangeError {
                value: hz,
                min: Self::MIN_HZ,
                max: Self::MAX_HZ,
            })
        }
    }

    /// Return the sample rate in Hz.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

// ── PeriodFrames ─────────────────────────────────────────────────────────────

/// Frames per DMA period.
///
/// Only powers of two between 16 and 128 are accepted: the reserved DMA
/// region is sized for the largest of them at [`ChannelCount::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct PeriodFrames(u32);

impl PeriodFrames {
    /// Period sizes the engine accepts.
    pub const SUPPORTED: [u32; 4] = [16, 32, 64, 128];

    /// Period size used when the consumer does not ask for one.
    pub const DEFAULT: Self = Self(64);

    /// Create a `PeriodFrames`, rejecting sizes outside [`Self::SUPPORTED`].
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] (with the smallest and largest supported
    /// sizes as bounds) for any other value.
    pub fn new(frames: u32) -> Result<Self, OutOfRangeError> {
        if Self::SUPPORTED.contains(&frames) {
            Ok(Self(frames))
        } else {
            Err(OutOfRangeError {
                value: frames,
                min: 16,
                max: 128,
            })
        }
    }

    /// Return the number of frames.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

// ── ChannelCount ─────────────────────────────────────────────────────────────

/// Number of interleaved channels per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct ChannelCount(u32);

impl ChannelCount {
    /// Largest channel count the codecs on supported boards expose.
    pub const MAX: u32 = 8;

    /// Create a `ChannelCount`, returning an error outside 1–8.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `channels == 0` or `channels > 8`.
    pub fn new(channels: u32) -> Result<Self, OutOfRangeError> {
        if (1..=Self::MAX).contains(&channels) {
            Ok(Self(channels))
        } else {
            Err(OutOfRangeError {
                value: channels,
                min: 1,
                max: Self::MAX,
            })
        }
    }

    /// Return the number of channels.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}
