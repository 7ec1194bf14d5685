//! Hardware profile resolution.
//!
//! A profile names how the board wires the PCM block to its codec: who
//! drives the bit clock and frame sync, and at which bit clock each channel
//! slot starts. Frames are always 2 slots of 32 bits.
//!
//! | Profile | Board alias | Clocks | Slots | Frame sync on start |
//! |---------|-------------|--------|-------|---------------------|
//! | `bit-clock-provider` | `hifi-berry` | PCM is master | 1 / 33 | yes |
//! | `slot-shifted` | `hifi-berry-pro` | codec is master | 1 / 33 | no |
//! | `default` | `elk-pi` | codec is master | 0 / 32 | no |
//!
//! Board aliases are shorthands for the generic profile in the same row and
//! take exactly its parameters. They do not carry anything else the board
//! may need: an `elk-pi` that wants its capture stream aligned on start or
//! its CV gates relayed must say so through the `bit-clock-provider`
//! profile and `DeviceConfig::gate_relay`.

use platform::SampleRateHz;

use crate::error::Error;

/// Slots per frame.
pub const FRAME_SLOTS: u32 = 2;
/// Bits per slot (and per sample word).
pub const SLOT_BITS: u32 = 32;
/// Bit clocks per frame.
pub const FRAME_LEN: u32 = FRAME_SLOTS * SLOT_BITS;
/// Frame sync high time in bit clocks.
pub const FRAME_SYNC_LEN: u32 = FRAME_LEN / 2;

/// Named hardware variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareProfile {
    /// The PCM block drives bit clock and frame sync.
    BitClockProvider,
    /// Codec drives the clocks; channel slots start one bit late.
    SlotShifted,
    /// Codec drives the clocks; channel slots start on the frame edge.
    #[default]
    Default,
}

impl HardwareProfile {
    /// Every profile, in table order.
    pub const ALL: [Self; 3] = [Self::BitClockProvider, Self::SlotShifted, Self::Default];

    /// Strict lookup by generic name or board alias.
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "bit-clock-provider" | "hifi-berry" => Ok(Self::BitClockProvider),
            "slot-shifted" | "hifi-berry-pro" => Ok(Self::SlotShifted),
            "default" | "elk-pi" => Ok(Self::Default),
            _ => Err(Error::UnknownProfile),
        }
    }

    /// Permissive lookup: unrecognised names fall back to [`Self::Default`].
    pub fn resolve(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|_| {
            warn!("unknown hardware profile {}, using default", name);
            Self::Default
        })
    }

    /// Generic profile name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::BitClockProvider => "bit-clock-provider",
            Self::SlotShifted => "slot-shifted",
            Self::Default => "default",
        }
    }

    /// Parameter bundle for this profile at `sample_rate`.
    pub fn params(self, sample_rate: SampleRateHz) -> ProfileParams {
        let (master, (ch1_pos, ch2_pos)) = match self {
            Self::BitClockProvider => (true, (1, 33)),
            Self::SlotShifted => (false, (1, 33)),
            Self::Default => (false, (0, 32)),
        };
        ProfileParams {
            bclk_master: master,
            fs_master: master,
            bclk_rate: master.then_some(FRAME_LEN.saturating_mul(sample_rate.get())),
            frame_len: FRAME_LEN,
            fs_len: FRAME_SYNC_LEN,
            ch1_pos,
            ch2_pos,
            frame_sync_on_start: master,
        }
    }
}

/// Clock roles and frame format derived from a [`HardwareProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProfileParams {
    /// PCM block drives the bit clock
    pub bclk_master: bool,
    /// PCM block drives frame sync
    pub fs_master: bool,
    /// Bit clock to request from the clock generator, when master
    pub bclk_rate: Option<u32>,
    /// Bit clocks per frame
    pub frame_len: u32,
    /// Frame sync length in bit clocks
    pub fs_len: u32,
    /// First bit clock of channel 1
    pub ch1_pos: u32,
    /// First bit clock of channel 2
    pub ch2_pos: u32,
    /// Run the frame synchronizer before enabling RX/TX
    pub frame_sync_on_start: bool,
}

/// Resolve `name` (falling back to `default`) into its parameter bundle.
pub fn resolve(name: &str, sample_rate: SampleRateHz) -> ProfileParams {
    HardwareProfile::resolve(name).params(sample_rate)
}
