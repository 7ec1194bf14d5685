//! Cyclic slave-DMA abstraction layer
//!
//! Models the subset of a dmaengine-style controller the transfer engine
//! needs: slave configuration, cyclic descriptor preparation, submission,
//! issuing, asynchronous termination and status inspection.

/// Direction of a slave transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferDirection {
    /// Memory to peripheral FIFO (playback).
    MemToDev,
    /// Peripheral FIFO to memory (capture).
    DevToMem,
}

/// Slave bus width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusWidth {
    /// 1 byte per beat
    Bytes1,
    /// 2 bytes per beat
    Bytes2,
    /// 4 bytes per beat
    Bytes4,
}

impl BusWidth {
    /// Width in bytes.
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Bytes1 => 1,
            Self::Bytes2 => 2,
            Self::Bytes4 => 4,
        }
    }
}

/// Peripheral-side parameters of a slave channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveConfig {
    /// Transfer direction
    pub direction: TransferDirection,
    /// Device-visible address of the peripheral FIFO
    pub fifo_addr: u32,
    /// Width of each FIFO access
    pub addr_width: BusWidth,
    /// Maximum burst length in beats
    pub max_burst: u32,
}

/// Descriptor preparation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrepFlags {
    /// Raise a completion interrupt at the end of every period
    pub interrupt: bool,
    /// Client acknowledges the descriptor (no reuse)
    pub ack: bool,
    /// Deliver the completion out-of-band (real-time domain)
    pub oob_interrupt: bool,
}

impl PrepFlags {
    /// Flags used for both audio directions.
    pub const AUDIO: Self = Self {
        interrupt: true,
        ack: true,
        oob_interrupt: true,
    };
}

/// Submission cookie. Negative values signal a rejected submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cookie(pub i32);

impl Cookie {
    /// `true` if the controller rejected the submission.
    pub const fn is_error(self) -> bool {
        self.0 < 0
    }
}

/// Transfer status reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaStatus {
    /// Transfer completed
    Complete,
    /// Transfer running (the normal state of a cyclic transfer)
    InProgress,
    /// Transfer paused
    Paused,
    /// Controller reported an error
    Error,
}

impl DmaStatus {
    /// `true` if the controller flagged the transfer as failed.
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Progress detail accompanying a [`DmaStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxState {
    /// Bytes left in the current period
    pub residue: u32,
    /// Bytes read but not yet written
    pub in_flight_bytes: u32,
}

/// One cyclic slave-DMA channel.
///
/// The completion interrupt is delivered by the platform's interrupt handler,
/// which calls the engine's period callback; the channel itself only needs
/// to honour [`PrepFlags::interrupt`].
pub trait CyclicDmaChannel {
    /// Error type
    type Error: core::fmt::Debug;

    /// Opaque descriptor handle returned by [`prep_cyclic`](Self::prep_cyclic).
    type Descriptor;

    /// Apply peripheral-side configuration.
    fn slave_config(&mut self, config: &SlaveConfig) -> Result<(), Self::Error>;

    /// Prepare a cyclic transfer over `buf_len` bytes at bus address `buf_addr`,
    /// split into `period_len`-byte periods.
    fn prep_cyclic(
        &mut self,
        buf_addr: u32,
        buf_len: usize,
        period_len: usize,
        direction: TransferDirection,
        flags: PrepFlags,
    ) -> Result<Self::Descriptor, Self::Error>;

    /// Queue a prepared descriptor. Does not start the hardware.
    fn submit(&mut self, descriptor: &Self::Descriptor) -> Cookie;

    /// Start all queued descriptors.
    fn issue_pending(&mut self);

    /// Request termination of all transfers without waiting.
    fn terminate_async(&mut self) -> Result<(), Self::Error>;

    /// Wait until terminated transfers and their callbacks have quiesced.
    fn synchronize(&mut self);

    /// Status of the transfer identified by `cookie`.
    fn tx_status(&self, cookie: Cookie) -> (DmaStatus, TxState);
}
