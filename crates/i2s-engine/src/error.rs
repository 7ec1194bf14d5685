//! Engine error type and its failure taxonomy.

use platform::RegionError;

use crate::coordinator::StreamState;
use crate::dma::Direction;

/// Errors surfaced by setup, control and teardown operations.
///
/// Failures inside the period callback are never returned; they are counted
/// in [`StreamHealth`](crate::health::StreamHealth) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A register access failed.
    #[error("register access at offset {0:#04x} failed")]
    Bus(u32),

    /// Profile name not recognised by the strict parser.
    #[error("unknown hardware profile")]
    UnknownProfile,

    /// Device configuration rejected by `DeviceConfig::validate`.
    #[error("invalid device configuration: {0}")]
    InvalidConfig(&'static str),

    /// Buffer layout could not be derived from the allocated region.
    #[error("invalid buffer geometry")]
    InvalidGeometry,

    /// Period size outside the supported set.
    #[error("unsupported period of {0} frames")]
    UnsupportedPeriod(u32),

    /// Channel count outside 1..=8.
    #[error("unsupported channel count {0}")]
    InvalidChannelCount(u32),

    /// Buffers plus gate words do not fit the reserved region.
    #[error("buffer layout needs {needed} bytes, region holds {available}")]
    BufferTooSmall {
        /// Bytes the layout needs
        needed: usize,
        /// Bytes the region holds
        available: usize,
    },

    /// DMA-coherent memory could not be obtained.
    #[error("DMA-coherent allocation failed")]
    Allocation,

    /// DMA channel rejected its slave configuration.
    #[error("{0} DMA channel rejected its slave configuration")]
    Configuration(Direction),

    /// No cyclic descriptor could be prepared.
    #[error("{0} DMA descriptor could not be prepared")]
    Descriptor(Direction),

    /// Descriptor submission was rejected.
    #[error("{0} DMA submission rejected")]
    Submit(Direction),

    /// Channel termination failed.
    #[error("{0} DMA termination failed")]
    Terminate(Direction),

    /// Channel still holds a descriptor its last termination did not stop.
    #[error("{0} DMA channel is still armed")]
    StillArmed(Direction),

    /// Frame synchronization hit its iteration cap.
    #[error("frame synchronization gave up after discarding {discarded} samples")]
    SynchronizationTimeout {
        /// Samples discarded before giving up
        discarded: u32,
    },

    /// Gate lines could not be claimed.
    #[error("gate lines could not be claimed")]
    Gate,

    /// Operation not valid in the current stream state.
    #[error("operation needs state {expected:?}, device is {found:?}")]
    InvalidState {
        /// State the operation needs
        expected: StreamState,
        /// State the device is in
        found: StreamState,
    },
}

/// Failure class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Invalid or rejected parameters; the affected setup is aborted.
    Configuration,
    /// Memory or descriptor could not be obtained; acquired resources are unwound.
    Resource,
    /// DMA submission rejected; nothing is activated.
    Submission,
    /// The peripheral did not respond as expected.
    Hardware,
    /// A bounded wait expired.
    Timeout,
    /// Operation out of sequence.
    State,
}

impl Error {
    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownProfile
            | Self::InvalidConfig(_)
            | Self::InvalidGeometry
            | Self::UnsupportedPeriod(_)
            | Self::InvalidChannelCount(_)
            | Self::Configuration(_) => ErrorKind::Configuration,
            Self::BufferTooSmall { .. }
            | Self::Allocation
            | Self::Descriptor(_)
            | Self::StillArmed(_)
            | Self::Gate => ErrorKind::Resource,
            Self::Submit(_) => ErrorKind::Submission,
            Self::Bus(_) | Self::Terminate(_) => ErrorKind::Hardware,
            Self::SynchronizationTimeout { .. } => ErrorKind::Timeout,
            Self::InvalidState { .. } => ErrorKind::State,
        }
    }
}

impl From<RegionError> for Error {
    fn from(_: RegionError) -> Self {
        Self::InvalidGeometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_failures_are_resource_errors() {
        assert_eq!(Error::Descriptor(Direction::Capture).kind(), ErrorKind::Resource);
        assert_eq!(Error::Allocation.kind(), ErrorKind::Resource);
        assert_eq!(Error::StillArmed(Direction::Playback).kind(), ErrorKind::Resource);
    }

    #[test]
    fn taxonomy_covers_remaining_classes() {
        assert_eq!(Error::Configuration(Direction::Playback).kind(), ErrorKind::Configuration);
        assert_eq!(Error::Submit(Direction::Playback).kind(), ErrorKind::Submission);
        assert_eq!(Error::Bus(0x08).kind(), ErrorKind::Hardware);
        assert_eq!(
            Error::SynchronizationTimeout { discarded: 3 }.kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            Error::InvalidState {
                expected: StreamState::Configured,
                found: StreamState::Unconfigured
            }
            .kind(),
            ErrorKind::State
        );
    }

    #[test]
    fn region_errors_map_to_geometry() {
        let err: Error = RegionError::Misaligned(2).into();
        assert_eq!(err, Error::InvalidGeometry);
    }
}
