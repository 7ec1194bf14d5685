//! Capture channel alignment at stream start.
//!
//! When the PCM block drives the frame clock, the RX FIFO can start
//! mid-frame. The trailing slots of every frame carry exactly zero on a
//! correctly wired board, so samples are discarded until two consecutive
//! zeros come out: the next sample read by DMA is then channel 0.
//!
//! A zero is written to the TX FIFO for every sample popped so the shared
//! frame clock keeps running.
//!
//! The two-zero condition is a heuristic. Silent input can hold it off for
//! a long time, so the loop is capped and reports
//! [`Error::SynchronizationTimeout`] when the cap is reached.

use heapless::Vec;
use platform::RegisterBus;

use crate::error::Error;
use crate::registers::{CS_A, CS_RXD, FIFO_A};
use crate::regmap::RegMap;

/// Number of discarded samples kept for diagnostics.
pub const SYNC_LOG_LEN: usize = 32;

/// Outcome of a successful alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Samples popped from the RX FIFO, including the two zeros.
    pub discarded: u32,
    /// Status polls spent.
    pub polls: u32,
    /// The first [`SYNC_LOG_LEN`] discarded samples, in order.
    pub samples: Vec<u32, SYNC_LOG_LEN>,
}

/// Enable `mask` in CS and discard RX samples until two consecutive zeros.
///
/// At most `max_polls` status reads are spent. On timeout the `mask` bits
/// are cleared again before the error is returned.
pub fn synchronize<B: RegisterBus>(
    regs: &mut RegMap<B>,
    mask: u32,
    max_polls: u32,
) -> Result<SyncReport, Error> {
    regs.update_bits(CS_A, mask, mask)?;

    let mut last = [0xff_u32; 2];
    let mut report = SyncReport {
        discarded: 0,
        polls: 0,
        samples: Vec::new(),
    };

    while last != [0, 0] {
        if report.polls >= max_polls {
            regs.update_bits(CS_A, mask, 0)?;
            warn!(
                "frame sync gave up after {} polls, {} samples discarded",
                report.polls, report.discarded
            );
            return Err(Error::SynchronizationTimeout {
                discarded: report.discarded,
            });
        }
        report.polls = report.polls.saturating_add(1);

        if regs.read(CS_A)? & CS_RXD != 0 {
            regs.write(FIFO_A, 0)?;
            let sample = regs.read(FIFO_A)?;
            last = [last[1], sample];
            report.discarded = report.discarded.saturating_add(1);
            // Full log is not an error; the count keeps going.
            let _ = report.samples.push(sample);
        }
    }

    info!("frame sync: {} samples discarded", report.discarded);
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registers::CS_RXTX_ON;
    use platform::mocks::MockPcmBlock;

    #[test]
    fn stops_after_two_consecutive_zeros() {
        let pcm = MockPcmBlock::new();
        pcm.script_capture(&[5, 0, 7, 0, 0, 9, 9]);
        let mut regs = RegMap::new(pcm.clone());

        let report = synchronize(&mut regs, CS_RXTX_ON, 100).unwrap();
        assert_eq!(report.discarded, 5);
        assert_eq!(report.samples.as_slice(), &[5, 0, 7, 0, 0]);
        assert_eq!(pcm.capture_remaining(), 2);
        assert_eq!(pcm.fifo_writes(), vec![0; 5]);
        assert_eq!(pcm.reg(CS_A) & CS_RXTX_ON, CS_RXTX_ON);
    }

    #[test]
    fn waits_for_data_without_counting_it() {
        let pcm = MockPcmBlock::new();
        let mut regs = RegMap::new(pcm.clone());
        // No data yet: every poll is spent, nothing discarded.
        let err = synchronize(&mut regs, CS_RXTX_ON, 10).unwrap_err();
        assert_eq!(err, Error::SynchronizationTimeout { discarded: 0 });
        assert_eq!(pcm.reg(CS_A) & CS_RXTX_ON, 0);
    }

    #[test]
    fn cap_bounds_a_stream_without_zero_pairs() {
        let pcm = MockPcmBlock::new();
        pcm.script_capture(&[0, 1, 0, 1, 0, 1, 0, 1]);
        let mut regs = RegMap::new(pcm);

        let err = synchronize(&mut regs, CS_RXTX_ON, 6).unwrap_err();
        assert_eq!(err, Error::SynchronizationTimeout { discarded: 6 });
    }
}
