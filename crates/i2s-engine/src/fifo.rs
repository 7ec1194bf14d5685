//! FIFO clearing and priming.

use platform::RegisterBus;

use crate::error::Error;
use crate::registers::{CS_A, CS_RXCLR, CS_RXON, CS_RXTX_ON, CS_SYNC, CS_TXCLR, CS_TXON, FIFO_A, THR_TX};
use crate::regmap::RegMap;

/// Result of the SYNC handshake inside [`clear_fifos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClearOutcome {
    /// SYNC echoed after this many polls; the clear was seen by the PCM clock.
    Synced {
        /// Status reads until the echo
        polls: u32,
    },
    /// Poll budget exhausted. The FIFOs are assumed clear.
    TimedOut,
}

/// Clear the TX and/or RX FIFO.
///
/// The requested directions are stopped, their clear bits set, and the SYNC
/// bit toggled and polled (at most `polls` reads) so the clear stays asserted
/// for at least two PCM clocks. The RX/TX enable bits are then restored to
/// what they were on entry, whether or not the poll timed out.
pub fn clear_fifos<B: RegisterBus>(
    regs: &mut RegMap<B>,
    tx: bool,
    rx: bool,
    polls: u32,
) -> Result<ClearOutcome, Error> {
    let saved = regs.read(CS_A)? & CS_RXTX_ON;

    let mut off = 0;
    let mut clr = 0;
    if tx {
        off |= CS_TXON;
        clr |= CS_TXCLR;
    }
    if rx {
        off |= CS_RXON;
        clr |= CS_RXCLR;
    }

    regs.update_bits(CS_A, off, 0)?;
    regs.update_bits(CS_A, clr, clr)?;

    let sync = regs.read(CS_A)? & CS_SYNC;
    regs.update_bits(CS_A, CS_SYNC, !sync)?;

    let mut outcome = ClearOutcome::TimedOut;
    for n in 1..=polls {
        if regs.read(CS_A)? & CS_SYNC != sync {
            outcome = ClearOutcome::Synced { polls: n };
            break;
        }
    }
    if outcome == ClearOutcome::TimedOut {
        warn!("FIFO clear: SYNC did not echo within {} polls", polls);
    }

    regs.update_bits(CS_A, off, saved)?;
    Ok(outcome)
}

/// Number of zero words [`prime_tx_fifo`] writes for `channels`.
pub const fn prime_words(channels: u32) -> u32 {
    THR_TX.saturating_add(channels)
}

/// Pre-fill the TX FIFO with silence so the first DMA request finds it above
/// threshold.
pub fn prime_tx_fifo<B: RegisterBus>(regs: &mut RegMap<B>, channels: u32) -> Result<(), Error> {
    for _ in 0..prime_words(channels) {
        regs.write(FIFO_A, 0)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use platform::mocks::MockPcmBlock;

    #[test]
    fn clear_asserts_both_clear_bits_and_syncs() {
        let pcm = MockPcmBlock::new();
        let mut regs = RegMap::new(pcm.clone());

        let outcome = clear_fifos(&mut regs, true, true, 1000).unwrap();
        assert_eq!(outcome, ClearOutcome::Synced { polls: 2 });
        assert_eq!(pcm.fifo_clears(), vec![CS_TXCLR | CS_RXCLR]);
    }

    #[test]
    fn enable_bits_restored_after_timeout() {
        let pcm = MockPcmBlock::with_sync_lag(None);
        pcm.poke(CS_A, CS_TXON | CS_RXON | 1);
        let mut regs = RegMap::new(pcm.clone());

        let outcome = clear_fifos(&mut regs, true, false, 50).unwrap();
        assert_eq!(outcome, ClearOutcome::TimedOut);
        assert_eq!(pcm.fifo_clears(), vec![CS_TXCLR]);
        assert_eq!(pcm.reg(CS_A) & CS_RXTX_ON, CS_TXON | CS_RXON);
    }

    #[test]
    fn priming_writes_threshold_plus_channels() {
        let pcm = MockPcmBlock::new();
        let mut regs = RegMap::new(pcm.clone());

        prime_tx_fifo(&mut regs, 2).unwrap();
        assert_eq!(pcm.fifo_writes(), vec![0; 0x30 + 2]);
    }
}
