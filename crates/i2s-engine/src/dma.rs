//! Cyclic DMA engine: one capture and one playback stream over a shared
//! double buffer.
//!
//! # Ordering
//!
//! | Step | Order | On failure |
//! |------|-------|------------|
//! | prepare | RX, then TX | TX failure terminates RX |
//! | submit | RX, then TX | nothing is issued |
//! | issue | RX, then TX | n/a |
//! | terminate | TX (+ synchronize), then RX (+ synchronize) | both always attempted, first error kept; a failed channel stays armed |
//!
//! RX starts accepting frames before TX pushes any, so the first period
//! neither overruns nor underruns. The period callback is attached to the
//! capture stream only; the platform's RX completion interrupt calls
//! [`Device::on_period_complete`](crate::coordinator::Device::on_period_complete).

use core::fmt;

use platform::{
    Cookie, CyclicDmaChannel, DmaStatus, PrepFlags, SlaveConfig, TransferDirection,
};

use crate::buffers::BufferSet;
use crate::config::DeviceConfig;
use crate::error::Error;

/// Stream direction as seen from memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// FIFO to memory (RX)
    Capture,
    /// Memory to FIFO (TX)
    Playback,
}

impl Direction {
    /// Matching slave transfer direction.
    pub const fn transfer(self) -> TransferDirection {
        match self {
            Self::Capture => TransferDirection::DevToMem,
            Self::Playback => TransferDirection::MemToDev,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Capture => "capture",
            Self::Playback => "playback",
        })
    }
}

struct Stream<D: CyclicDmaChannel> {
    channel: D,
    descriptor: Option<D::Descriptor>,
    cookie: Option<Cookie>,
    // Set once a descriptor exists; cleared only by a successful terminate.
    armed: bool,
}

impl<D: CyclicDmaChannel> Stream<D> {
    fn new(channel: D) -> Self {
        Self {
            channel,
            descriptor: None,
            cookie: None,
            armed: false,
        }
    }

    fn ensure_idle(&self, direction: Direction) -> Result<(), Error> {
        if self.armed {
            error!("{:?} channel is still armed", direction);
            return Err(Error::StillArmed(direction));
        }
        Ok(())
    }

    fn prepare(
        &mut self,
        direction: Direction,
        buffers: &BufferSet,
        config: &DeviceConfig,
    ) -> Result<(), Error> {
        let slave = SlaveConfig {
            direction: direction.transfer(),
            fifo_addr: config.fifo_bus_addr,
            addr_width: config.dma_addr_width,
            max_burst: config.dma_burst,
        };
        self.channel.slave_config(&slave).map_err(|_| {
            error!("{:?} channel rejected slave config", direction);
            Error::Configuration(direction)
        })?;

        let descriptor = self
            .channel
            .prep_cyclic(
                buffers.bus_addr(direction),
                buffers.buffer_len(),
                buffers.period_len(),
                direction.transfer(),
                PrepFlags::AUDIO,
            )
            .map_err(|_| {
                error!("no cyclic descriptor for {:?}", direction);
                Error::Descriptor(direction)
            })?;
        self.descriptor = Some(descriptor);
        self.armed = true;
        Ok(())
    }

    fn submit(&mut self, direction: Direction) -> Result<(), Error> {
        let descriptor = self.descriptor.as_ref().ok_or(Error::Descriptor(direction))?;
        let cookie = self.channel.submit(descriptor);
        if cookie.is_error() {
            error!("{:?} submission rejected", direction);
            return Err(Error::Submit(direction));
        }
        self.cookie = Some(cookie);
        Ok(())
    }

    fn terminate(&mut self, direction: Direction) -> Result<(), Error> {
        match self.channel.terminate_async() {
            Ok(()) => {
                self.channel.synchronize();
                self.descriptor = None;
                self.cookie = None;
                self.armed = false;
                Ok(())
            }
            Err(_) => {
                error!("{:?} termination failed", direction);
                Err(Error::Terminate(direction))
            }
        }
    }

    fn status(&self) -> Option<DmaStatus> {
        self.cookie.map(|cookie| self.channel.tx_status(cookie).0)
    }
}

/// Capture and playback cyclic streams.
pub struct CyclicDma<D: CyclicDmaChannel> {
    rx: Stream<D>,
    tx: Stream<D>,
}

impl<D: CyclicDmaChannel> CyclicDma<D> {
    /// Pair an RX (capture) and a TX (playback) channel.
    pub fn new(rx: D, tx: D) -> Self {
        Self {
            rx: Stream::new(rx),
            tx: Stream::new(tx),
        }
    }

    /// Prepare both cyclic descriptors over the full double buffer.
    ///
    /// If the playback side fails after capture succeeded, the capture
    /// channel is terminated before returning. A channel whose last
    /// termination failed is still armed and is refused with
    /// [`Error::StillArmed`] before anything is touched.
    pub fn prepare(&mut self, buffers: &BufferSet, config: &DeviceConfig) -> Result<(), Error> {
        self.rx.ensure_idle(Direction::Capture)?;
        self.tx.ensure_idle(Direction::Playback)?;
        self.rx.prepare(Direction::Capture, buffers, config)?;
        if let Err(e) = self.tx.prepare(Direction::Playback, buffers, config) {
            let _ = self.rx.terminate(Direction::Capture);
            return Err(e);
        }
        debug!(
            "cyclic DMA prepared: {} byte buffer, {} byte periods",
            buffers.buffer_len(),
            buffers.period_len()
        );
        Ok(())
    }

    /// Submit RX then TX, then issue both in the same order.
    ///
    /// Nothing is issued unless both submissions were accepted.
    pub fn submit(&mut self) -> Result<(), Error> {
        self.rx.submit(Direction::Capture)?;
        self.tx.submit(Direction::Playback)?;
        self.rx.channel.issue_pending();
        self.tx.channel.issue_pending();
        Ok(())
    }

    /// Terminate and synchronize TX, then RX.
    ///
    /// RX is terminated even when TX fails; the first error is returned.
    pub fn terminate(&mut self) -> Result<(), Error> {
        let tx = self.tx.terminate(Direction::Playback);
        let rx = self.rx.terminate(Direction::Capture);
        tx.and(rx)
    }

    /// `true` while at least one channel holds a descriptor that was not
    /// successfully terminated.
    pub fn is_armed(&self) -> bool {
        self.rx.armed || self.tx.armed
    }

    /// `true` while the channel for `direction` is armed.
    pub fn is_direction_armed(&self, direction: Direction) -> bool {
        match direction {
            Direction::Capture => self.rx.armed,
            Direction::Playback => self.tx.armed,
        }
    }

    /// Controller status of the submitted transfer for `direction`.
    pub fn status(&self, direction: Direction) -> Option<DmaStatus> {
        match direction {
            Direction::Capture => self.rx.status(),
            Direction::Playback => self.tx.status(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use platform::mocks::{DmaOp, DmaTrace, MockDmaChannel};
    use platform::TransferDirection::{DevToMem as Rx, MemToDev as Tx};

    fn engine() -> (CyclicDma<MockDmaChannel>, MockDmaChannel, MockDmaChannel, DmaTrace) {
        let trace = DmaTrace::new();
        let rx = MockDmaChannel::new(Rx, &trace);
        let tx = MockDmaChannel::new(Tx, &trace);
        (CyclicDma::new(rx.clone(), tx.clone()), rx, tx, trace)
    }

    fn buffers() -> BufferSet {
        BufferSet::new(64, 2, 20_480, 0x4000).unwrap()
    }

    #[test]
    fn prepare_uses_full_buffer_and_period_chunks() {
        let (mut dma, _, _, trace) = engine();
        dma.prepare(&buffers(), &DeviceConfig::default()).unwrap();

        let preps: Vec<_> = trace
            .ops()
            .into_iter()
            .filter_map(|(dir, op)| match op {
                DmaOp::Prep { buf_addr, buf_len, period_len, flags } => {
                    Some((dir, buf_addr, buf_len, period_len, flags))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            preps,
            vec![
                (Rx, 0x4000, 1024, 512, PrepFlags::AUDIO),
                (Tx, 0x4400, 1024, 512, PrepFlags::AUDIO),
            ]
        );
    }

    #[test]
    fn slave_config_targets_the_fifo() {
        let (mut dma, _, _, trace) = engine();
        dma.prepare(&buffers(), &DeviceConfig::default()).unwrap();

        let DmaOp::SlaveConfig(config) = &trace.events()[0].op else {
            panic!("first call must be slave_config");
        };
        assert_eq!(config.fifo_addr, 0x7E20_3004);
        assert_eq!(config.addr_width.bytes(), 4);
        assert_eq!(config.max_burst, 2);
        assert_eq!(config.direction, Rx);
    }

    #[test]
    fn playback_prep_failure_tears_down_capture() {
        let (mut dma, _, tx, trace) = engine();
        tx.fail_prep();

        let err = dma.prepare(&buffers(), &DeviceConfig::default()).unwrap_err();
        assert_eq!(err, Error::Descriptor(Direction::Playback));
        assert!(!dma.is_armed());
        let ops = trace.ops();
        assert_eq!(ops[ops.len() - 2], (Rx, DmaOp::Terminate));
        assert_eq!(ops[ops.len() - 1], (Rx, DmaOp::Synchronize));
    }

    #[test]
    fn rejected_playback_submit_issues_nothing() {
        let (mut dma, rx, tx, trace) = engine();
        tx.reject_submit();
        dma.prepare(&buffers(), &DeviceConfig::default()).unwrap();

        assert_eq!(dma.submit(), Err(Error::Submit(Direction::Playback)));
        assert!(!trace.ops().iter().any(|(_, op)| *op == DmaOp::IssuePending));
        assert!(!rx.is_running() && !tx.is_running());
    }

    #[test]
    fn terminate_attempts_capture_after_playback_failure() {
        let (mut dma, rx, tx, trace) = engine();
        dma.prepare(&buffers(), &DeviceConfig::default()).unwrap();
        dma.submit().unwrap();
        trace.clear();
        tx.fail_terminate();

        assert_eq!(dma.terminate(), Err(Error::Terminate(Direction::Playback)));
        assert_eq!(
            trace.ops(),
            vec![(Tx, DmaOp::Terminate), (Rx, DmaOp::Terminate), (Rx, DmaOp::Synchronize)]
        );
        assert!(!rx.is_running());
    }

    #[test]
    fn failed_termination_keeps_the_channel_armed() {
        let (mut dma, _, tx, trace) = engine();
        dma.prepare(&buffers(), &DeviceConfig::default()).unwrap();
        dma.submit().unwrap();
        tx.fail_terminate();
        let _ = dma.terminate();

        assert!(dma.is_direction_armed(Direction::Playback));
        assert!(!dma.is_direction_armed(Direction::Capture));

        trace.clear();
        assert_eq!(
            dma.prepare(&buffers(), &DeviceConfig::default()),
            Err(Error::StillArmed(Direction::Playback))
        );
        assert!(trace.ops().is_empty());

        tx.clear_faults();
        dma.terminate().unwrap();
        assert!(!dma.is_armed());
        dma.prepare(&buffers(), &DeviceConfig::default()).unwrap();
    }
}
