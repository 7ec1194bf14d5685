//! Transfer coordinator.
//!
//! Owns everything one PCM block needs and sequences it:
//!
//! ```text
//!  Unconfigured ──buffers_setup──► Configured ──Start──► Synchronizing ──► Streaming
//!       ▲                            ▲    ▲                    │               │
//!       │                            │    └──────timeout───────┘               │
//!       │                            └──────────────────Stop───────────────────┤
//!       │                                                                      │
//!  (re-setup) ◄────────────────────────── Stopped ◄───────────exit─────────────┘
//! ```
//!
//! [`Device::on_period_complete`] is the DMA completion callback. It never
//! fails and never blocks: DMA errors are counted in [`StreamHealth`] and the
//! stream keeps running until the owner calls [`Command::Stop`] or
//! [`Device::exit`].
//!
//! # Sharing with the interrupt
//!
//! | Method | Receiver | Context |
//! |--------|----------|---------|
//! | `on_period_complete`, `gate_words` | `&self` | interrupt |
//! | `read_capture`, `write_playback`, `zero_playback`, `set_gate_out` | `&self` | consumer |
//! | `init`, `buffers_setup`, `start_stop`, `exit` | `&mut self` | owner, interrupt quiet |
//!
//! Everything the callback touches is an atomic or volatile word, so the
//! interrupt and the consumer can hold `&Device` at the same time. The gate
//! lines are not part of the device; the binding owns a
//! [`GateRelay`](crate::gate_relay::GateRelay) and runs it after the callback.

use core::sync::atomic::{fence, Ordering};

use platform::{
    AudioClock, CoherentAllocator, CyclicDmaChannel, DmaRegion, DmaStatus, RegisterBus,
};

use crate::buffers::BufferSet;
use crate::config::{DeviceConfig, GATE_OUT_INIT, RESERVED_BUFFER_BYTES};
use crate::configurator::{clear_registers, configure, disable, enable};
use crate::dma::{CyclicDma, Direction};
use crate::error::Error;
use crate::fifo::{clear_fifos, prime_tx_fifo, ClearOutcome};
use crate::frame_sync::{synchronize, SyncReport};
use crate::gate_relay::GateWords;
use crate::health::StreamHealth;
use crate::notify::PeriodNotifier;
use crate::profile::{HardwareProfile, ProfileParams};
use crate::registers::{CS_A, CS_RXTX_ON};
use crate::regmap::RegMap;

/// Lifecycle state of a [`Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamState {
    /// No buffers, nothing armed.
    Unconfigured,
    /// Hardware configured and DMA submitted; RX/TX disabled.
    Configured,
    /// Discarding capture samples until the frame is aligned.
    Synchronizing,
    /// RX/TX enabled; the period callback is live.
    Streaming,
    /// DMA terminated and the block disabled. `buffers_setup` may run again
    /// once no channel is left armed.
    Stopped,
}

/// Argument of [`Device::start_stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Enable RX/TX, aligning the capture stream first if the profile needs it.
    Start,
    /// Disable RX/TX. A no-op unless streaming.
    Stop,
}

/// One PCM block with its DMA channels, clock and buffer.
pub struct Device<'a, B, D, C>
where
    D: CyclicDmaChannel,
{
    regs: RegMap<B>,
    dma: CyclicDma<D>,
    clock: C,
    notifier: &'a PeriodNotifier,
    config: DeviceConfig,
    profile: HardwareProfile,
    params: ProfileParams,
    region: Option<DmaRegion<'a>>,
    buffers: Option<BufferSet>,
    health: StreamHealth,
    state: StreamState,
    last_clear: Option<ClearOutcome>,
    last_sync: Option<SyncReport>,
}

impl<'a, B, D, C> Device<'a, B, D, C>
where
    B: RegisterBus,
    D: CyclicDmaChannel,
    C: AudioClock,
{
    /// Assemble a device. No hardware is touched until [`init`](Self::init).
    pub fn new(
        bus: B,
        rx: D,
        tx: D,
        clock: C,
        notifier: &'a PeriodNotifier,
        config: DeviceConfig,
    ) -> Self {
        let profile = HardwareProfile::default();
        Self {
            regs: RegMap::new(bus),
            dma: CyclicDma::new(rx, tx),
            clock,
            notifier,
            config,
            profile,
            params: profile.params(config.sample_rate),
            region: None,
            buffers: None,
            health: StreamHealth::new(),
            state: StreamState::Unconfigured,
            last_clear: None,
            last_sync: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Select the hardware profile and reserve the DMA region.
    ///
    /// Unknown profile names fall back to `default`. The region is
    /// allocated once; a second `init` only re-selects the profile.
    pub fn init<A>(&mut self, profile_name: &str, allocator: &mut A) -> Result<(), Error>
    where
        A: CoherentAllocator<'a>,
    {
        self.expect_one_of(&[StreamState::Unconfigured, StreamState::Stopped])?;
        self.config.validate()?;

        self.profile = HardwareProfile::resolve(profile_name);
        self.params = self.profile.params(self.config.sample_rate);
        info!("hardware profile: {}", self.profile.name());

        if self.region.is_none() {
            let region = allocator.alloc_coherent(RESERVED_BUFFER_BYTES).map_err(|_| {
                error!("could not reserve {} bytes of DMA memory", RESERVED_BUFFER_BYTES);
                Error::Allocation
            })?;
            self.region = Some(region);
        }
        Ok(())
    }

    /// Fix the buffer geometry and bring the hardware up to `Configured`.
    ///
    /// Sequence: lay out buffers, prepare DMA, zero the region and seed the
    /// gate-out word, clear and configure the registers, enable the block,
    /// clear both FIFOs, prime the TX FIFO, submit DMA. Any failure after DMA
    /// preparation terminates both channels before returning.
    pub fn buffers_setup(&mut self, period_frames: u32, channels: u32) -> Result<(), Error> {
        self.expect_one_of(&[StreamState::Unconfigured, StreamState::Stopped])?;

        let region = self.region.as_ref().ok_or(Error::Allocation)?;
        let buffers = BufferSet::new(period_frames, channels, region.len(), region.bus_addr())?;

        self.dma.prepare(&buffers, &self.config)?;
        if let Err(e) = self.bring_up(&buffers) {
            let _ = self.dma.terminate();
            return Err(e);
        }

        self.buffers = Some(buffers);
        self.health.reset();
        self.last_sync = None;
        self.state = StreamState::Configured;
        info!(
            "buffers ready: {} frames x {} channels, {} byte periods",
            period_frames,
            channels,
            buffers.period_len()
        );
        Ok(())
    }

    fn bring_up(&mut self, buffers: &BufferSet) -> Result<(), Error> {
        let region = self.region.as_ref().ok_or(Error::Allocation)?;
        region.fill(0, buffers.total_len(), 0)?;
        region.write_word(buffers.gate_out(), GATE_OUT_INIT)?;

        clear_registers(&mut self.regs)?;
        configure(&mut self.regs, &self.params, &mut self.clock)?;
        enable(&mut self.regs)?;
        self.last_clear = Some(clear_fifos(
            &mut self.regs,
            true,
            true,
            self.config.fifo_clear_polls,
        )?);
        prime_tx_fifo(&mut self.regs, buffers.channels().get())?;
        self.dma.submit()
    }

    /// Start or stop streaming.
    pub fn start_stop(&mut self, command: Command) -> Result<(), Error> {
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
        }
    }

    fn start(&mut self) -> Result<(), Error> {
        match self.state {
            StreamState::Configured => {}
            StreamState::Streaming => return Ok(()),
            found => {
                return Err(Error::InvalidState {
                    expected: StreamState::Configured,
                    found,
                })
            }
        }

        // Buffer contents written by the consumer must be visible to DMA.
        fence(Ordering::SeqCst);

        if self.params.frame_sync_on_start {
            self.state = StreamState::Synchronizing;
            match synchronize(&mut self.regs, CS_RXTX_ON, self.config.frame_sync_polls) {
                Ok(report) => self.last_sync = Some(report),
                Err(e) => {
                    self.state = StreamState::Configured;
                    return Err(e);
                }
            }
        } else {
            self.regs.update_bits(CS_A, CS_RXTX_ON, CS_RXTX_ON)?;
        }

        self.state = StreamState::Streaming;
        debug!("streaming");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        if self.state != StreamState::Streaming {
            return Ok(());
        }
        fence(Ordering::SeqCst);
        self.regs.update_bits(CS_A, CS_RXTX_ON, 0)?;
        self.state = StreamState::Configured;
        debug!("stopped");
        Ok(())
    }

    /// Terminate both DMA channels and disable the block.
    ///
    /// Every step runs even if an earlier one fails; the first error is
    /// returned. No period callback fires after this returns. A channel whose
    /// termination failed stays armed: `buffers_setup` refuses it with
    /// [`Error::StillArmed`] until a later `exit` stops it.
    pub fn exit(&mut self) -> Result<(), Error> {
        let dma = self.dma.terminate();
        let regs = disable(&mut self.regs);
        self.state = StreamState::Stopped;
        info!(
            "device stopped: {} capture / {} playback DMA errors",
            self.health.dma_errors(Direction::Capture),
            self.health.dma_errors(Direction::Playback)
        );
        dma.and(regs)
    }

    // ── Period callback ───────────────────────────────────────────────────

    /// DMA completion callback, once per period.
    ///
    /// Takes `&self`: status reads, the error counters and the notification
    /// are all lock-free.
    pub fn on_period_complete(&self) {
        for direction in [Direction::Capture, Direction::Playback] {
            if self.dma.status(direction).is_some_and(DmaStatus::is_error) {
                self.health.record_dma_error(direction);
                warn!("{:?} DMA reported an error", direction);
            }
        }

        self.notifier.raise();
    }

    // ── Consumer access ───────────────────────────────────────────────────

    /// Copy capture half `half` into `out` (at most one period of words).
    ///
    /// `half` must be `0` or `1`.
    pub fn read_capture(&self, half: u8, out: &mut [u32]) -> Result<(), Error> {
        let (region, buffers) = self.layout()?;
        if out.len() > buffers.period_words() {
            return Err(Error::InvalidGeometry);
        }
        region.read_words(buffers.half(Direction::Capture, half)?.offset, out)?;
        Ok(())
    }

    /// Copy `words` into playback half `half` (at most one period of words).
    pub fn write_playback(&self, half: u8, words: &[u32]) -> Result<(), Error> {
        let (region, buffers) = self.layout()?;
        if words.len() > buffers.period_words() {
            return Err(Error::InvalidGeometry);
        }
        region.write_words(buffers.half(Direction::Playback, half)?.offset, words)?;
        Ok(())
    }

    /// Fill both playback halves with silence.
    pub fn zero_playback(&self) -> Result<(), Error> {
        let (region, buffers) = self.layout()?;
        let span = buffers.playback();
        region.fill(span.offset, span.len, 0)?;
        Ok(())
    }

    /// Gate words of the current layout, for the relay and the consumer.
    pub fn gate_words(&self) -> Result<GateWords<'_, 'a>, Error> {
        let (region, buffers) = self.layout()?;
        Ok(GateWords::new(region, buffers))
    }

    /// Current gate-out word.
    pub fn gate_out(&self) -> Result<u32, Error> {
        self.gate_words()?.output()
    }

    /// Replace the gate-out word; the relay drives it on the next period.
    pub fn set_gate_out(&self, value: u32) -> Result<(), Error> {
        self.gate_words()?.set_output(value)
    }

    /// Gate-in word sampled on the last period.
    pub fn gate_in(&self) -> Result<u32, Error> {
        self.gate_words()?.input()
    }

    // ── Inspection ────────────────────────────────────────────────────────

    /// Lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Selected hardware profile.
    pub fn profile(&self) -> HardwareProfile {
        self.profile
    }

    /// Parameters of the selected profile.
    pub fn params(&self) -> &ProfileParams {
        &self.params
    }

    /// Runtime configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Buffer layout, once `buffers_setup` has succeeded.
    pub fn buffers(&self) -> Option<&BufferSet> {
        self.buffers.as_ref()
    }

    /// Completion notification shared with the consumer.
    pub fn notifier(&self) -> &'a PeriodNotifier {
        self.notifier
    }

    /// DMA error counters.
    pub fn health(&self) -> &StreamHealth {
        &self.health
    }

    /// Outcome of the FIFO clear in the last `buffers_setup`.
    pub fn last_clear(&self) -> Option<ClearOutcome> {
        self.last_clear
    }

    /// Report of the last frame alignment, for profiles that run it.
    pub fn last_sync(&self) -> Option<&SyncReport> {
        self.last_sync.as_ref()
    }

    /// Register bus.
    pub fn bus(&self) -> &B {
        self.regs.bus()
    }

    /// `true` while a DMA channel holds a descriptor that was not stopped.
    pub fn is_dma_armed(&self) -> bool {
        self.dma.is_armed()
    }

    fn expect_one_of(&self, allowed: &[StreamState]) -> Result<(), Error> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(Error::InvalidState {
            expected: allowed.first().copied().unwrap_or(StreamState::Unconfigured),
            found: self.state,
        })
    }

    fn layout(&self) -> Result<(&DmaRegion<'a>, &BufferSet), Error> {
        match (self.region.as_ref(), self.buffers.as_ref()) {
            (Some(region), Some(buffers)) => Ok((region, buffers)),
            _ => Err(Error::InvalidState {
                expected: StreamState::Configured,
                found: self.state,
            }),
        }
    }

}
