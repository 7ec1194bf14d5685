//! Mock implementations for testing
//!
//! Host-side stand-ins for every platform seam. Each mock is a cheap
//! cloneable handle over shared state, so a test can keep one clone for
//! assertions after moving the other into the engine.

#![cfg(any(test, feature = "std"))]
// Register file is a fixed array addressed through `index`.
#![allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::dma_region::WORD_BYTES;
use crate::*;

// ── PCM block ────────────────────────────────────────────────────────────────

/// Control/status register offset (BCM2835 layout).
const CS: u32 = 0x00;
/// FIFO data register offset.
const FIFO: u32 = 0x04;
/// Last register offset in the block (GRAY).
const LAST: u32 = 0x20;

const CS_SYNC: u32 = 1 << 24;
const CS_RXD: u32 = 1 << 20;
const CS_CLR: u32 = (1 << 4) | (1 << 3);

/// Register access fault raised by [`MockPcmBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBusError {
    /// Offset outside the register block or not word aligned
    BadOffset(u32),
    /// Fault injected with [`MockPcmBlock::fail_writes_to`]
    Injected(u32),
}

#[derive(Debug, Default)]
struct PcmState {
    regs: [u32; 9],
    /// CS reads until a written SYNC value shows up; `None` = never.
    sync_lag: Option<u32>,
    pending_sync: Option<(bool, u32)>,
    capture: VecDeque<u32>,
    fifo_writes: Vec<u32>,
    fifo_clears: Vec<u32>,
    writes: Vec<(u32, u32)>,
    fail_offset: Option<u32>,
}

/// BCM2835-style PCM/I²S register block.
///
/// Behaviour modelled:
/// - `CS.SYNC` echoes a written value after a configurable number of `CS`
///   reads (or never, to simulate a stopped bit clock)
/// - `CS.TXCLR` / `CS.RXCLR` self-clear; each clear request is recorded
/// - `CS.RXD` is set while scripted capture samples remain
/// - `FIFO` reads pop the capture script, `FIFO` writes are recorded
#[derive(Debug, Clone)]
pub struct MockPcmBlock {
    state: Rc<RefCell<PcmState>>,
}

impl MockPcmBlock {
    /// Register block whose SYNC echo arrives on the second `CS` read.
    pub fn new() -> Self {
        Self::with_sync_lag(Some(2))
    }

    /// Register block with an explicit SYNC echo lag (`None` never echoes).
    pub fn with_sync_lag(lag: Option<u32>) -> Self {
        let state = PcmState {
            sync_lag: lag,
            ..PcmState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Queue samples that will appear in the receive FIFO.
    pub fn script_capture(&self, samples: &[u32]) {
        self.state.borrow_mut().capture.extend(samples.iter().copied());
    }

    /// Scripted capture samples not yet read.
    pub fn capture_remaining(&self) -> usize {
        self.state.borrow().capture.len()
    }

    /// Make every write to `offset` fail.
    pub fn fail_writes_to(&self, offset: u32) {
        self.state.borrow_mut().fail_offset = Some(offset);
    }

    /// Current raw value of the register at `offset`.
    pub fn reg(&self, offset: u32) -> u32 {
        let state = self.state.borrow();
        index(offset)
            .and_then(|i| state.regs.get(i).copied())
            .unwrap_or_default()
    }

    /// Overwrite a register without going through the write path.
    pub fn poke(&self, offset: u32, value: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(slot) = index(offset).and_then(|i| state.regs.get_mut(i)) {
            *slot = value;
        }
    }

    /// Every register write in order, as `(offset, value)`.
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.state.borrow().writes.clone()
    }

    /// Writes that targeted `offset`, in order.
    pub fn writes_to(&self, offset: u32) -> Vec<u32> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Words written to the FIFO register.
    pub fn fifo_writes(&self) -> Vec<u32> {
        self.state.borrow().fifo_writes.clone()
    }

    /// `CS` clear bits seen in each clear request.
    pub fn fifo_clears(&self) -> Vec<u32> {
        self.state.borrow().fifo_clears.clone()
    }
}

impl Default for MockPcmBlock {
    fn default() -> Self {
        Self::new()
    }
}

fn index(offset: u32) -> Option<usize> {
    if offset % 4 != 0 || offset > LAST {
        return None;
    }
    usize::try_from(offset / 4).ok()
}

impl RegisterBus for MockPcmBlock {
    type Error = MockBusError;

    fn read(&mut self, offset: u32) -> Result<u32, Self::Error> {
        let i = index(offset).ok_or(MockBusError::BadOffset(offset))?;
        let mut state = self.state.borrow_mut();
        match offset {
            CS => {
                if let Some((level, remaining)) = state.pending_sync {
                    if remaining <= 1 {
                        state.pending_sync = None;
                        if level {
                            state.regs[0] |= CS_SYNC;
                        } else {
                            state.regs[0] &= !CS_SYNC;
                        }
                    } else {
                        state.pending_sync = Some((level, remaining - 1));
                    }
                }
                let rxd = if state.capture.is_empty() { 0 } else { CS_RXD };
                Ok(state.regs[0] | rxd)
            }
            FIFO => Ok(state.capture.pop_front().unwrap_or(0)),
            _ => Ok(state.regs.get(i).copied().unwrap_or_default()),
        }
    }

    fn write(&mut self, offset: u32, value: u32) -> Result<(), Self::Error> {
        let i = index(offset).ok_or(MockBusError::BadOffset(offset))?;
        let mut state = self.state.borrow_mut();
        if state.fail_offset == Some(offset) {
            return Err(MockBusError::Injected(offset));
        }
        state.writes.push((offset, value));
        match offset {
            CS => {
                if value & CS_CLR != 0 {
                    state.fifo_clears.push(value & CS_CLR);
                }
                let current_sync = state.regs[0] & CS_SYNC;
                let written_sync = value & CS_SYNC;
                if written_sync == current_sync {
                    state.pending_sync = None;
                } else if let Some(lag) = state.sync_lag {
                    if lag == 0 {
                        state.regs[0] ^= CS_SYNC;
                    } else {
                        state.pending_sync = Some((written_sync != 0, lag));
                    }
                }
                state.regs[0] = (value & !(CS_CLR | CS_SYNC | CS_RXD)) | (state.regs[0] & CS_SYNC);
            }
            FIFO => state.fifo_writes.push(value),
            _ => {
                if let Some(slot) = state.regs.get_mut(i) {
                    *slot = value;
                }
            }
        }
        Ok(())
    }
}

// ── DMA ──────────────────────────────────────────────────────────────────────

/// One call observed on a [`MockDmaChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmaOp {
    /// `slave_config`
    SlaveConfig(SlaveConfig),
    /// `prep_cyclic`
    Prep {
        /// Bus address of the buffer
        buf_addr: u32,
        /// Buffer length in bytes
        buf_len: usize,
        /// Period length in bytes
        period_len: usize,
        /// Flags passed
        flags: PrepFlags,
    },
    /// `submit`, with the cookie returned
    Submit(Cookie),
    /// `issue_pending`
    IssuePending,
    /// `terminate_async`
    Terminate,
    /// `synchronize`
    Synchronize,
}

/// A [`DmaOp`] tagged with the channel that saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmaEvent {
    /// Channel direction
    pub direction: TransferDirection,
    /// Operation
    pub op: DmaOp,
}

/// Ordered log shared by several channels.
#[derive(Debug, Clone, Default)]
pub struct DmaTrace {
    events: Rc<RefCell<Vec<DmaEvent>>>,
}

impl DmaTrace {
    /// Empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<DmaEvent> {
        self.events.borrow().clone()
    }

    /// All events as `(direction, op)` pairs.
    pub fn ops(&self) -> Vec<(TransferDirection, DmaOp)> {
        self.events
            .borrow()
            .iter()
            .map(|e| (e.direction, e.op.clone()))
            .collect()
    }

    /// Forget all events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, direction: TransferDirection, op: DmaOp) {
        self.events.borrow_mut().push(DmaEvent { direction, op });
    }
}

/// Error raised by an injected [`MockDmaChannel`] fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockDmaError {
    /// `slave_config` rejected
    SlaveConfig,
    /// `prep_cyclic` returned no descriptor
    Prep,
    /// `terminate_async` failed
    Terminate,
}

/// Descriptor handed out by [`MockDmaChannel::prep_cyclic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDescriptor {
    /// Sequence number within the channel
    pub id: u32,
}

#[derive(Debug)]
struct ChannelState {
    fail_slave_config: bool,
    fail_prep: bool,
    reject_submit: bool,
    fail_terminate: bool,
    status: DmaStatus,
    next_id: u32,
    next_cookie: i32,
    issued: bool,
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            fail_slave_config: false,
            fail_prep: false,
            reject_submit: false,
            fail_terminate: false,
            status: DmaStatus::InProgress,
            next_id: 0,
            next_cookie: 1,
            issued: false,
        }
    }
}

/// Cyclic DMA channel that records calls into a shared [`DmaTrace`].
#[derive(Debug, Clone)]
pub struct MockDmaChannel {
    direction: TransferDirection,
    trace: DmaTrace,
    state: Rc<RefCell<ChannelState>>,
}

impl MockDmaChannel {
    /// Channel for `direction` logging into `trace`.
    pub fn new(direction: TransferDirection, trace: &DmaTrace) -> Self {
        Self {
            direction,
            trace: trace.clone(),
            state: Rc::new(RefCell::new(ChannelState::default())),
        }
    }

    /// Fail the next and every later `slave_config`.
    pub fn fail_slave_config(&self) {
        self.state.borrow_mut().fail_slave_config = true;
    }

    /// Fail every `prep_cyclic`.
    pub fn fail_prep(&self) {
        self.state.borrow_mut().fail_prep = true;
    }

    /// Return a negative cookie from every `submit`.
    pub fn reject_submit(&self) {
        self.state.borrow_mut().reject_submit = true;
    }

    /// Fail every `terminate_async`.
    pub fn fail_terminate(&self) {
        self.state.borrow_mut().fail_terminate = true;
    }

    /// Drop every injected fault.
    pub fn clear_faults(&self) {
        let mut state = self.state.borrow_mut();
        state.fail_slave_config = false;
        state.fail_prep = false;
        state.reject_submit = false;
        state.fail_terminate = false;
    }

    /// Status reported by `tx_status` from now on.
    pub fn set_status(&self, status: DmaStatus) {
        self.state.borrow_mut().status = status;
    }

    /// `true` between `issue_pending` and `terminate_async`.
    pub fn is_running(&self) -> bool {
        self.state.borrow().issued
    }
}

impl CyclicDmaChannel for MockDmaChannel {
    type Error = MockDmaError;
    type Descriptor = MockDescriptor;

    fn slave_config(&mut self, config: &SlaveConfig) -> Result<(), Self::Error> {
        if self.state.borrow().fail_slave_config {
            return Err(MockDmaError::SlaveConfig);
        }
        self.trace.push(self.direction, DmaOp::SlaveConfig(*config));
        Ok(())
    }

    fn prep_cyclic(
        &mut self,
        buf_addr: u32,
        buf_len: usize,
        period_len: usize,
        _direction: TransferDirection,
        flags: PrepFlags,
    ) -> Result<Self::Descriptor, Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail_prep {
            return Err(MockDmaError::Prep);
        }
        self.trace.push(
            self.direction,
            DmaOp::Prep {
                buf_addr,
                buf_len,
                period_len,
                flags,
            },
        );
        let id = state.next_id;
        state.next_id = id.wrapping_add(1);
        Ok(MockDescriptor { id })
    }

    fn submit(&mut self, _descriptor: &Self::Descriptor) -> Cookie {
        let mut state = self.state.borrow_mut();
        let cookie = if state.reject_submit {
            Cookie(-1)
        } else {
            let c = state.next_cookie;
            state.next_cookie = c.wrapping_add(1);
            Cookie(c)
        };
        self.trace.push(self.direction, DmaOp::Submit(cookie));
        cookie
    }

    fn issue_pending(&mut self) {
        self.state.borrow_mut().issued = true;
        self.trace.push(self.direction, DmaOp::IssuePending);
    }

    fn terminate_async(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        self.trace.push(self.direction, DmaOp::Terminate);
        if state.fail_terminate {
            return Err(MockDmaError::Terminate);
        }
        state.issued = false;
        Ok(())
    }

    fn synchronize(&mut self) {
        self.trace.push(self.direction, DmaOp::Synchronize);
    }

    fn tx_status(&self, _cookie: Cookie) -> (DmaStatus, TxState) {
        (self.state.borrow().status, TxState::default())
    }
}

// ── Clock ────────────────────────────────────────────────────────────────────

/// Error raised by an injected [`MockClock`] fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockClockError;

#[derive(Debug, Default)]
struct ClockState {
    rate: Option<u32>,
    enabled: bool,
    fail_set_rate: bool,
    fail_enable: bool,
}

/// Bit-clock generator that records the requested rate.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    state: Rc<RefCell<ClockState>>,
}

impl MockClock {
    /// Clock with no rate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every `set_rate`.
    pub fn fail_set_rate(&self) {
        self.state.borrow_mut().fail_set_rate = true;
    }

    /// Reject every `prepare_enable`.
    pub fn fail_enable(&self) {
        self.state.borrow_mut().fail_enable = true;
    }

    /// Last accepted rate.
    pub fn rate(&self) -> Option<u32> {
        self.state.borrow().rate
    }

    /// `true` once `prepare_enable` succeeded.
    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }
}

impl AudioClock for MockClock {
    type Error = MockClockError;

    fn set_rate(&mut self, hz: u32) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail_set_rate {
            return Err(MockClockError);
        }
        state.rate = Some(hz);
        Ok(())
    }

    fn prepare_enable(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.fail_enable {
            return Err(MockClockError);
        }
        state.enabled = true;
        Ok(())
    }
}

// ── Gates ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct GateState {
    inputs: u32,
    outputs: Vec<u32>,
    claimed: bool,
}

/// Gate lines with settable inputs and recorded outputs.
#[derive(Debug, Clone, Default)]
pub struct MockGates {
    state: Rc<RefCell<GateState>>,
}

impl MockGates {
    /// Unclaimed gates, all inputs low.
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of the input lines from now on.
    pub fn set_inputs(&self, bits: u32) {
        self.state.borrow_mut().inputs = bits;
    }

    /// Every output word driven so far.
    pub fn outputs(&self) -> Vec<u32> {
        self.state.borrow().outputs.clone()
    }

    /// `true` between `claim` and `release`.
    pub fn is_claimed(&self) -> bool {
        self.state.borrow().claimed
    }
}

impl GateLines for MockGates {
    type Error = core::convert::Infallible;

    fn claim(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().claimed = true;
        Ok(())
    }

    fn release(&mut self) {
        self.state.borrow_mut().claimed = false;
    }

    fn read_digital_inputs(&mut self) -> u32 {
        self.state.borrow().inputs
    }

    fn write_digital_outputs(&mut self, value: u32) {
        self.state.borrow_mut().outputs.push(value);
    }
}

// ── Coherent memory ──────────────────────────────────────────────────────────

/// Error returned by [`MockAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockAllocError {
    /// Backing store too small
    Exhausted {
        /// Bytes requested
        requested: usize,
        /// Bytes left
        available: usize,
    },
    /// Fault injected with [`MockAllocator::refuse`]
    Refused,
}

/// Bump allocator carving [`DmaRegion`]s out of a borrowed word slice.
#[derive(Debug)]
pub struct MockAllocator<'a> {
    free: &'a mut [u32],
    next_bus: u32,
    refuse: bool,
}

impl<'a> MockAllocator<'a> {
    /// Allocator over `backing`, handing out bus addresses from `bus_base`.
    pub fn new(backing: &'a mut [u32], bus_base: u32) -> Self {
        Self {
            free: backing,
            next_bus: bus_base,
            refuse: false,
        }
    }

    /// Fail every later allocation.
    pub fn refuse(&mut self) {
        self.refuse = true;
    }
}

impl<'a> CoherentAllocator<'a> for MockAllocator<'a> {
    type Error = MockAllocError;

    fn alloc_coherent(&mut self, bytes: usize) -> Result<DmaRegion<'a>, Self::Error> {
        if self.refuse {
            return Err(MockAllocError::Refused);
        }
        let words = bytes.div_ceil(WORD_BYTES);
        if words > self.free.len() {
            return Err(MockAllocError::Exhausted {
                requested: bytes,
                available: self.free.len().saturating_mul(WORD_BYTES),
            });
        }
        let free = core::mem::take(&mut self.free);
        let (head, tail) = free.split_at_mut(words);
        self.free = tail;
        head.fill(0);
        let bus_addr = self.next_bus;
        let span = u32::try_from(words.saturating_mul(WORD_BYTES)).unwrap_or(u32::MAX);
        self.next_bus = self.next_bus.saturating_add(span);
        Ok(DmaRegion::from_slice(head, bus_addr))
    }
}
