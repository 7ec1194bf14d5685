//! End-to-end scenarios against the host mocks.
//!
//! A: slave profile, no capture alignment, first notification after exactly
//!    one period of frames.
//! B: bit-clock-provider profile, PCM drives both clocks and the capture
//!    stream is aligned on start.
//! C: capture descriptor allocation fails during setup.
// Integration test file: unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use i2s_engine::config::RESERVED_BUFFER_BYTES;
use i2s_engine::fifo::prime_words;
use i2s_engine::registers::{CS_A, CS_RXTX_ON, MODE_A, MODE_CLKI, MODE_CLKM, MODE_FSI, MODE_FSM};
use i2s_engine::{
    Command, Device, DeviceConfig, Direction, Error, ErrorKind, PeriodNotifier, StreamState,
};
use platform::mocks::{DmaOp, DmaTrace, MockAllocator, MockClock, MockDmaChannel, MockPcmBlock};
use platform::TransferDirection::{DevToMem as Rx, MemToDev as Tx};

type MockDevice<'a> = Device<'a, MockPcmBlock, MockDmaChannel, MockClock>;

struct Rig {
    pcm: MockPcmBlock,
    rx: MockDmaChannel,
    clock: MockClock,
    trace: DmaTrace,
}

fn rig<'a>(notifier: &'a PeriodNotifier) -> (MockDevice<'a>, Rig) {
    let trace = DmaTrace::new();
    let rig = Rig {
        pcm: MockPcmBlock::new(),
        rx: MockDmaChannel::new(Rx, &trace),
        clock: MockClock::new(),
        trace: trace.clone(),
    };
    let device = Device::new(
        rig.pcm.clone(),
        rig.rx.clone(),
        MockDmaChannel::new(Tx, &trace),
        rig.clock.clone(),
        notifier,
        DeviceConfig::default(),
    );
    (device, rig)
}

/// Bit clock model: one callback per `period_frames` frames.
struct FrameClock {
    period_frames: u32,
    frames: u32,
}

impl FrameClock {
    fn new(period_frames: u32) -> Self {
        Self {
            period_frames,
            frames: 0,
        }
    }

    fn tick(&mut self, device: &MockDevice<'_>, frames: u32) {
        for _ in 0..frames {
            self.frames += 1;
            if self.frames % self.period_frames == 0 {
                device.on_period_complete();
            }
        }
    }
}

#[test]
fn scenario_a_slave_profile_streams_without_alignment() {
    let mut memory = vec![0u32; RESERVED_BUFFER_BYTES / 4];
    let notifier = PeriodNotifier::new();
    let (mut device, rig) = rig(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0x3b40_0000);

    device.init("default", &mut alloc).unwrap();
    device.buffers_setup(64, 2).unwrap();

    let buffers = *device.buffers().unwrap();
    assert_eq!(buffers.period_len(), 512);
    assert_eq!(buffers.buffer_len(), 1024);
    assert_eq!(buffers.playback().offset, buffers.capture().offset + 1024);

    // Anything left in the RX FIFO must not be drained on start.
    rig.pcm.script_capture(&[1, 2, 3]);
    device.start_stop(Command::Start).unwrap();
    assert_eq!(device.state(), StreamState::Streaming);
    assert!(device.last_sync().is_none());
    assert_eq!(rig.pcm.capture_remaining(), 3);
    assert_eq!(rig.pcm.reg(CS_A) & CS_RXTX_ON, CS_RXTX_ON);

    let mut clock = FrameClock::new(64);
    clock.tick(&device, 63);
    assert_eq!(notifier.try_take(), None);
    clock.tick(&device, 1);
    assert_eq!(notifier.try_take(), Some(0));

    clock.tick(&device, 64);
    assert_eq!(notifier.try_take(), Some(1));
    assert_eq!(notifier.interrupts(), 2);

    // Slave profile never touches the clock generator.
    assert_eq!(rig.clock.rate(), None);
    assert!(!rig.clock.is_enabled());
}

#[test]
fn scenario_b_clock_provider_aligns_capture_on_start() {
    let mut memory = vec![0u32; RESERVED_BUFFER_BYTES / 4];
    let notifier = PeriodNotifier::new();
    let (mut device, rig) = rig(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);

    device.init("bit-clock-provider", &mut alloc).unwrap();
    device.buffers_setup(64, 2).unwrap();

    let mode = rig.pcm.reg(MODE_A);
    assert_eq!(mode & (MODE_CLKM | MODE_FSM), 0, "PCM must drive both clocks");
    assert_eq!(mode & (MODE_CLKI | MODE_FSI), MODE_CLKI | MODE_FSI);
    assert_eq!(rig.clock.rate(), Some(64 * 48_000));
    assert!(rig.clock.is_enabled());

    // Zero pair at 1-based positions N = 5 and N + 1 = 6.
    rig.pcm.script_capture(&[0x1234, 0, 0x00ff_0000, 7, 0, 0, 0xabcd, 0]);
    let fifo_writes_before = rig.pcm.fifo_writes().len();

    device.start_stop(Command::Start).unwrap();

    let report = device.last_sync().unwrap();
    assert_eq!(report.discarded, 6);
    assert_eq!(report.samples.as_slice(), &[0x1234, 0, 0x00ff_0000, 7, 0, 0]);
    assert_eq!(rig.pcm.capture_remaining(), 2);
    // One silent TX word per discarded sample keeps the frame clock running.
    assert_eq!(rig.pcm.fifo_writes().len() - fifo_writes_before, 6);
    assert_eq!(rig.pcm.reg(CS_A) & CS_RXTX_ON, CS_RXTX_ON);
    assert_eq!(device.state(), StreamState::Streaming);
}

#[test]
fn scenario_b_alignment_timeout_leaves_device_configured() {
    let mut memory = vec![0u32; RESERVED_BUFFER_BYTES / 4];
    let notifier = PeriodNotifier::new();
    let trace = DmaTrace::new();
    let pcm = MockPcmBlock::new();
    let config = DeviceConfig {
        frame_sync_polls: 16,
        ..DeviceConfig::default()
    };
    let mut device = Device::new(
        pcm.clone(),
        MockDmaChannel::new(Rx, &trace),
        MockDmaChannel::new(Tx, &trace),
        MockClock::new(),
        &notifier,
        config,
    );
    let mut alloc = MockAllocator::new(&mut memory, 0);
    device.init("hifi-berry", &mut alloc).unwrap();
    device.buffers_setup(32, 2).unwrap();

    pcm.script_capture(&[1; 64]);
    let err = device.start_stop(Command::Start).unwrap_err();

    assert_eq!(err, Error::SynchronizationTimeout { discarded: 16 });
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(device.state(), StreamState::Configured);
    assert_eq!(pcm.reg(CS_A) & CS_RXTX_ON, 0);
}

#[test]
fn scenario_c_capture_descriptor_failure_is_a_resource_error() {
    let mut memory = vec![0u32; RESERVED_BUFFER_BYTES / 4];
    let notifier = PeriodNotifier::new();
    let (mut device, rig) = rig(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    device.init("default", &mut alloc).unwrap();

    rig.rx.fail_prep();
    let err = device.buffers_setup(64, 2).unwrap_err();

    assert_eq!(err, Error::Descriptor(Direction::Capture));
    assert_eq!(err.kind(), ErrorKind::Resource);
    assert_eq!(device.state(), StreamState::Unconfigured);

    let ops = rig.trace.ops();
    assert!(
        !ops.iter()
            .any(|(dir, op)| *dir == Tx && matches!(op, DmaOp::Prep { .. } | DmaOp::Submit(_))),
        "TX must never be prepared or submitted: {ops:?}"
    );
    assert!(!ops.iter().any(|(_, op)| matches!(op, DmaOp::IssuePending)));
}

#[test]
fn setup_primes_threshold_plus_channels_silent_words() {
    let mut memory = vec![0u32; RESERVED_BUFFER_BYTES / 4];
    let notifier = PeriodNotifier::new();
    let (mut device, rig) = rig(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    device.init("default", &mut alloc).unwrap();
    device.buffers_setup(128, 8).unwrap();

    let primed = rig.pcm.fifo_writes();
    assert_eq!(primed.len(), prime_words(8) as usize);
    assert!(primed.iter().all(|w| *w == 0));
    assert_eq!(rig.pcm.fifo_clears().len(), 1);
}
