//! Consumer session: period handshake, under-run accounting and close.
// Integration test file: unwrap/panic are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use i2s_engine::config::RESERVED_BUFFER_BYTES;
use i2s_engine::{AudioSession, Device, DeviceConfig, Direction, PeriodNotifier, StreamState};
use platform::mocks::{DmaTrace, MockAllocator, MockClock, MockDmaChannel, MockPcmBlock};
use platform::TransferDirection::{DevToMem as Rx, MemToDev as Tx};

type MockDevice<'a> = Device<'a, MockPcmBlock, MockDmaChannel, MockClock>;

const WORDS: usize = RESERVED_BUFFER_BYTES / 4;

fn device(notifier: &PeriodNotifier) -> MockDevice<'_> {
    let trace = DmaTrace::new();
    Device::new(
        MockPcmBlock::new(),
        MockDmaChannel::new(Rx, &trace),
        MockDmaChannel::new(Tx, &trace),
        MockClock::new(),
        notifier,
        DeviceConfig::default(),
    )
}

#[tokio::test]
async fn wait_returns_the_half_the_dma_just_left() {
    let mut memory = vec![0u32; WORDS];
    let notifier = PeriodNotifier::new();
    let mut dev = device(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    dev.init("default", &mut alloc).unwrap();

    let mut session = AudioSession::open(&mut dev, 64, 2).unwrap();
    session.start(&mut dev).unwrap();
    assert_eq!(dev.state(), StreamState::Streaming);

    dev.on_period_complete();
    assert_eq!(session.wait_period().await, 0);
    session.finish_period();

    dev.on_period_complete();
    assert_eq!(session.wait_period().await, 1);
    session.finish_period();

    assert_eq!(session.underruns(), 0);
}

#[tokio::test]
async fn periods_completed_during_processing_are_underruns() {
    let mut memory = vec![0u32; WORDS];
    let notifier = PeriodNotifier::new();
    let mut dev = device(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    dev.init("default", &mut alloc).unwrap();

    let mut session = AudioSession::open(&mut dev, 32, 2).unwrap();
    session.start(&mut dev).unwrap();

    dev.on_period_complete();
    session.wait_period().await;
    // Consumer is slow: two more periods complete before it finishes.
    dev.on_period_complete();
    dev.on_period_complete();
    session.finish_period();
    assert_eq!(session.underruns(), 2);

    // Catching up resets the reference point. Three flips leave half 0 ready.
    assert_eq!(session.try_period(), Some(0));
    session.finish_period();
    assert_eq!(session.underruns(), 2);
}

#[test]
fn try_period_without_completion_is_none() {
    let mut memory = vec![0u32; WORDS];
    let notifier = PeriodNotifier::new();
    let mut dev = device(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    dev.init("default", &mut alloc).unwrap();

    let mut session = AudioSession::open(&mut dev, 16, 1).unwrap();
    assert_eq!(session.try_period(), None);

    dev.on_period_complete();
    assert_eq!(session.wait_period_blocking(), 0);
}

#[test]
fn open_resets_a_stale_notification() {
    let mut memory = vec![0u32; WORDS];
    let notifier = PeriodNotifier::new();
    notifier.raise();
    let mut dev = device(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    dev.init("default", &mut alloc).unwrap();

    let mut session = AudioSession::open(&mut dev, 64, 8).unwrap();
    assert_eq!(session.try_period(), None);
    assert_eq!(notifier.interrupts(), 0);
}

#[test]
fn channel_tables_match_the_geometry() {
    let mut memory = vec![0u32; WORDS];
    let notifier = PeriodNotifier::new();
    let mut dev = device(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    dev.init("default", &mut alloc).unwrap();

    let session = AudioSession::open(&mut dev, 64, 4).unwrap();
    let inputs = session.input_channels();
    let outputs = session.output_channels();

    assert_eq!(inputs.len(), 4);
    assert_eq!(outputs.len(), 4);
    assert_eq!(inputs[2].name.as_str(), "IN-2");
    assert_eq!(outputs[3].name.as_str(), "OUT-3");
    assert_eq!(outputs[3].direction, Direction::Playback);
    assert!(outputs.iter().all(|c| c.stride == 4));
    assert_eq!(
        outputs.iter().map(|c| c.start_offset).collect::<Vec<_>>(),
        [0, 1, 2, 3]
    );
}

#[test]
fn open_with_bad_geometry_fails() {
    let mut memory = vec![0u32; WORDS];
    let notifier = PeriodNotifier::new();
    let mut dev = device(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    dev.init("default", &mut alloc).unwrap();

    assert!(AudioSession::open(&mut dev, 48, 2).is_err());
    assert!(AudioSession::open(&mut dev, 64, 9).is_err());
    assert_eq!(dev.state(), StreamState::Unconfigured);
}

#[tokio::test]
async fn close_silences_playback_once_the_consumer_ran() {
    let mut memory = vec![0u32; WORDS];
    let notifier = PeriodNotifier::new();
    let mut dev = device(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    dev.init("default", &mut alloc).unwrap();

    // 16 frames x 2 channels: 32-word halves, playback at word 64.
    let mut session = AudioSession::open(&mut dev, 16, 2).unwrap();
    session.start(&mut dev).unwrap();
    dev.on_period_complete();
    let half = session.wait_period().await;
    dev.write_playback(half, &[0x7fff_ffff; 32]).unwrap();
    session.finish_period();

    session.close(&mut dev).unwrap();
    assert_eq!(dev.state(), StreamState::Stopped);
    drop(dev);
    drop(alloc);

    assert!(memory[64..128].iter().all(|w| *w == 0));
}

#[test]
fn close_without_waiting_leaves_playback_alone() {
    let mut memory = vec![0u32; WORDS];
    let notifier = PeriodNotifier::new();
    let mut dev = device(&notifier);
    let mut alloc = MockAllocator::new(&mut memory, 0);
    dev.init("default", &mut alloc).unwrap();

    let session = AudioSession::open(&mut dev, 16, 2).unwrap();
    dev.write_playback(0, &[5; 32]).unwrap();
    session.close(&mut dev).unwrap();
    drop(dev);
    drop(alloc);

    assert!(memory[64..96].iter().all(|w| *w == 5));
}
