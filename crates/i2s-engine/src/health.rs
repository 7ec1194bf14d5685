//! Steady-state stream health.
//!
//! Errors seen inside the period callback cannot be returned to anyone, so
//! they are counted here and the stream keeps running. The callback is the
//! only writer; counters are atomics so it records through `&self` while the
//! owner reads them. Counters saturate at `u16::MAX` rather than wrap.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::dma::Direction;

/// Per-direction DMA error counters.
#[derive(Debug, Default)]
pub struct StreamHealth {
    capture_errors: AtomicU16,
    playback_errors: AtomicU16,
}

impl StreamHealth {
    /// No errors recorded.
    pub const fn new() -> Self {
        Self {
            capture_errors: AtomicU16::new(0),
            playback_errors: AtomicU16::new(0),
        }
    }

    fn counter(&self, direction: Direction) -> &AtomicU16 {
        match direction {
            Direction::Capture => &self.capture_errors,
            Direction::Playback => &self.playback_errors,
        }
    }

    /// Count one DMA error on `direction`.
    pub fn record_dma_error(&self, direction: Direction) {
        // Err means the counter is already saturated.
        let _ = self
            .counter(direction)
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1));
    }

    /// Errors recorded on `direction`.
    pub fn dma_errors(&self, direction: Direction) -> u16 {
        self.counter(direction).load(Ordering::Relaxed)
    }

    /// `true` if no error has been recorded.
    pub fn is_healthy(&self) -> bool {
        self.dma_errors(Direction::Capture) == 0 && self.dma_errors(Direction::Playback) == 0
    }

    /// Forget all recorded errors.
    pub fn reset(&self) {
        self.capture_errors.store(0, Ordering::Relaxed);
        self.playback_errors.store(0, Ordering::Relaxed);
    }
}
