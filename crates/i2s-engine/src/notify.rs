//! Period completion notification.
//!
//! Written only by the period callback (interrupt context), read by the
//! consumer. The signal carries no payload; the half to process is derived
//! from the active-half index, which the callback flips before raising.
//!
//! ```text
//! callback n:   active = n & 1 ... wait()/try_take() -> ready half = active ^ 1
//! ```
//!
//! `Signal<CriticalSectionRawMutex, ()>` keeps the interrupt-side critical
//! section to a single word store.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Completion notification plus the state the consumer needs to find its half.
pub struct PeriodNotifier {
    signal: Signal<CriticalSectionRawMutex, ()>,
    active: AtomicU8,
    interrupts: AtomicU32,
}

impl PeriodNotifier {
    /// Notifier with index 0 active and no periods seen. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
            active: AtomicU8::new(0),
            interrupts: AtomicU32::new(0),
        }
    }

    /// Record one completed period: count it, flip the active half, signal.
    ///
    /// Called from the period callback only.
    pub fn raise(&self) {
        self.interrupts.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_xor(1, Ordering::AcqRel);
        self.signal.signal(());
    }

    /// Wait for the next completed period and return the half to process.
    pub async fn wait(&self) -> u8 {
        self.signal.wait().await;
        self.ready_half()
    }

    /// Non-blocking [`wait`](Self::wait).
    pub fn try_take(&self) -> Option<u8> {
        self.signal.try_take().map(|()| self.ready_half())
    }

    /// Half the DMA is working on now.
    pub fn active_half(&self) -> u8 {
        self.active.load(Ordering::Acquire)
    }

    /// Half that completed last and is safe for the consumer to touch.
    pub fn ready_half(&self) -> u8 {
        self.active_half() ^ 1
    }

    /// Periods completed since the last [`reset`](Self::reset). Wraps.
    pub fn interrupts(&self) -> u32 {
        self.interrupts.load(Ordering::Relaxed)
    }

    /// Clear the signal, the index and the counter.
    pub fn reset(&self) {
        self.signal.reset();
        self.active.store(0, Ordering::Release);
        self.interrupts.store(0, Ordering::Relaxed);
    }
}

impl Default for PeriodNotifier {
    fn default() -> Self {
        Self::new()
    }
}
