//! Hardware Abstraction Layer (HAL) for the I2S transfer engine
//!
//! This crate provides trait-based abstractions for every piece of hardware
//! the transfer engine touches, enabling development and testing without the
//! physical PCM block or DMA controller.
//!
//! # Architecture Layers
//!
//! ```text
//! Consumer (real-time audio process)
//!         ↓
//! Transfer engine (i2s-engine crate)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (MMIO, DMA engine, clock framework, GPIO)
//! ```
//!
//! # Seams
//!
//! - [`RegisterBus`] - 32-bit register access to the PCM block
//! - [`CyclicDmaChannel`] - cyclic slave DMA (one per direction)
//! - [`AudioClock`] - bit-clock generator
//! - [`GateLines`] - CV/gate digital I/O side channel
//! - [`CoherentAllocator`] / [`DmaRegion`] - DMA-coherent memory
//!
//! # Features
//!
//! - `std`: Enable standard library support and the [`mocks`] module
//! - `defmt`: Enable `defmt::Format` derives

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors; callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod audio_types;
pub mod clock;
pub mod dma;
pub mod dma_region;
pub mod gpio;
pub mod mmio;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use audio_types::{ChannelCount, OutOfRangeError, PeriodFrames, SampleRateHz};
pub use clock::{AudioClock, ExternalClock};
pub use dma::{
    BusWidth, Cookie, CyclicDmaChannel, DmaStatus, PrepFlags, SlaveConfig, TransferDirection,
    TxState,
};
pub use dma_region::{CoherentAllocator, DmaRegion, RegionError};
pub use gpio::{GateError, GateLines, NoGates, PinGates};
pub use mmio::{MmioBus, RegisterBus};
