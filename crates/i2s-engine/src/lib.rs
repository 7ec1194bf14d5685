//! Double-buffered I2S transfer engine for the BCM2835 PCM block
//!
//! Moves interleaved 32-bit multichannel audio between the PCM FIFOs and a
//! pair of memory buffers using one cyclic DMA channel per direction. Each
//! buffer is split into two periods; the DMA completion callback flips the
//! active half and signals the consumer, which processes the other half.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────── Device ────────────────────┐
//!  consumer ◄─notify─┤ PeriodNotifier ◄── on_period_complete ◄── DMA  │
//!  (AudioSession)    │ StreamHealth ◄──────────┘  (&self)             │
//!                    │ RegMap ── configurator / fifo / frame_sync     │
//!                    │ CyclicDma (RX, TX)          gate words ──┐     │
//!                    └──────────────────────────────────────────┼─────┘
//!                                      ↓                        ↓
//!                          platform traits (HAL)      GateRelay (optional,
//!                                                     owned by the interrupt)
//! ```
//!
//! # Buffer layout
//!
//! ```text
//! 0            buffer_len         2·buffer_len      +4        +8
//! ├─ capture ─┬─┤─ playback ─┬─┤─ gate out ─┤─ gate in ─┤
//!   half 0  half 1  half 0  half 1
//! ```
//!
//! # Features
//!
//! - `std`: `std::error::Error` for [`Error`], platform mocks
//! - `defmt`: target logging and `defmt::Format` derives
//! - `tracing`: host logging

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
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![allow(clippy::doc_markdown)] // register names in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Must come first: the logging macros are textually scoped.
#[macro_use]
mod fmt;

pub mod buffers;
pub mod config;
pub mod configurator;
pub mod coordinator;
pub mod dma;
pub mod error;
pub mod fifo;
pub mod frame_sync;
pub mod gate_relay;
pub mod health;
pub mod notify;
pub mod profile;
pub mod registers;
pub mod regmap;
pub mod session;

pub use buffers::{BufferSet, Span};
pub use config::DeviceConfig;
pub use coordinator::{Command, Device, StreamState};
pub use dma::Direction;
pub use error::{Error, ErrorKind};
pub use fifo::ClearOutcome;
pub use frame_sync::SyncReport;
pub use gate_relay::{GateRelay, GateWords};
pub use health::StreamHealth;
pub use notify::PeriodNotifier;
pub use profile::{HardwareProfile, ProfileParams};
pub use session::{AudioSession, ChannelInfo};
