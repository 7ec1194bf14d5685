//! CV/gate side channel.
//!
//! Once per period the gate-out word at the tail of the DMA region is
//! driven onto the gate outputs and the gate inputs are sampled into the
//! gate-in word. Inert unless enabled in [`DeviceConfig`](crate::config::DeviceConfig).
//!
//! The relay is owned by the interrupt binding, next to the device it
//! serves, and runs right after the period callback:
//!
//! ```text
//! device.on_period_complete();
//! if let Ok(words) = device.gate_words() {
//!     relay.relay(&words);
//! }
//! ```

use platform::{DmaRegion, GateLines};

use crate::buffers::BufferSet;
use crate::error::Error;

/// Gate-out and gate-in words of one buffer layout.
///
/// Obtained from [`Device::gate_words`](crate::coordinator::Device::gate_words);
/// fetch it again after `buffers_setup` changes the geometry.
#[derive(Debug, Clone, Copy)]
pub struct GateWords<'r, 'a> {
    region: &'r DmaRegion<'a>,
    output: usize,
    input: usize,
}

impl<'r, 'a> GateWords<'r, 'a> {
    /// Gate words of `buffers` inside `region`.
    pub fn new(region: &'r DmaRegion<'a>, buffers: &BufferSet) -> Self {
        Self {
            region,
            output: buffers.gate_out(),
            input: buffers.gate_in(),
        }
    }

    /// Current gate-out word.
    pub fn output(&self) -> Result<u32, Error> {
        Ok(self.region.read_word(self.output)?)
    }

    /// Replace the gate-out word.
    pub fn set_output(&self, value: u32) -> Result<(), Error> {
        Ok(self.region.write_word(self.output, value)?)
    }

    /// Gate-in word sampled on the last relay.
    pub fn input(&self) -> Result<u32, Error> {
        Ok(self.region.read_word(self.input)?)
    }
}

/// Optional relay between the gate words and the gate lines.
pub struct GateRelay<G> {
    gates: G,
    enabled: bool,
    claimed: bool,
}

impl<G: GateLines> GateRelay<G> {
    /// Relay over `gates`, active only when `enabled`.
    pub fn new(gates: G, enabled: bool) -> Self {
        Self {
            gates,
            enabled,
            claimed: false,
        }
    }

    /// `true` when the relay runs in the period callback.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `true` while the gate lines are held.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Claim the gate lines. No-op when disabled or already claimed.
    pub fn claim(&mut self) -> Result<(), Error> {
        if !self.enabled || self.claimed {
            return Ok(());
        }
        self.gates.claim().map_err(|_| {
            error!("gate lines could not be claimed");
            Error::Gate
        })?;
        self.claimed = true;
        Ok(())
    }

    /// Release the gate lines if claimed.
    pub fn release(&mut self) {
        if self.claimed {
            self.gates.release();
            self.claimed = false;
        }
    }

    /// Mirror the gate words once. Called after the period callback.
    pub fn relay(&mut self, words: &GateWords<'_, '_>) {
        if !self.claimed {
            return;
        }
        if let Ok(out) = words.output() {
            self.gates.write_digital_outputs(out);
        }
        let inputs = self.gates.read_digital_inputs();
        let _ = words.region.write_word(words.input, inputs);
    }

    /// Borrow the gate lines.
    pub fn gates(&self) -> &G {
        &self.gates
    }

    /// Give the gate lines back.
    pub fn into_inner(self) -> G {
        self.gates
    }
}
