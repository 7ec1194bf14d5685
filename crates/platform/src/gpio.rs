//! CV/gate digital I/O lines
//!
//! Some boards route a handful of GPIOs next to the codec as CV gates. The
//! transfer engine mirrors them once per period: bit *i* of the "gate out"
//! word drives output *i*, bit *i* of the "gate in" word reflects input *i*.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Maximum number of gate lines per direction (one bit each in a `u32`).
pub const MAX_GATES: usize = 32;

/// Bit-mapped group of gate lines.
///
/// `read_digital_inputs` and `write_digital_outputs` run in the period
/// callback and therefore cannot fail: a line that cannot be read reads as
/// low, a line that cannot be driven keeps its previous state.
pub trait GateLines {
    /// Error type
    type Error: core::fmt::Debug;

    /// Acquire the lines and drive every output low.
    fn claim(&mut self) -> Result<(), Self::Error>;

    /// Drive every output low and hand the lines back.
    fn release(&mut self);

    /// Sample all inputs; bit *i* is input *i*.
    fn read_digital_inputs(&mut self) -> u32;

    /// Drive all outputs; bit *i* drives output *i*.
    fn write_digital_outputs(&mut self, value: u32);
}

/// Gate lines for boards without a CV/gate header.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGates;

impl GateLines for NoGates {
    type Error = core::convert::Infallible;

    fn claim(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn release(&mut self) {}

    fn read_digital_inputs(&mut self) -> u32 {
        0
    }

    fn write_digital_outputs(&mut self, _value: u32) {}
}

/// Errors raised while claiming pin-backed gate lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GateError {
    /// More lines than fit in a 32-bit word
    TooManyLines,
    /// An output could not be driven to its initial level
    Output(usize),
}

/// [`GateLines`] over `embedded-hal` digital pins.
pub struct PinGates<I, O, const NI: usize, const NO: usize> {
    inputs: [I; NI],
    outputs: [O; NO],
}

impl<I, O, const NI: usize, const NO: usize> PinGates<I, O, NI, NO>
where
    I: InputPin,
    O: OutputPin,
{
    /// Group `inputs` and `outputs`; index in the array is the bit number.
    pub fn new(inputs: [I; NI], outputs: [O; NO]) -> Self {
        Self { inputs, outputs }
    }

    /// Give the pins back.
    pub fn free(self) -> ([I; NI], [O; NO]) {
        (self.inputs, self.outputs)
    }

    fn drive_all_low(&mut self) -> Result<(), GateError> {
        for (i, pin) in self.outputs.iter_mut().enumerate() {
            pin.set_low().map_err(|_| GateError::Output(i))?;
        }
        Ok(())
    }
}

impl<I, O, const NI: usize, const NO: usize> GateLines for PinGates<I, O, NI, NO>
where
    I: InputPin,
    O: OutputPin,
{
    type Error = GateError;

    fn claim(&mut self) -> Result<(), Self::Error> {
        if NI > MAX_GATES || NO > MAX_GATES {
            return Err(GateError::TooManyLines);
        }
        self.drive_all_low()
    }

    fn release(&mut self) {
        let _ = self.drive_all_low();
    }

    #[allow(clippy::arithmetic_side_effects)] // Safety: shift amount < MAX_GATES = 32
    fn read_digital_inputs(&mut self) -> u32 {
        self.inputs
            .iter_mut()
            .take(MAX_GATES)
            .enumerate()
            .fold(0, |acc, (i, pin)| match pin.is_high() {
                Ok(true) => acc | (1 << i),
                _ => acc,
            })
    }

    #[allow(clippy::arithmetic_side_effects)] // Safety: shift amount < MAX_GATES = 32
    fn write_digital_outputs(&mut self, value: u32) {
        for (i, pin) in self.outputs.iter_mut().take(MAX_GATES).enumerate() {
            let _ = pin.set_state(PinState::from(value & (1 << i) != 0));
        }
    }
}
