//! Bit-clock generator abstraction

/// Clock that drives the PCM bit clock when the PCM block is clock master.
pub trait AudioClock {
    /// Error type
    type Error: core::fmt::Debug;

    /// Request `hz` as the clock rate. The hardware may round.
    fn set_rate(&mut self, hz: u32) -> Result<(), Self::Error>;

    /// Prepare and ungate the clock.
    fn prepare_enable(&mut self) -> Result<(), Self::Error>;
}

/// Clock for boards where the codec supplies the bit clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalClock;

impl AudioClock for ExternalClock {
    type Error = core::convert::Infallible;

    fn set_rate(&mut self, _hz: u32) -> Result<(), Self::Error> {
        Ok(())
    }

    fn prepare_enable(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
