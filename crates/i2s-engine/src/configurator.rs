//! PCM block configuration sequence.
//!
//! ```text
//! clear_registers -> configure -> enable
//! ```
//!
//! Register writes are not read back. The only failure tolerated inside the
//! sequence is the clock generator refusing a rate or enable request; that is
//! logged and streaming proceeds at whatever rate the hardware settled on.

use platform::{AudioClock, RegisterBus};

use crate::error::Error;
use crate::profile::{ProfileParams, SLOT_BITS};
use crate::registers::{
    ch1, ch1_pos, ch2, ch2_pos, chwid, cs_rxthr, cs_txthr, dreq_rx, dreq_rx_panic, dreq_tx,
    dreq_tx_panic, mode_flen, mode_fslen, CHEN, CHWEX, CONFIG_REGISTERS, CS_A, CS_DMAEN, CS_EN,
    CS_RXON, CS_STBY, CS_TXON, DREQ_A, INTEN_A, INT_RXERR, INT_TXERR, MODE_A, MODE_CLKDIS,
    MODE_CLKI, MODE_CLKM, MODE_FSI, MODE_FSM, RXC_A, RX_PANIC_THR, THR_RX, THR_TX, TXC_A,
    TX_PANIC_THR,
};
use crate::regmap::RegMap;

/// Channel format shared by both slots and both directions: 32-bit words.
pub const CHANNEL_FORMAT: u32 = CHEN | CHWEX | chwid(SLOT_BITS - 8);

/// Zero every configuration register.
pub fn clear_registers<B: RegisterBus>(regs: &mut RegMap<B>) -> Result<(), Error> {
    for reg in CONFIG_REGISTERS {
        regs.write(reg, 0)?;
    }
    Ok(())
}

/// MODE register value for `params`, excluding clock-provider bits set by
/// [`configure`] itself.
pub fn mode_word(params: &ProfileParams) -> u32 {
    let mut mode = mode_flen(params.frame_len.saturating_sub(1)) | mode_fslen(params.fs_len);
    if !params.bclk_master {
        mode |= MODE_CLKDIS | MODE_CLKM | MODE_CLKI;
    }
    if !params.fs_master {
        mode |= MODE_FSM;
    }
    // Inverted frame sync: channel 0 is the low half of the frame.
    mode | MODE_FSI
}

/// RXC/TXC register value for `params`.
pub fn channel_word(params: &ProfileParams) -> u32 {
    ch1(CHANNEL_FORMAT) | ch2(CHANNEL_FORMAT) | ch1_pos(params.ch1_pos) | ch2_pos(params.ch2_pos)
}

/// Program frame format, clocking, DMA thresholds and panic levels.
pub fn configure<B: RegisterBus, C: AudioClock>(
    regs: &mut RegMap<B>,
    params: &ProfileParams,
    clock: &mut C,
) -> Result<(), Error> {
    let mut mode = 0;
    if params.bclk_master {
        if let Some(rate) = params.bclk_rate {
            if clock.set_rate(rate).is_err() {
                warn!("bit clock rate {} Hz rejected, continuing", rate);
            }
        }
        if clock.prepare_enable().is_err() {
            warn!("bit clock enable failed, continuing");
        }
        mode = MODE_CLKI;
    }
    mode |= mode_word(params);

    let channels = channel_word(params);
    regs.write(MODE_A, mode)?;
    regs.write(RXC_A, channels)?;
    regs.write(TXC_A, channels)?;

    regs.update_bits(MODE_A, MODE_CLKDIS, 0)?;

    let thresholds = cs_rxthr(1) | cs_txthr(1) | CS_DMAEN;
    regs.update_bits(CS_A, thresholds, thresholds)?;

    let dreq = dreq_tx_panic(TX_PANIC_THR)
        | dreq_rx_panic(RX_PANIC_THR)
        | dreq_tx(THR_TX)
        | dreq_rx(THR_RX);
    regs.update_bits(DREQ_A, dreq, dreq)?;

    debug!("PCM configured: mode {:#x}, channels {:#x}", mode, channels);
    Ok(())
}

/// Leave standby, unmask the FIFO error interrupts, enable the block.
pub fn enable<B: RegisterBus>(regs: &mut RegMap<B>) -> Result<(), Error> {
    regs.update_bits(CS_A, CS_STBY, CS_STBY)?;
    regs.write(INTEN_A, INT_TXERR | INT_RXERR)?;
    regs.update_bits(CS_A, CS_EN, CS_EN)
}

/// Stop both directions and disable the block.
pub fn disable<B: RegisterBus>(regs: &mut RegMap<B>) -> Result<(), Error> {
    regs.update_bits(CS_A, CS_RXON | CS_TXON | CS_EN, 0)
}
