//! BCM2835 PCM/I²S register map
//!
//! Source: BCM2835 ARM Peripherals, section 8 (PCM / I2S Audio).
//!
//! # Notes
//!
//! ## SYNC handshake
//! `CS.SYNC` is a write-echo bit: a written value is reflected back two PCM
//! clocks later. It is the only way to tell that a FIFO clear has been seen
//! by the PCM clock domain.
//!
//! ## Channel positions
//! `CHPOS` is 10 bits wide on silicon (bits \[13:4\] of each half of RXC/TXC).
//! The positions used here (0, 1, 32, 33) fit either reading of the field.
//!
//! ## Channel word width
//! Width = `CHWEX * 16 + CHWID + 8`; 32-bit slots need `CHWEX` set and
//! `CHWID = 8`.

// Safety: every field helper masks before shifting by a constant below 32.
#![allow(clippy::arithmetic_side_effects)]

// ---------------------------------------------------------------------------
// Register offsets (PCM block A)
// ---------------------------------------------------------------------------

/// Control and status
pub const CS_A: u32 = 0x00;
/// FIFO data (read: RX FIFO, write: TX FIFO)
pub const FIFO_A: u32 = 0x04;
/// Mode
pub const MODE_A: u32 = 0x08;
/// Receive channel format
pub const RXC_A: u32 = 0x0c;
/// Transmit channel format
pub const TXC_A: u32 = 0x10;
/// DMA request level
pub const DREQ_A: u32 = 0x14;
/// Interrupt enable
pub const INTEN_A: u32 = 0x18;
/// Interrupt status and clear
pub const INTSTC_A: u32 = 0x1c;
/// Gray-code mode control
pub const GRAY: u32 = 0x20;

/// Every register `clear_registers` zeroes, in write order.
pub const CONFIG_REGISTERS: [u32; 8] = [CS_A, MODE_A, RXC_A, TXC_A, DREQ_A, INTEN_A, INTSTC_A, GRAY];

// ---------------------------------------------------------------------------
// CS_A bits
// ---------------------------------------------------------------------------

/// Standby: clear to leave low-power mode
pub const CS_STBY: u32 = 1 << 25;
/// Sync write-echo bit
pub const CS_SYNC: u32 = 1 << 24;
/// RX sign extend
pub const CS_RXSEX: u32 = 1 << 23;
/// RX FIFO full
pub const CS_RXF: u32 = 1 << 22;
/// TX FIFO empty
pub const CS_TXE: u32 = 1 << 21;
/// RX FIFO contains data
pub const CS_RXD: u32 = 1 << 20;
/// TX FIFO can accept data
pub const CS_TXD: u32 = 1 << 19;
/// RX FIFO needs reading
pub const CS_RXR: u32 = 1 << 18;
/// TX FIFO needs writing
pub const CS_TXW: u32 = 1 << 17;
/// RX FIFO overflow
pub const CS_RXERR: u32 = 1 << 16;
/// TX FIFO underflow
pub const CS_TXERR: u32 = 1 << 15;
/// RX FIFO in sync
pub const CS_RXSYNC: u32 = 1 << 14;
/// TX FIFO in sync
pub const CS_TXSYNC: u32 = 1 << 13;
/// DMA DREQ enable
pub const CS_DMAEN: u32 = 1 << 9;
/// Clear the RX FIFO (self-clearing)
pub const CS_RXCLR: u32 = 1 << 4;
/// Clear the TX FIFO (self-clearing)
pub const CS_TXCLR: u32 = 1 << 3;
/// Enable transmission
pub const CS_TXON: u32 = 1 << 2;
/// Enable reception
pub const CS_RXON: u32 = 1 << 1;
/// Enable the PCM block
pub const CS_EN: u32 = 1 << 0;

/// RX FIFO threshold field (2 bits).
pub const fn cs_rxthr(v: u32) -> u32 {
    (v & 3) << 7
}

/// TX FIFO threshold field (2 bits).
pub const fn cs_txthr(v: u32) -> u32 {
    (v & 3) << 5
}

/// RX and TX enable bits together.
pub const CS_RXTX_ON: u32 = CS_RXON | CS_TXON;

// ---------------------------------------------------------------------------
// MODE_A bits
// ---------------------------------------------------------------------------

/// PCM clock disable
pub const MODE_CLKDIS: u32 = 1 << 28;
/// PDM decimation factor
pub const MODE_PDMN: u32 = 1 << 27;
/// PDM input mode enable
pub const MODE_PDME: u32 = 1 << 26;
/// Receive frame packed mode
pub const MODE_FRXP: u32 = 1 << 25;
/// Transmit frame packed mode
pub const MODE_FTXP: u32 = 1 << 24;
/// Clock mode: 1 = slave (clock is an input)
pub const MODE_CLKM: u32 = 1 << 23;
/// Clock invert
pub const MODE_CLKI: u32 = 1 << 22;
/// Frame sync mode: 1 = slave (frame sync is an input)
pub const MODE_FSM: u32 = 1 << 21;
/// Frame sync invert
pub const MODE_FSI: u32 = 1 << 20;

/// Frame length field: number of clocks per frame minus one.
pub const fn mode_flen(v: u32) -> u32 {
    (v & 0x3ff) << 10
}

/// Frame sync length field, in clocks.
pub const fn mode_fslen(v: u32) -> u32 {
    v & 0x3ff
}

// ---------------------------------------------------------------------------
// RXC_A / TXC_A fields
// ---------------------------------------------------------------------------

/// Channel width extension
pub const CHWEX: u32 = 1 << 15;
/// Channel enable
pub const CHEN: u32 = 1 << 14;

/// Channel position field: clock at which the channel's first bit is sampled.
pub const fn chpos(v: u32) -> u32 {
    (v & 0x3ff) << 4
}

/// Channel width field (width minus 8, low four bits).
pub const fn chwid(v: u32) -> u32 {
    v & 0xf
}

/// Place a channel field in the channel 1 half.
pub const fn ch1(v: u32) -> u32 {
    v << 16
}

/// Place a channel field in the channel 2 half.
pub const fn ch2(v: u32) -> u32 {
    v
}

/// Channel 1 position.
pub const fn ch1_pos(v: u32) -> u32 {
    ch1(chpos(v))
}

/// Channel 2 position.
pub const fn ch2_pos(v: u32) -> u32 {
    ch2(chpos(v))
}

// ---------------------------------------------------------------------------
// DREQ_A fields
// ---------------------------------------------------------------------------

/// TX panic level
pub const fn dreq_tx_panic(v: u32) -> u32 {
    (v & 0x7f) << 24
}

/// RX panic level
pub const fn dreq_rx_panic(v: u32) -> u32 {
    (v & 0x7f) << 16
}

/// TX request level
pub const fn dreq_tx(v: u32) -> u32 {
    (v & 0x7f) << 8
}

/// RX request level
pub const fn dreq_rx(v: u32) -> u32 {
    v & 0x7f
}

// ---------------------------------------------------------------------------
// INTEN_A bits
// ---------------------------------------------------------------------------

/// RX error interrupt
pub const INT_RXERR: u32 = 1 << 3;
/// TX error interrupt
pub const INT_TXERR: u32 = 1 << 2;
/// RX read interrupt
pub const INT_RXR: u32 = 1 << 1;
/// TX write interrupt
pub const INT_TXW: u32 = 1 << 0;

// ---------------------------------------------------------------------------
// DMA request thresholds
// ---------------------------------------------------------------------------

/// TX DREQ level, also the number of zero words primed into the TX FIFO
pub const THR_TX: u32 = 0x30;
/// RX DREQ level
pub const THR_RX: u32 = 0x20;
/// TX panic level
pub const TX_PANIC_THR: u32 = 0x10;
/// RX panic level
pub const RX_PANIC_THR: u32 = 0x30;
