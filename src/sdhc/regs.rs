//! Register definitions for the SDHC controller
//!
//! This module provides bitflag definitions for the SDHC v3.x registers
//! the driver programs, allowing type-safe register access. Plain value
//! registers (Argument, Block Size/Count, Response, Buffer Data Port)
//! are accessed through the raw-width accessors with the offsets from
//! [`super::constants`].

#![allow(missing_docs)]

use crate::regs::{FlagReg, FlagReg8, FlagReg16, Reg};
use bitflags::bitflags;

use super::constants::*;

/// SDHC register accessor type
pub type SdhcReg = Reg;

// Transfer Mode, 0x00C
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcTransferMode: u16 {
        const DMA_ENABLE = 1 << 0;
        const BLOCK_COUNT_ENABLE = 1 << 1;
        const AUTO_CMD12_ENABLE = 0b01 << 2; // bits [3:2]
        const READ = 1 << 4; // clear for writes
        const MULTI_BLOCK = 1 << 5;
    }
}

impl FlagReg16 for SdhcTransferMode {
    const REG: u32 = SDHC_TRANSFER_MODE_OFFSET;
}

// Command, 0x00E
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcCommand: u16 {
        const RESP_TYPE_MASK = 0b11 << 0;
        const CRC_CHECK = 1 << 3;
        const INDEX_CHECK = 1 << 4;
        const DATA_PRESENT = 1 << 5;
        const INDEX_MASK = 0x3F << 8;
    }
}

impl FlagReg16 for SdhcCommand {
    const REG: u32 = SDHC_COMMAND_OFFSET;
}

impl SdhcCommand {
    /// Compose the command register value for a normal command.
    ///
    /// Index check is skipped for R2/R3 and CRC check for R3, which is
    /// what the response-kind tag encodes.
    pub fn compose(index: u8, kind: super::sdhc_resp::ResponseKind, data_present: bool) -> Self {
        let mut cmd = Self::from_bits_retain(
            set_reg32_bits!(index as u32, 13, 8) as u16 | kind.response_bits() as u16,
        );
        if kind.index_check() {
            cmd |= Self::INDEX_CHECK;
        }
        if kind.crc_check() {
            cmd |= Self::CRC_CHECK;
        }
        if data_present {
            cmd |= Self::DATA_PRESENT;
        }
        cmd
    }
}

// Present State, 0x024
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcPresentState: u32 {
        const CMD_INHIBIT = 1 << 0;
        const DAT_INHIBIT = 1 << 1;
        const DAT_LINE_ACTIVE = 1 << 2;
        const WRITE_TRANSFER_ACTIVE = 1 << 8;
        const READ_TRANSFER_ACTIVE = 1 << 9;
        const BUFFER_WRITE_READY = 1 << 10;
        const BUFFER_READ_READY = 1 << 11;
        const CARD_INSERTED = 1 << 16;
        const CARD_STATE_STABLE = 1 << 17;
    }
}

impl FlagReg for SdhcPresentState {
    const REG: u32 = SDHC_PRESENT_STATE_OFFSET;
}

// Host Control 1, 0x028
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcHostControl1: u8 {
        const LED = 1 << 0;
        const DATA_WIDTH_4BIT = 1 << 1;
        const HIGH_SPEED = 1 << 2;
    }
}

impl FlagReg8 for SdhcHostControl1 {
    const REG: u32 = SDHC_HOST_CONTROL_1_OFFSET;
}

// Power Control, 0x029
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcPowerControl: u8 {
        const BUS_POWER = 1 << 0;
        const VOLTAGE_3V3 = 0b111 << 1; // bits [3:1]
    }
}

impl FlagReg8 for SdhcPowerControl {
    const REG: u32 = SDHC_POWER_CONTROL_OFFSET;
}

// Clock Control, 0x02C
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcClockControl: u16 {
        const INTERNAL_CLOCK_ENABLE = 1 << 0;
        const INTERNAL_CLOCK_STABLE = 1 << 1;
        const SD_CLOCK_ENABLE = 1 << 2;
        const DIVIDER_MASK = 0xFF << 8;
    }
}

impl FlagReg16 for SdhcClockControl {
    const REG: u32 = SDHC_CLOCK_CONTROL_OFFSET;
}

impl SdhcClockControl {
    /// Divider field in bits [15:8] plus internal- and SD-clock enables.
    pub fn enabled_with_divider(divider: u8) -> Self {
        Self::from_bits_retain((divider as u16) << 8)
            | Self::INTERNAL_CLOCK_ENABLE
            | Self::SD_CLOCK_ENABLE
    }
}

// Timeout Control, 0x02E
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcTimeoutControl: u8 {
        const DATA_TIMEOUT_MAX = 0xE; // TMCLK * 2^27, the longest setting
    }
}

impl FlagReg8 for SdhcTimeoutControl {
    const REG: u32 = SDHC_TIMEOUT_CONTROL_OFFSET;
}

// Software Reset, 0x02F
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcSoftwareReset: u8 {
        const RESET_ALL = 1 << 0;
        const RESET_CMD = 1 << 1;
        const RESET_DAT = 1 << 2;
    }
}

impl FlagReg8 for SdhcSoftwareReset {
    const REG: u32 = SDHC_SOFTWARE_RESET_OFFSET;
}

// Normal Interrupt Status, 0x030
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SdhcNormalInt: u16 {
        const CMD_COMPLETE = 1 << 0;
        const TRANSFER_COMPLETE = 1 << 1;
        const BLOCK_GAP_EVENT = 1 << 2;
        const DMA_INTERRUPT = 1 << 3;
        const BUFFER_WRITE_READY = 1 << 4;
        const BUFFER_READ_READY = 1 << 5;
        const CARD_INSERTION = 1 << 6;
        const CARD_REMOVAL = 1 << 7;
        const CARD_INTERRUPT = 1 << 8;
        const ERROR = 1 << 15;
    }
}

impl FlagReg16 for SdhcNormalInt {
    const REG: u32 = SDHC_NORMAL_INT_STATUS_OFFSET;
}

// Normal Interrupt Status Enable, 0x034
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcNormalIntEnable: u16 {
        const CMD_COMPLETE = 1 << 0;
        const TRANSFER_COMPLETE = 1 << 1;
        const BUFFER_WRITE_READY = 1 << 4;
        const BUFFER_READ_READY = 1 << 5;
        const CARD_INSERTION = 1 << 6;
        const CARD_REMOVAL = 1 << 7;
        /// Everything the polled engines consume: removal, buffer
        /// readiness and the two completion bits.
        const ENGINE_STATUSES = Self::CARD_REMOVAL.bits()
            | Self::BUFFER_READ_READY.bits()
            | Self::BUFFER_WRITE_READY.bits()
            | Self::TRANSFER_COMPLETE.bits()
            | Self::CMD_COMPLETE.bits();
    }
}

impl FlagReg16 for SdhcNormalIntEnable {
    const REG: u32 = SDHC_NORMAL_INT_STATUS_ENABLE_OFFSET;
}

// Error Interrupt Status, 0x032
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcErrorInt: u16 {
        const CMD_TIMEOUT = 1 << 0;
        const CMD_CRC = 1 << 1;
        const CMD_END_BIT = 1 << 2;
        const CMD_INDEX = 1 << 3;
        const DATA_TIMEOUT = 1 << 4;
        const DATA_CRC = 1 << 5;
        const DATA_END_BIT = 1 << 6;
        const CURRENT_LIMIT = 1 << 7;
        const AUTO_CMD = 1 << 8;
    }
}

impl FlagReg16 for SdhcErrorInt {
    const REG: u32 = SDHC_ERROR_INT_STATUS_OFFSET;
}

// Error Interrupt Status Enable, 0x036
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcErrorIntEnable: u16 {
        const CMD_TIMEOUT = 1 << 0;
        const CMD_CRC = 1 << 1;
        const CMD_END_BIT = 1 << 2;
        const CMD_INDEX = 1 << 3;
        const DATA_TIMEOUT = 1 << 4;
        const DATA_CRC = 1 << 5;
        const DATA_END_BIT = 1 << 6;
        const CURRENT_LIMIT = 1 << 7;
        const AUTO_CMD = 1 << 8;
        /// All command, data and auto-CMD error statuses.
        const ALL_ERRORS = 0x17F;
    }
}

impl FlagReg16 for SdhcErrorIntEnable {
    const REG: u32 = SDHC_ERROR_INT_STATUS_ENABLE_OFFSET;
}

// Auto CMD Error Status, 0x03C
bitflags! {
    #[derive(Debug, Clone, Copy)]
    pub struct SdhcAutoCmdError: u16 {
        const NOT_EXECUTED = 1 << 0;
        const TIMEOUT = 1 << 1;
        const CRC = 1 << 2;
        const END_BIT = 1 << 3;
        const INDEX = 1 << 4;
        const NOT_ISSUED = 1 << 7;
    }
}

impl FlagReg16 for SdhcAutoCmdError {
    const REG: u32 = SDHC_AUTO_CMD_ERROR_STATUS_OFFSET;
}
