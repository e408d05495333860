//! SD protocol constants: command indices, argument encodings and the
//! OCR bits the bring-up sequence cares about.

use bitflags::bitflags;

/// Commands the driver issues from the standard command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SdCmd {
    GoIdleState = 0,
    AllSendCid = 2,
    SendRelativeAddress = 3,
    SelectCard = 7,
    SendInterfaceCondition = 8,
    SendCsd = 9,
    SetBlockLength = 16,
    ReadSingleBlock = 17,
    ReadMultipleBlock = 18,
    SetBlockCount = 23,
    WriteSingleBlock = 24,
    WriteMultipleBlock = 25,
    ApplicationCommand = 55,
}

/// Application commands, reached through CMD55.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SdAppCmd {
    SetBusWidth = 6,
    SendOperationCondition = 41,
    SendScr = 51,
}

bitflags! {
    /// Operation Conditions Register, as returned by ACMD41.
    #[derive(Debug, Clone, Copy)]
    pub(crate) struct SdOcr: u32 {
        /// 3.2-3.3 V window
        const VDD_32_33 = 1 << 20;
        /// 3.3-3.4 V window
        const VDD_33_34 = 1 << 21;
        /// Maximum-performance power control (XPC)
        const MAX_PERFORMANCE = 1 << 28;
        /// Host announces / card confirms high-capacity addressing
        const CARD_CAPACITY = 1 << 30;
        /// Card finished its power-up sequence
        const POWER_UP_DONE = 1 << 31;
    }
}

/// CMD8 argument: VHS 2.7-3.6 V in bits [11:8], check pattern below.
pub(crate) const SD_IF_COND_ARG: u32 = 0x100 | SD_IF_COND_CHECK_PATTERN as u32;
/// Arbitrary echo byte the card must send back in R7.
pub(crate) const SD_IF_COND_CHECK_PATTERN: u8 = 0xAB;

/// ACMD6 argument selecting the 4-bit bus.
pub(crate) const SD_BUS_WIDTH_4BIT_ARG: u32 = 0x2;

/// Identification-phase bus clock.
pub(crate) const SD_CLOCK_400KHZ: u32 = 400;
/// Full-speed bus clock for the default (non-high-speed) mode.
pub(crate) const SD_CLOCK_25MHZ: u32 = 25_000;

/// Card settle time after bus power comes up.
pub(crate) const SD_POWER_ON_DELAY_MS: u64 = 250;
/// Card settle time after the bus clock is raised.
pub(crate) const SD_CLOCK_SWITCH_DELAY_MS: u64 = 1;
