//! Constants and enumerations for the SDHC controller layer
//!
//! Register offsets follow the SD Host Controller Specification v3.x
//! layout; all offsets are relative to the controller's MMIO base.

/// Block size register offset
pub const SDHC_BLOCK_SIZE_OFFSET: u32 = 0x004;
/// 16-bit block count register offset
pub const SDHC_BLOCK_COUNT_OFFSET: u32 = 0x006;
/// Command argument register offset
pub const SDHC_ARGUMENT_OFFSET: u32 = 0x008;
/// Transfer mode register offset
pub const SDHC_TRANSFER_MODE_OFFSET: u32 = 0x00C;
/// Command register offset
pub const SDHC_COMMAND_OFFSET: u32 = 0x00E;
/// Response register offset (four 32-bit words, 0x010..0x01C)
pub const SDHC_RESPONSE_OFFSET: u32 = 0x010;
/// PIO buffer data port offset
pub const SDHC_BUFFER_DATA_PORT_OFFSET: u32 = 0x020;
/// Present state register offset
pub const SDHC_PRESENT_STATE_OFFSET: u32 = 0x024;
/// Host control 1 register offset
pub const SDHC_HOST_CONTROL_1_OFFSET: u32 = 0x028;
/// Power control register offset
pub const SDHC_POWER_CONTROL_OFFSET: u32 = 0x029;
/// Clock control register offset
pub const SDHC_CLOCK_CONTROL_OFFSET: u32 = 0x02C;
/// Timeout control register offset
pub const SDHC_TIMEOUT_CONTROL_OFFSET: u32 = 0x02E;
/// Software reset register offset
pub const SDHC_SOFTWARE_RESET_OFFSET: u32 = 0x02F;
/// Normal interrupt status register offset
pub const SDHC_NORMAL_INT_STATUS_OFFSET: u32 = 0x030;
/// Error interrupt status register offset
pub const SDHC_ERROR_INT_STATUS_OFFSET: u32 = 0x032;
/// Normal interrupt status enable register offset
pub const SDHC_NORMAL_INT_STATUS_ENABLE_OFFSET: u32 = 0x034;
/// Error interrupt status enable register offset
pub const SDHC_ERROR_INT_STATUS_ENABLE_OFFSET: u32 = 0x036;
/// Auto CMD error status register offset
pub const SDHC_AUTO_CMD_ERROR_STATUS_OFFSET: u32 = 0x03C;
/// Capabilities register offset (low half)
pub const SDHC_CAPABILITIES_OFFSET: u32 = 0x040;

/// Data block length used for all bulk transfers
pub const SDHC_BLOCK_SIZE: usize = 512;
/// SCR payload length, the one sub-block transfer the engine accepts
pub const SDHC_SCR_SIZE: usize = 8;
/// The 16-bit block count register bounds a single data command
pub const SDHC_MAX_TRANSFER_BLOCKS: usize = 0xFFFF;
/// Largest byte count a single data command can move
pub const SDHC_MAX_TRANSFER_SIZE: usize = SDHC_MAX_TRANSFER_BLOCKS * SDHC_BLOCK_SIZE;

/// Direction of a data-bearing command, seen from the host
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TransferDirection {
    /// Card to host
    Read,
    /// Host to card
    Write,
}
