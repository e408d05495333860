//! SD configuration register decoding
//!
//! The SCR is an 8-byte card-resident structure fetched with ACMD51 as
//! a data transfer, MSB first on the wire.

use bitflags::bitflags;

bitflags! {
    /// DAT bus widths the card supports, SCR byte 1 low nibble.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ScrBusWidths: u8 {
        const WIDTH_1BIT = 1 << 0;
        const WIDTH_4BIT = 1 << 2;
    }
}

/// Decoded SD configuration register.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdScr {
    /// SCR_STRUCTURE field, 0 for SCR version 1.0
    pub structure: u8,
    /// SD_SPEC field: physical layer specification version
    pub sd_spec: u8,
    /// Supported DAT bus widths
    pub bus_widths: ScrBusWidths,
}

impl SdScr {
    pub(crate) fn decode(bytes: &[u8; 8]) -> Self {
        SdScr {
            structure: bytes[0] >> 4,
            sd_spec: bytes[0] & 0xF,
            bus_widths: ScrBusWidths::from_bits_truncate(bytes[1] & 0xF),
        }
    }

    /// Whether the card can drive all four DAT lines.
    pub fn supports_4bit(&self) -> bool {
        self.bus_widths.contains(ScrBusWidths::WIDTH_4BIT)
    }
}
