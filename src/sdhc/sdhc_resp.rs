//! Response kinds and response decoding
//!
//! The SD protocol answers commands with one of a handful of response
//! shapes; the controller latches the raw bits in the four response
//! words and the driver decodes them according to the kind the command
//! was issued with.

use super::constants::SDHC_RESPONSE_OFFSET;
use super::regs::SdhcReg;

/// Response shape a command expects, as encoded in the command register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// No response
    None,
    /// 48-bit, card status
    R1,
    /// 48-bit with busy signalling on DAT0
    R1b,
    /// 136-bit, CID or CSD
    R2,
    /// 48-bit, OCR, no CRC
    R3,
    /// 48-bit, new RCA plus short card status
    R6,
    /// 48-bit, interface condition echo
    R7,
}

impl ResponseKind {
    /// Response-type field of the command register.
    ///
    /// 0: no response, 1: 136 bits, 2: 48 bits, 3: 48 bits check busy.
    pub fn response_bits(self) -> u8 {
        match self {
            ResponseKind::None => 0,
            ResponseKind::R2 => 1,
            ResponseKind::R1 | ResponseKind::R3 | ResponseKind::R6 | ResponseKind::R7 => 2,
            ResponseKind::R1b => 3,
        }
    }

    /// R2 carries no index field and R3 deliberately ships a stuck-high CRC.
    pub fn index_check(self) -> bool {
        !matches!(self, ResponseKind::R2 | ResponseKind::R3)
    }

    pub fn crc_check(self) -> bool {
        self != ResponseKind::R3
    }
}

/// Decoded response value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdhcResponse {
    None,
    R1 {
        card_status: u32,
    },
    R1b {
        card_status: u32,
    },
    /// CID or CSD, bits [119:0]; bits [127:120] are reserved and masked
    R2 {
        raw: [u32; 4],
    },
    R3 {
        ocr: u32,
    },
    R6 {
        new_rca: u16,
        short_card_status: u16,
    },
    R7 {
        voltage_accepted: u8,
        check_pattern: u8,
    },
}

impl SdhcResponse {
    /// Decode the latched response words for the given kind.
    pub fn decode(kind: ResponseKind, words: [u32; 4]) -> Self {
        match kind {
            ResponseKind::None => SdhcResponse::None,
            ResponseKind::R1 => SdhcResponse::R1 {
                card_status: words[0],
            },
            ResponseKind::R1b => SdhcResponse::R1b {
                card_status: words[0],
            },
            ResponseKind::R2 => SdhcResponse::R2 {
                // only bits 0-119 carry payload, discard the top 8
                raw: [words[0], words[1], words[2], words[3] & 0x00FF_FFFF],
            },
            ResponseKind::R3 => SdhcResponse::R3 { ocr: words[0] },
            ResponseKind::R6 => SdhcResponse::R6 {
                new_rca: (words[0] >> 16) as u16,
                short_card_status: words[0] as u16,
            },
            ResponseKind::R7 => SdhcResponse::R7 {
                voltage_accepted: (words[0] >> 8) as u8,
                check_pattern: words[0] as u8,
            },
        }
    }

    pub fn card_status(&self) -> Option<u32> {
        match *self {
            SdhcResponse::R1 { card_status } | SdhcResponse::R1b { card_status } => {
                Some(card_status)
            }
            _ => None,
        }
    }

    pub fn ocr(&self) -> Option<u32> {
        match *self {
            SdhcResponse::R3 { ocr } => Some(ocr),
            _ => None,
        }
    }

    pub fn long_payload(&self) -> Option<[u32; 4]> {
        match *self {
            SdhcResponse::R2 { raw } => Some(raw),
            _ => None,
        }
    }

    pub fn new_rca(&self) -> Option<u16> {
        match *self {
            SdhcResponse::R6 { new_rca, .. } => Some(new_rca),
            _ => None,
        }
    }

    pub fn check_pattern(&self) -> Option<u8> {
        match *self {
            SdhcResponse::R7 { check_pattern, .. } => Some(check_pattern),
            _ => None,
        }
    }
}

/// Read the response words the controller latched for a completed command.
///
/// Short responses live entirely in the first word; only R2 spans all four.
pub(crate) fn latched_response(reg: &SdhcReg, kind: ResponseKind) -> SdhcResponse {
    let mut words = [0u32; 4];
    words[0] = reg.read_32(SDHC_RESPONSE_OFFSET);
    if kind == ResponseKind::R2 {
        words[1] = reg.read_32(SDHC_RESPONSE_OFFSET + 0x4);
        words[2] = reg.read_32(SDHC_RESPONSE_OFFSET + 0x8);
        words[3] = reg.read_32(SDHC_RESPONSE_OFFSET + 0xC);
    }
    SdhcResponse::decode(kind, words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_type_bits_match_command_encoding() {
        assert_eq!(ResponseKind::None.response_bits(), 0);
        assert_eq!(ResponseKind::R2.response_bits(), 1);
        assert_eq!(ResponseKind::R1.response_bits(), 2);
        assert_eq!(ResponseKind::R3.response_bits(), 2);
        assert_eq!(ResponseKind::R6.response_bits(), 2);
        assert_eq!(ResponseKind::R7.response_bits(), 2);
        assert_eq!(ResponseKind::R1b.response_bits(), 3);
    }

    #[test]
    fn index_and_crc_checks_follow_response_kind() {
        assert!(ResponseKind::R1.index_check() && ResponseKind::R1.crc_check());
        assert!(ResponseKind::R1b.index_check() && ResponseKind::R1b.crc_check());
        assert!(!ResponseKind::R2.index_check() && ResponseKind::R2.crc_check());
        assert!(!ResponseKind::R3.index_check() && !ResponseKind::R3.crc_check());
        assert!(ResponseKind::R6.index_check() && ResponseKind::R6.crc_check());
    }

    #[test]
    fn r2_masks_reserved_top_byte() {
        let decoded = SdhcResponse::decode(
            ResponseKind::R2,
            [0x1111_1111, 0x2222_2222, 0x3333_3333, 0xFFAB_CDEF],
        );
        assert_eq!(
            decoded.long_payload().unwrap(),
            [0x1111_1111, 0x2222_2222, 0x3333_3333, 0x00AB_CDEF]
        );
    }

    #[test]
    fn r6_splits_rca_and_short_status() {
        let decoded = SdhcResponse::decode(ResponseKind::R6, [0xABCD_0520, 0, 0, 0]);
        assert_eq!(decoded.new_rca(), Some(0xABCD));
        let SdhcResponse::R6 {
            short_card_status, ..
        } = decoded
        else {
            panic!("wrong variant");
        };
        assert_eq!(short_card_status, 0x0520);
    }

    #[test]
    fn r7_splits_voltage_and_check_pattern() {
        let decoded = SdhcResponse::decode(ResponseKind::R7, [0x0000_01AB, 0, 0, 0]);
        let SdhcResponse::R7 {
            voltage_accepted,
            check_pattern,
        } = decoded
        else {
            panic!("wrong variant");
        };
        assert_eq!(voltage_accepted, 0x01);
        assert_eq!(check_pattern, 0xAB);
    }

    #[test]
    fn short_responses_take_word_zero_verbatim() {
        assert_eq!(
            SdhcResponse::decode(ResponseKind::R1, [0x0000_0900, 0, 0, 0]).card_status(),
            Some(0x0000_0900)
        );
        assert_eq!(
            SdhcResponse::decode(ResponseKind::R3, [0x80FF_8000, 0, 0, 0]).ocr(),
            Some(0x80FF_8000)
        );
    }
}
