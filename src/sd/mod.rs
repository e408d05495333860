//! # SD Memory Card Layer
//!
//! Card identification, bring-up and block-addressed I/O on top of the
//! [`crate::sdhc`] controller engines.
//!
//! ## Functionality
//!
//! - Card detection and the identification state machine
//! - Application (ACMD) command sequencing
//! - Byte-range reads and writes split into single and multi-block
//!   transfers under the controller's 16-bit block-count ceiling

pub(crate) mod consts;

mod cid;
mod csd;
mod scr;

use core::ptr::NonNull;
use core::time::Duration;

use log::{info, warn};

use crate::sdhc::constants::*;
use crate::sdhc::err::*;
use crate::sdhc::sdhc_resp::{ResponseKind, SdhcResponse};
use crate::sdhc::Sdhc;
use crate::sleep;

pub use cid::SdCid;
pub use csd::SdCsd;
pub use scr::SdScr;

use consts::*;

/// An SD memory card behind an SDHC controller.
///
/// Construction takes over the controller; [`SdCard::init_card`] walks
/// the identification sequence and leaves the card selected, in
/// transfer state, with a 512-byte block length and the widest bus the
/// SCR allows. Reads and writes then address the card by flat byte
/// offsets.
///
/// The driver is single-threaded: every call runs to completion on the
/// caller's context and owns the controller while it does.
pub struct SdCard {
    host: Sdhc,
    /// Relative card address, assigned during identification
    rca: u16,
    /// High-capacity card: data commands take block indices, not bytes
    hcs: bool,
    /// Card answered CMD8, i.e. implements physical layer v2.0+
    f8: bool,
    cid: SdCid,
    csd: SdCsd,
    scr: SdScr,
}

impl SdCard {
    /// Bind a card driver to the controller at `addr`.
    ///
    /// The controller is reset and its internal clock started; the card
    /// itself is untouched until [`SdCard::init_card`].
    pub fn new(addr: NonNull<u8>, is_simulation: bool) -> Self {
        SdCard {
            host: Sdhc::new(addr, is_simulation),
            rca: 0,
            hcs: false,
            f8: true,
            cid: SdCid::default(),
            csd: SdCsd::default(),
            scr: SdScr::default(),
        }
    }

    /// Whether a card sits in the slot.
    pub fn card_present(&self) -> bool {
        self.host.card_present()
    }

    /// The relative card address assigned during identification.
    pub fn rca(&self) -> u16 {
        self.rca
    }

    /// Whether the card uses block-indexed addressing.
    pub fn high_capacity(&self) -> bool {
        self.hcs
    }

    /// Card capacity in 512-byte blocks, from the CSD.
    pub fn capacity_blocks(&self) -> u32 {
        self.csd.capacity_blocks
    }

    /// The decoded card identification register.
    pub fn cid(&self) -> &SdCid {
        &self.cid
    }

    /// Run the card identification sequence.
    ///
    /// Brings the bus up at 400 kHz, walks reset, interface condition,
    /// operation condition, identification and selection, then steps
    /// the clock to 25 MHz, fixes the block length at 512 and switches
    /// to the 4-bit bus when the SCR permits.
    ///
    /// # Errors
    ///
    /// [`SdhcError::NoCard`] when the slot is empty; any engine error
    /// aborts the sequence where it happened.
    pub fn init_card(&mut self) -> SdhcResult {
        if !self.host.card_present() {
            return Err(SdhcError::NoCard);
        }

        self.host.interrupt_statuses_enable();
        self.host.timeout_setup();
        self.host.capabilities_load();
        self.host.power_up();
        self.host.clock_setup(SD_CLOCK_400KHZ);
        /* wait for the card to power up */
        sleep(Duration::from_millis(SD_POWER_ON_DELAY_MS));

        info!("card identification started");
        self.host
            .issue_cmd(SdCmd::GoIdleState as u8, 0, ResponseKind::None)?;

        /* interface condition; cards older than v2.0 time out here */
        self.f8 = true;
        match self.host.issue_cmd(
            SdCmd::SendInterfaceCondition as u8,
            SD_IF_COND_ARG,
            ResponseKind::R7,
        ) {
            Ok(response) => {
                if response.check_pattern() != Some(SD_IF_COND_CHECK_PATTERN) {
                    return Err(SdhcError::CmdError);
                }
            }
            Err(SdhcError::CmdTimeout) => {
                warn!("no answer to CMD8, treating card as pre-v2.0");
                self.f8 = false;
            }
            Err(err) => return Err(err),
        }

        /* negotiate operating conditions until the card reports ready */
        let mut acmd41_arg = SdOcr::VDD_32_33 | SdOcr::VDD_33_34 | SdOcr::MAX_PERFORMANCE;
        if self.f8 {
            acmd41_arg |= SdOcr::CARD_CAPACITY;
        }
        let ocr = loop {
            let response = self.issue_acmd(
                SdAppCmd::SendOperationCondition,
                acmd41_arg.bits(),
                ResponseKind::R3,
            )?;
            let ocr = SdOcr::from_bits_retain(response.ocr().ok_or(SdhcError::CmdError)?);
            if ocr.contains(SdOcr::POWER_UP_DONE) {
                break ocr;
            }
        };
        self.hcs = ocr.contains(SdOcr::CARD_CAPACITY);
        info!(
            "card ready, OCR {:#x}, {} capacity",
            ocr.bits(),
            if self.hcs { "high" } else { "standard" }
        );

        let response = self
            .host
            .issue_cmd(SdCmd::AllSendCid as u8, 0, ResponseKind::R2)?;
        self.cid = SdCid::decode(response.long_payload().ok_or(SdhcError::CmdError)?);

        let response =
            self.host
                .issue_cmd(SdCmd::SendRelativeAddress as u8, 1, ResponseKind::R6)?;
        self.rca = response.new_rca().ok_or(SdhcError::CmdError)?;
        info!("RCA {:#x}", self.rca);

        /* the CSD is only served in standby, fetch it before selecting */
        let response = self.host.issue_cmd(
            SdCmd::SendCsd as u8,
            (self.rca as u32) << 16,
            ResponseKind::R2,
        )?;
        self.csd = SdCsd::decode(response.long_payload().ok_or(SdhcError::CmdError)?);

        /* move the card into transfer state */
        self.host.issue_cmd(
            SdCmd::SelectCard as u8,
            (self.rca as u32) << 16,
            ResponseKind::R1b,
        )?;

        /* identification is done, leave the 400 kHz clock behind */
        self.host.clock_setup(SD_CLOCK_25MHZ);
        sleep(Duration::from_millis(SD_CLOCK_SWITCH_DELAY_MS));

        self.host.issue_cmd(
            SdCmd::SetBlockLength as u8,
            SDHC_BLOCK_SIZE as u32,
            ResponseKind::R1,
        )?;
        self.host.block_size_set(SDHC_BLOCK_SIZE as u16);

        if self.host.config().is_simulation() {
            /* the simulation model always runs 4-bit transfers; still
             * go through the SCR motions below */
            self.host.bus_width_4bit_set();
        }

        /* the SCR tells us whether the card can drive four DAT lines */
        self.host.issue_cmd(
            SdCmd::ApplicationCommand as u8,
            (self.rca as u32) << 16,
            ResponseKind::R1,
        )?;
        self.host.block_size_set(SDHC_SCR_SIZE as u16);
        let mut scr = [0u8; SDHC_SCR_SIZE];
        self.host
            .read_data_cmd(SdAppCmd::SendScr as u8, 0, ResponseKind::R1, &mut scr)?;
        self.scr = SdScr::decode(&scr);

        if self.scr.supports_4bit() {
            self.issue_acmd(SdAppCmd::SetBusWidth, SD_BUS_WIDTH_4BIT_ARG, ResponseKind::R1)?;
            self.host.bus_width_4bit_set();
            info!("4-bit bus enabled");
        }

        self.host.block_size_set(SDHC_BLOCK_SIZE as u16);

        self.card_dump();
        Ok(())
    }

    /// Read `buf.len()` bytes starting at byte `offset`.
    ///
    /// A start inside a block is served through a bounce buffer; past
    /// that the range is split into multi-block reads capped by the
    /// 16-bit block counter, each preceded by a CMD23 hint, with a
    /// single-block read for a trailing block.
    pub fn read(&self, offset: u32, buf: &mut [u8]) -> SdhcResult {
        let mut offset = offset;
        let mut done = 0usize;

        let head = offset as usize & (SDHC_BLOCK_SIZE - 1);
        if head != 0 {
            let mut scratch = [0u8; SDHC_BLOCK_SIZE];
            self.host.read_data_cmd(
                SdCmd::ReadSingleBlock as u8,
                self.data_arg(offset),
                ResponseKind::R1,
                &mut scratch,
            )?;

            done = usize::min(SDHC_BLOCK_SIZE - head, buf.len());
            buf[..done].copy_from_slice(&scratch[head..head + done]);
            offset = (offset & !(SDHC_BLOCK_SIZE as u32 - 1)) + SDHC_BLOCK_SIZE as u32;
        }

        while buf.len() - done >= SDHC_MAX_TRANSFER_SIZE {
            self.block_count_hint(SDHC_MAX_TRANSFER_BLOCKS as u32)?;
            self.host.read_data_cmd(
                SdCmd::ReadMultipleBlock as u8,
                self.data_arg(offset),
                ResponseKind::R1,
                &mut buf[done..done + SDHC_MAX_TRANSFER_SIZE],
            )?;
            done += SDHC_MAX_TRANSFER_SIZE;
            offset += SDHC_MAX_TRANSFER_SIZE as u32;
        }

        let remaining = buf.len() - done;
        if remaining > SDHC_BLOCK_SIZE {
            self.block_count_hint((remaining / SDHC_BLOCK_SIZE) as u32)?;
        }

        if remaining > 0 {
            let cmd = if remaining > SDHC_BLOCK_SIZE {
                SdCmd::ReadMultipleBlock
            } else {
                SdCmd::ReadSingleBlock
            };
            self.host.read_data_cmd(
                cmd as u8,
                self.data_arg(offset),
                ResponseKind::R1,
                &mut buf[done..],
            )?;
        }

        Ok(())
    }

    /// Write `buf` starting at byte `offset`.
    ///
    /// The offset must sit on a block boundary; partial-block writes
    /// would need a read-modify-write cycle the engine does not do.
    pub fn write(&self, offset: u32, buf: &[u8]) -> SdhcResult {
        if offset as usize & (SDHC_BLOCK_SIZE - 1) != 0 {
            return Err(SdhcError::NotSupported);
        }

        let mut offset = offset;
        let mut done = 0usize;

        while buf.len() - done >= SDHC_MAX_TRANSFER_SIZE {
            self.block_count_hint(SDHC_MAX_TRANSFER_BLOCKS as u32)?;
            self.host.write_data_cmd(
                SdCmd::WriteMultipleBlock as u8,
                self.data_arg(offset),
                ResponseKind::R1,
                &buf[done..done + SDHC_MAX_TRANSFER_SIZE],
            )?;
            done += SDHC_MAX_TRANSFER_SIZE;
            offset += SDHC_MAX_TRANSFER_SIZE as u32;
        }

        let remaining = buf.len() - done;
        if remaining > SDHC_BLOCK_SIZE {
            self.block_count_hint((remaining / SDHC_BLOCK_SIZE) as u32)?;
        }

        if remaining > 0 {
            let cmd = if remaining > SDHC_BLOCK_SIZE {
                SdCmd::WriteMultipleBlock
            } else {
                SdCmd::WriteSingleBlock
            };
            self.host.write_data_cmd(
                cmd as u8,
                self.data_arg(offset),
                ResponseKind::R1,
                &buf[done..],
            )?;
        }

        Ok(())
    }

    /// CMD55 preamble with the current RCA, then the application command.
    fn issue_acmd(
        &self,
        cmd: SdAppCmd,
        arg: u32,
        kind: ResponseKind,
    ) -> SdhcResult<SdhcResponse> {
        self.host.issue_cmd(
            SdCmd::ApplicationCommand as u8,
            (self.rca as u32) << 16,
            ResponseKind::R1,
        )?;
        self.host.issue_cmd(cmd as u8, arg, kind)
    }

    /// Announce the length of the following multi-block transfer.
    ///
    /// Only a courtesy to the card: older cards ignore CMD23 and the
    /// controller stops the transfer with auto-CMD12 either way, so a
    /// timeout is not an error.
    fn block_count_hint(&self, blocks: u32) -> SdhcResult {
        match self
            .host
            .issue_cmd(SdCmd::SetBlockCount as u8, blocks, ResponseKind::R1)
        {
            Err(SdhcError::CmdTimeout) => {
                warn!("CMD23 not answered, relying on auto-CMD12");
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    /// High-capacity cards address by block index, the rest by byte.
    fn data_arg(&self, offset: u32) -> u32 {
        if self.hcs {
            offset / SDHC_BLOCK_SIZE as u32
        } else {
            offset
        }
    }

    fn card_dump(&self) {
        let name = core::str::from_utf8(&self.cid.product_name).unwrap_or("?");
        info!(
            "card {} (mfg {:#x}) ready: {} blocks of {} bytes",
            name, self.cid.manufacturer_id, self.csd.capacity_blocks, SDHC_BLOCK_SIZE
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::sdhc::regs::*;
    use crate::sdhc::test_support::FakeController;
    use super::*;

    /// One preloaded response word serving the whole happy path:
    /// check pattern 0xAB for CMD8, OCR ready for ACMD41, RCA 0x8000
    /// for CMD3.
    const RESPONSE0: u32 = 0x8000_01AB;

    fn ready_card(fake: &FakeController) -> SdCard {
        fake.set_present_state(
            (SdhcPresentState::CARD_INSERTED | SdhcPresentState::BUFFER_READ_READY).bits(),
        );
        fake.set_normal_status(
            (SdhcNormalInt::CMD_COMPLETE | SdhcNormalInt::TRANSFER_COMPLETE).bits(),
        );
        // base clock 50 MHz
        fake.write16(SDHC_CAPABILITIES_OFFSET, 50 << 8);
        fake.write32(SDHC_RESPONSE_OFFSET, RESPONSE0);
        // SCR byte 1 = 0x04: 4-bit bus supported
        fake.write32(SDHC_BUFFER_DATA_PORT_OFFSET, 0x0000_0400);
        SdCard::new(fake.base(), false)
    }

    #[test]
    fn init_card_without_card_reports_no_card() {
        let fake = FakeController::new();
        let mut card = SdCard::new(fake.base(), false);
        assert!(!card.card_present());
        assert_eq!(card.init_card(), Err(SdhcError::NoCard));
    }

    #[test]
    fn init_card_walks_the_identification_sequence() {
        let fake = FakeController::new();
        let mut card = ready_card(&fake);

        card.init_card().unwrap();

        assert_eq!(card.rca(), 0x8000);
        assert!(!card.high_capacity());

        // interrupt statuses the engines poll for are enabled
        assert_eq!(fake.read16(SDHC_NORMAL_INT_STATUS_ENABLE_OFFSET), 0xB3);
        assert_eq!(fake.read16(SDHC_ERROR_INT_STATUS_ENABLE_OFFSET), 0x17F);
        // longest hardware timeout, 3.3V bus power
        assert_eq!(fake.read8(SDHC_TIMEOUT_CONTROL_OFFSET), 0x0E);
        assert_eq!(fake.read8(SDHC_POWER_CONTROL_OFFSET), 0x0F);
        // 25 MHz out of the 50 MHz base: divider 1, both enables
        assert_eq!(fake.read16(SDHC_CLOCK_CONTROL_OFFSET), 0x0105);
        // block length restored after the SCR detour
        assert_eq!(fake.read16(SDHC_BLOCK_SIZE_OFFSET), 512);
        // the SCR advertised 4 DAT lines
        assert_eq!(fake.read8(SDHC_HOST_CONTROL_1_OFFSET), 0x02);
    }

    #[test]
    fn init_card_records_high_capacity_from_ocr() {
        let fake = FakeController::new();
        let mut card = ready_card(&fake);
        // OCR bit 30: card confirms block addressing
        fake.write32(SDHC_RESPONSE_OFFSET, RESPONSE0 | 1 << 30);

        card.init_card().unwrap();
        assert!(card.high_capacity());
    }

    #[test]
    fn data_commands_address_blocks_on_high_capacity_cards() {
        let fake = FakeController::new();
        let mut card = ready_card(&fake);
        let mut buf = [0u8; 512];

        card.hcs = true;
        card.read(4 * 512, &mut buf).unwrap();
        assert_eq!(fake.read32(SDHC_ARGUMENT_OFFSET), 4);

        card.hcs = false;
        card.read(4 * 512, &mut buf).unwrap();
        assert_eq!(fake.read32(SDHC_ARGUMENT_OFFSET), 4 * 512);
    }

    #[test]
    fn unaligned_read_prefix_comes_from_the_containing_block() {
        let fake = FakeController::new();
        let card = ready_card(&fake);
        // block content repeats 00 01 02 03 per the data-port word
        fake.write32(SDHC_BUFFER_DATA_PORT_OFFSET, 0x0302_0100);

        let mut buf = [0xFFu8; 10];
        card.read(3, &mut buf).unwrap();

        assert_eq!(buf, [3, 0, 1, 2, 3, 0, 1, 2, 3, 0]);
        // one CMD17 at the unaligned byte address
        assert_eq!(fake.read32(SDHC_ARGUMENT_OFFSET), 3);
        assert_eq!(
            fake.read16(SDHC_COMMAND_OFFSET),
            SdhcCommand::compose(SdCmd::ReadSingleBlock as u8, ResponseKind::R1, true).bits()
        );
    }

    #[test]
    fn multiblock_read_ends_with_cmd18_and_block_count() {
        let fake = FakeController::new();
        let card = ready_card(&fake);

        let mut buf = [0u8; 3 * 512];
        card.read(0, &mut buf).unwrap();

        assert_eq!(fake.read16(SDHC_BLOCK_COUNT_OFFSET), 3);
        assert_eq!(
            fake.read16(SDHC_COMMAND_OFFSET),
            SdhcCommand::compose(SdCmd::ReadMultipleBlock as u8, ResponseKind::R1, true).bits()
        );
        assert_eq!(
            fake.read16(SDHC_TRANSFER_MODE_OFFSET),
            (SdhcTransferMode::MULTI_BLOCK
                | SdhcTransferMode::BLOCK_COUNT_ENABLE
                | SdhcTransferMode::READ
                | SdhcTransferMode::AUTO_CMD12_ENABLE)
                .bits()
        );
    }

    #[test]
    fn multiblock_write_ends_with_cmd25_and_block_count() {
        let fake = FakeController::new();
        let card = ready_card(&fake);
        fake.set_present_state(
            (SdhcPresentState::CARD_INSERTED | SdhcPresentState::BUFFER_WRITE_READY).bits(),
        );

        let buf = [0xA5u8; 2 * 512];
        card.write(0, &buf).unwrap();

        assert_eq!(fake.read16(SDHC_BLOCK_COUNT_OFFSET), 2);
        assert_eq!(
            fake.read16(SDHC_COMMAND_OFFSET),
            SdhcCommand::compose(SdCmd::WriteMultipleBlock as u8, ResponseKind::R1, true).bits()
        );
        assert_eq!(fake.read32(SDHC_BUFFER_DATA_PORT_OFFSET), 0xA5A5_A5A5);
    }

    #[test]
    fn unaligned_write_is_rejected_before_any_register_touch() {
        let fake = FakeController::new();
        let card = ready_card(&fake);

        let buf = [0u8; 512];
        assert_eq!(card.write(3, &buf), Err(SdhcError::NotSupported));
        // nothing was programmed
        assert_eq!(fake.read16(SDHC_COMMAND_OFFSET), 0);
        assert_eq!(fake.read32(SDHC_ARGUMENT_OFFSET), 0);
    }
}
