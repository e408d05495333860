//! Data-bearing command execution
//!
//! Orchestrates block sizing, multi-block programming, auto-CMD12 and
//! the per-block PIO hand-off with the controller's buffer-ready
//! signalling, then reconciles the trailing completion interrupts.

use log::debug;

use super::Sdhc;
use super::constants::*;
use super::err::*;
use super::regs::*;
use super::sdhc_resp::{ResponseKind, SdhcResponse, latched_response};

impl Sdhc {
    /// Issue a data-read command and drain the payload into `buf`.
    ///
    /// `buf.len()` must be a multiple of 512, or exactly 8 for the SCR
    /// fetch, and at most `0xFFFF * 512`.
    pub fn read_data_cmd(
        &self,
        index: u8,
        arg: u32,
        kind: ResponseKind,
        buf: &mut [u8],
    ) -> SdhcResult<SdhcResponse> {
        self.data_cmd_setup(index, arg, kind, TransferDirection::Read, buf.len())?;

        for block in buf.chunks_mut(SDHC_BLOCK_SIZE) {
            self.wait_buffer_read_ready()?;
            self.pio_read_block(block);
        }

        /* pick up any completion bits the block loop left pending */
        self.drain_pending()?;

        Ok(latched_response(self.config.reg(), kind))
    }

    /// Issue a data-write command, feeding the payload from `buf`.
    ///
    /// Same size rules as [`Sdhc::read_data_cmd`]. After the last block
    /// the engine insists on a transfer-complete interrupt, tolerating
    /// up to two spurious events (a stale buffer-write-ready or a late
    /// command-complete); if the DAT line is still active afterwards the
    /// controller is running the auto-CMD12 and one more
    /// transfer-complete is awaited.
    pub fn write_data_cmd(
        &self,
        index: u8,
        arg: u32,
        kind: ResponseKind,
        buf: &[u8],
    ) -> SdhcResult<SdhcResponse> {
        self.data_cmd_setup(index, arg, kind, TransferDirection::Write, buf.len())?;

        for block in buf.chunks(SDHC_BLOCK_SIZE) {
            self.wait_buffer_write_ready()?;
            self.pio_write_block(block);
        }

        let mut status = self.next_interrupt()?;
        let mut retries = 2;
        while !status.contains(SdhcNormalInt::TRANSFER_COMPLETE) {
            if retries == 0 {
                debug!(
                    "wrong interrupt, expected transfer complete, got {:#x}",
                    status.bits()
                );
                return Err(SdhcError::WrongInterrupt);
            }
            status = self.next_interrupt()?;
            retries -= 1;
        }

        let reg = self.config.reg();
        if reg
            .read_reg::<SdhcPresentState>()
            .contains(SdhcPresentState::DAT_LINE_ACTIVE)
        {
            /* auto-CMD12 still on the bus, one more transfer complete follows */
            let status = self.next_interrupt()?;
            if !status.contains(SdhcNormalInt::TRANSFER_COMPLETE) {
                debug!(
                    "wrong interrupt, expected transfer complete, got {:#x}",
                    status.bits()
                );
                return Err(SdhcError::WrongInterrupt);
            }
        } else {
            /* clear any transfer complete we might have missed */
            self.drain_pending()?;
        }

        Ok(latched_response(reg, kind))
    }

    fn data_cmd_setup(
        &self,
        index: u8,
        arg: u32,
        kind: ResponseKind,
        direction: TransferDirection,
        size: usize,
    ) -> SdhcResult {
        if size & (SDHC_BLOCK_SIZE - 1) != 0 && size != SDHC_SCR_SIZE {
            return Err(SdhcError::NotSupported);
        }
        if size > SDHC_MAX_TRANSFER_SIZE {
            return Err(SdhcError::NotSupported);
        }

        let reg = self.config.reg();

        let mut mode = SdhcTransferMode::empty();
        if size > SDHC_BLOCK_SIZE {
            reg.write_16(SDHC_BLOCK_COUNT_OFFSET, (size / SDHC_BLOCK_SIZE) as u16);
            mode |= SdhcTransferMode::MULTI_BLOCK | SdhcTransferMode::BLOCK_COUNT_ENABLE;
        }
        if direction == TransferDirection::Read {
            mode |= SdhcTransferMode::READ;
        }
        if size != SDHC_SCR_SIZE {
            mode |= SdhcTransferMode::AUTO_CMD12_ENABLE;
        }

        reg.write_reg16(mode);
        reg.write_32(SDHC_ARGUMENT_OFFSET, arg);

        let cmd = SdhcCommand::compose(index, kind, true);
        debug!(
            "CMD{index} arg {arg:#x} cmd {:#x}, {size} bytes {direction:?}",
            cmd.bits()
        );
        reg.write_reg16(cmd);

        Ok(())
    }

    /// Wait until the controller has a block ready in the read buffer,
    /// either immediately per present state or after a buffer-read-ready
    /// interrupt.
    fn wait_buffer_read_ready(&self) -> SdhcResult {
        let reg = self.config.reg();
        loop {
            if reg
                .read_reg::<SdhcPresentState>()
                .contains(SdhcPresentState::BUFFER_READ_READY)
            {
                return Ok(());
            }

            let status = self.next_interrupt()?;
            if !status
                .intersects(SdhcNormalInt::BUFFER_READ_READY | SdhcNormalInt::CMD_COMPLETE)
            {
                debug!(
                    "wrong interrupt, expected buffer read ready, got {:#x}",
                    status.bits()
                );
                return Err(SdhcError::WrongInterrupt);
            }
        }
    }

    /// Write-side counterpart of [`Sdhc::wait_buffer_read_ready`].
    fn wait_buffer_write_ready(&self) -> SdhcResult {
        let reg = self.config.reg();
        loop {
            if reg
                .read_reg::<SdhcPresentState>()
                .contains(SdhcPresentState::BUFFER_WRITE_READY)
            {
                return Ok(());
            }

            let status = self.next_interrupt()?;
            if !status
                .intersects(SdhcNormalInt::BUFFER_WRITE_READY | SdhcNormalInt::CMD_COMPLETE)
            {
                debug!(
                    "wrong interrupt, expected buffer write ready, got {:#x}",
                    status.bits()
                );
                return Err(SdhcError::WrongInterrupt);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::FakeController;
    use super::*;

    #[test]
    fn rejects_sizes_off_the_block_grid() {
        let fake = FakeController::new();
        let sdhc = fake.sdhc();
        let mut buf = [0u8; 100];
        assert_eq!(
            sdhc.read_data_cmd(17, 0, ResponseKind::R1, &mut buf),
            Err(SdhcError::NotSupported)
        );
        assert_eq!(
            sdhc.write_data_cmd(24, 0, ResponseKind::R1, &buf),
            Err(SdhcError::NotSupported)
        );
    }

    #[test]
    fn rejects_transfers_beyond_the_block_count_register() {
        let fake = FakeController::new();
        let sdhc = fake.sdhc();
        // one block past what the 16-bit block count can express
        let len = (SDHC_MAX_TRANSFER_BLOCKS + 1) * SDHC_BLOCK_SIZE;
        let buf = std::vec![0u8; len];
        assert_eq!(
            sdhc.write_data_cmd(25, 0, ResponseKind::R1, &buf),
            Err(SdhcError::NotSupported)
        );
    }

    #[test]
    fn scr_read_drains_eight_bytes() {
        let fake = FakeController::new();
        fake.set_present_state(SdhcPresentState::BUFFER_READ_READY.bits());
        fake.write32(SDHC_BUFFER_DATA_PORT_OFFSET, 0x0405_0201);
        fake.write32(SDHC_RESPONSE_OFFSET, 0x0000_0900);
        let sdhc = fake.sdhc();

        let mut scr = [0u8; 8];
        let response = sdhc
            .read_data_cmd(51, 0, ResponseKind::R1, &mut scr)
            .unwrap();
        assert_eq!(response.card_status(), Some(0x0000_0900));
        // two words, little-endian scatter
        assert_eq!(scr, [0x01, 0x02, 0x05, 0x04, 0x01, 0x02, 0x05, 0x04]);

        // sub-block transfer: no auto-CMD12, no multi-block
        assert_eq!(
            fake.read16(SDHC_TRANSFER_MODE_OFFSET),
            SdhcTransferMode::READ.bits()
        );
        // data present flag set in the command register
        assert!(fake.read16(SDHC_COMMAND_OFFSET) & SdhcCommand::DATA_PRESENT.bits() != 0);
    }

    #[test]
    fn multiblock_read_programs_count_and_auto_cmd12() {
        let fake = FakeController::new();
        fake.set_present_state(SdhcPresentState::BUFFER_READ_READY.bits());
        fake.write32(SDHC_BUFFER_DATA_PORT_OFFSET, 0xA5A5_A5A5);
        let sdhc = fake.sdhc();

        let mut buf = [0u8; 3 * SDHC_BLOCK_SIZE];
        sdhc.read_data_cmd(18, 0x40, ResponseKind::R1, &mut buf)
            .unwrap();

        assert!(buf.iter().all(|&b| b == 0xA5));
        assert_eq!(fake.read16(SDHC_BLOCK_COUNT_OFFSET), 3);
        assert_eq!(
            fake.read16(SDHC_TRANSFER_MODE_OFFSET),
            (SdhcTransferMode::MULTI_BLOCK
                | SdhcTransferMode::BLOCK_COUNT_ENABLE
                | SdhcTransferMode::READ
                | SdhcTransferMode::AUTO_CMD12_ENABLE)
                .bits()
        );
        assert_eq!(fake.read32(SDHC_ARGUMENT_OFFSET), 0x40);
    }

    #[test]
    fn single_block_write_feeds_buffer_and_waits_completion() {
        let fake = FakeController::new();
        fake.set_present_state(SdhcPresentState::BUFFER_WRITE_READY.bits());
        fake.set_normal_status(SdhcNormalInt::TRANSFER_COMPLETE.bits());
        let sdhc = fake.sdhc();

        let buf = [0x5Au8; SDHC_BLOCK_SIZE];
        sdhc.write_data_cmd(24, 0, ResponseKind::R1, &buf).unwrap();

        // last word written to the data port
        assert_eq!(fake.read32(SDHC_BUFFER_DATA_PORT_OFFSET), 0x5A5A_5A5A);
        // single block: direction bit clear, auto-CMD12 still enabled
        assert_eq!(
            fake.read16(SDHC_TRANSFER_MODE_OFFSET),
            SdhcTransferMode::AUTO_CMD12_ENABLE.bits()
        );
    }

    #[test]
    fn write_gives_up_after_three_interrupts_without_completion() {
        let fake = FakeController::new();
        fake.set_present_state(SdhcPresentState::BUFFER_WRITE_READY.bits());
        // a buffer-write-ready that never turns into a transfer complete
        fake.set_normal_status(SdhcNormalInt::BUFFER_WRITE_READY.bits());
        let sdhc = fake.sdhc();

        let buf = [0u8; SDHC_BLOCK_SIZE];
        assert_eq!(
            sdhc.write_data_cmd(24, 0, ResponseKind::R1, &buf),
            Err(SdhcError::WrongInterrupt)
        );
    }
}
