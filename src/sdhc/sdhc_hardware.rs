//! Direct register operations: reset, clocking, power, interrupt
//! status enables and the capability probe.

use log::debug;

use super::Sdhc;
use super::constants::*;
use super::regs::*;

impl Sdhc {
    /// Reset the whole controller. The bit self-clears in hardware; no
    /// state survives except the capability registers.
    pub(crate) fn software_reset(&self) {
        let reg = self.config.reg();
        reg.write_reg8(SdhcSoftwareReset::RESET_ALL);
    }

    /// Start the internal clock so it is stable by the time the card
    /// bring-up needs the bus clock.
    pub(crate) fn internal_clock_start(&self) {
        let reg = self.config.reg();
        reg.write_reg16(SdhcClockControl::INTERNAL_CLOCK_ENABLE);
    }

    /// Whether a card sits in the slot, per the present state register.
    pub fn card_present(&self) -> bool {
        let reg = self.config.reg();
        reg.read_reg::<SdhcPresentState>()
            .contains(SdhcPresentState::CARD_INSERTED)
    }

    /// Enable the interrupt statuses the polled engines consume and
    /// clear both status registers by write-back.
    pub(crate) fn interrupt_statuses_enable(&self) {
        let reg = self.config.reg();

        reg.write_reg16(SdhcNormalIntEnable::ENGINE_STATUSES);
        let pending = reg.read_reg16::<SdhcNormalInt>();
        reg.write_reg16(pending);

        reg.write_reg16(SdhcErrorIntEnable::ALL_ERRORS);
        let pending = reg.read_reg16::<SdhcErrorInt>();
        reg.write_reg16(pending);
    }

    /// Program the longest data timeout the controller offers; the
    /// hardware timeout is the only liveness bound the poll loops have.
    pub(crate) fn timeout_setup(&self) {
        let reg = self.config.reg();
        reg.write_reg8(SdhcTimeoutControl::DATA_TIMEOUT_MAX);
    }

    /// Read the capability register and record the clock properties.
    pub(crate) fn capabilities_load(&mut self) {
        let reg = self.config.reg();
        let capabilities = reg.read_16(SDHC_CAPABILITIES_OFFSET) as u32;

        self.base_clk_mhz = get_reg32_bits!(capabilities, 15, 8) as u8;
        self.timeout_clk_freq = get_reg32_bits!(capabilities, 5, 0) as u8;
        self.timeout_is_mhz = capabilities & (1 << 3) != 0;

        debug!(
            "capabilities: base clock {} MHz, timeout clock {} {}",
            self.base_clk_mhz,
            self.timeout_clk_freq,
            if self.timeout_is_mhz { "MHz" } else { "kHz" }
        );
    }

    /// Switch bus power on at 3.3 V.
    pub(crate) fn power_up(&self) {
        let reg = self.config.reg();
        reg.write_reg8(SdhcPowerControl::VOLTAGE_3V3 | SdhcPowerControl::BUS_POWER);
    }

    /// Program the SD clock for the requested frequency.
    ///
    /// The divider is the power of two that brings the base clock at or
    /// below the target; both clock enables ride along in the low byte.
    pub(crate) fn clock_setup(&self, freq_khz: u32) {
        let divider = self.clock_divider(freq_khz);
        let reg = self.config.reg();
        reg.write_reg16(SdhcClockControl::enabled_with_divider(divider));
        debug!("clock set to {freq_khz} kHz, divider {divider:#x}");
    }

    fn clock_divider(&self, freq_khz: u32) -> u8 {
        let mut base_freq_khz = self.base_clk_mhz as u32 * 1000;
        if freq_khz >= base_freq_khz {
            return 0;
        }

        let mut shift = 0;
        while freq_khz < base_freq_khz {
            base_freq_khz >>= 1;
            shift += 1;
        }

        if shift >= 8 {
            return 1 << 7;
        }
        1 << (shift - 1)
    }

    /// Put the host side of the bus into 4-bit mode.
    pub(crate) fn bus_width_4bit_set(&self) {
        let reg = self.config.reg();
        reg.set_reg8(SdhcHostControl1::DATA_WIDTH_4BIT);
    }

    /// Program the block size register.
    pub(crate) fn block_size_set(&self, bytes: u16) {
        let reg = self.config.reg();
        reg.write_16(SDHC_BLOCK_SIZE_OFFSET, bytes);
    }
}
