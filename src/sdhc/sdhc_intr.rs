//! Interrupt reconciliation for SDHC operations
//!
//! The controller is polled rather than hooked: the engines advance one
//! interrupt event at a time by spinning on the normal interrupt status
//! register, acknowledging what they observe by write-back, and
//! classifying errors from the error status register.

use log::debug;

use super::Sdhc;
use super::err::*;
use super::regs::*;

impl Sdhc {
    /// Advance one interrupt event.
    ///
    /// Spins until the normal interrupt status is non-zero, acknowledges
    /// it and classifies the outcome. On success the raw status is
    /// handed back so the caller can match it against the completion
    /// pattern it expects.
    pub(crate) fn next_interrupt(&self) -> SdhcResult<SdhcNormalInt> {
        let reg = self.config.reg();

        let mut status = SdhcNormalInt::empty();
        while status.is_empty() {
            status = reg.read_reg16::<SdhcNormalInt>();
        }

        self.reconcile(status)?;
        Ok(status)
    }

    /// Acknowledge an observed normal interrupt status and classify it.
    ///
    /// Consumed bits are cleared by write-back before anything else; a
    /// set error bit routes through the error status register, a card
    /// removal surfaces as [`SdhcError::NoCard`].
    pub(crate) fn reconcile(&self, status: SdhcNormalInt) -> SdhcResult {
        let reg = self.config.reg();
        reg.write_reg16(status);

        if status.contains(SdhcNormalInt::ERROR) {
            let error_status = reg.read_reg16::<SdhcErrorInt>();
            let rc = self.classify_error(error_status);
            reg.write_reg16(error_status);
            debug!("error interrupt {:#x} -> {:?}", error_status, rc);
            return Err(rc);
        }

        if status.contains(SdhcNormalInt::CARD_REMOVAL) {
            return Err(SdhcError::NoCard);
        }

        Ok(())
    }

    /// Pick up whatever normal interrupt bits are pending without
    /// waiting for any. A clean (zero) status is not an error.
    pub(crate) fn drain_pending(&self) -> SdhcResult {
        let status = self.config.reg().read_reg16::<SdhcNormalInt>();
        self.reconcile(status)
    }

    fn classify_error(&self, status: SdhcErrorInt) -> SdhcError {
        if status.contains(SdhcErrorInt::AUTO_CMD) {
            let auto_cmd = self.config.reg().read_reg16::<SdhcAutoCmdError>();
            if auto_cmd.contains(SdhcAutoCmdError::TIMEOUT) {
                return SdhcError::CmdTimeout;
            }
            return SdhcError::CmdError;
        }

        if status.intersects(SdhcErrorInt::DATA_CRC | SdhcErrorInt::DATA_END_BIT) {
            return SdhcError::DataError;
        }

        if status.contains(SdhcErrorInt::DATA_TIMEOUT) {
            return SdhcError::DataTimeout;
        }

        if status.intersects(SdhcErrorInt::CMD_CRC | SdhcErrorInt::CMD_END_BIT | SdhcErrorInt::CMD_INDEX)
        {
            return SdhcError::CmdError;
        }

        if status.contains(SdhcErrorInt::CMD_TIMEOUT) {
            // ranked below the command-field errors: both can be set at
            // once during a transfer and the richer one wins
            return SdhcError::CmdTimeout;
        }

        // we didn't identify the error
        SdhcError::CmdError
    }
}
