//! PIO (Programmed I/O) transfer implementation
//!
//! Moves data between a caller buffer and the controller's buffer data
//! port one 32-bit word at a time, little-endian on the host side.

use super::Sdhc;
use super::constants::SDHC_BUFFER_DATA_PORT_OFFSET;

impl Sdhc {
    /// Drain one ready block from the buffer data port.
    pub(crate) fn pio_read_block(&self, block: &mut [u8]) {
        let reg = self.config.reg();
        for chunk in block.chunks_exact_mut(4) {
            let word = reg.read_32(SDHC_BUFFER_DATA_PORT_OFFSET);
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }

    /// Fill the buffer data port with one block.
    pub(crate) fn pio_write_block(&self, block: &[u8]) {
        let reg = self.config.reg();
        for chunk in block.chunks_exact(4) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            reg.write_32(SDHC_BUFFER_DATA_PORT_OFFSET, word);
        }
    }
}
