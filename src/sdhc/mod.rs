//! # SDHC Controller Module
//!
//! Core functionality for an SD Host Controller Specification v3.x
//! compliant host. It covers register access, command issue, PIO data
//! transfer and interrupt-status reconciliation; the SD-card protocol
//! built on top of it lives in [`crate::sd`].
//!
//! ## Modules
//!
//! - **constants**: register offsets and transfer limits
//! - **err**: error types and Result definitions
//! - **regs**: typed register definitions
//! - **sdhc_cmd**: non-data command engine
//! - **sdhc_data**: data-bearing command engine
//! - **sdhc_pio**: buffer data port drain/fill
//! - **sdhc_intr**: interrupt-status reconciliation
//! - **sdhc_hardware**: reset, clock, power and capability plumbing
//! - **sdhc_resp**: response kinds and decoding

pub mod constants;
pub mod err;
pub mod regs;

mod sdhc_cmd;
mod sdhc_config;
mod sdhc_data;
mod sdhc_hardware;
mod sdhc_intr;
mod sdhc_pio;
pub mod sdhc_resp;

pub use err::*;
pub use sdhc_config::SdhcConfig;
pub use sdhc_resp::{ResponseKind, SdhcResponse};

use core::ptr::NonNull;

use log::info;

/// SDHC host controller driver.
///
/// Owns the memory-mapped register file of one controller instance and
/// offers the command/data engines the card layer is built from. All
/// waits are busy polls on interrupt status; the controller's hardware
/// timeouts are the only liveness bound.
///
/// The clock fields start out zero and are populated from the
/// capability register during card bring-up.
#[derive(Debug)]
pub struct Sdhc {
    config: SdhcConfig,
    /// Base clock frequency in MHz, from the capability register
    pub(crate) base_clk_mhz: u8,
    /// Timeout clock frequency, from the capability register
    pub(crate) timeout_clk_freq: u8,
    /// Whether the timeout clock field is in MHz rather than kHz
    pub(crate) timeout_is_mhz: bool,
}

impl Sdhc {
    /// Take over the controller at `addr`.
    ///
    /// Resets the controller so no state is left over between runs and
    /// starts the internal clock so that it is stable by the time the
    /// card is brought up.
    ///
    /// `addr` must map an SDHC v3.x register file and stay valid for
    /// the driver's lifetime; the driver assumes exclusive use.
    pub fn new(addr: NonNull<u8>, is_simulation: bool) -> Self {
        let sdhc = Sdhc {
            config: SdhcConfig::new(addr, is_simulation),
            base_clk_mhz: 0,
            timeout_clk_freq: 0,
            timeout_is_mhz: false,
        };

        sdhc.software_reset();
        sdhc.internal_clock_start();
        info!(
            "SDHC controller at {:p} reset",
            sdhc.config.reg().get_base_addr()
        );

        sdhc
    }

    /// The configuration this instance was created with.
    pub fn config(&self) -> &SdhcConfig {
        &self.config
    }
}
