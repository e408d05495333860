#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
pub mod regs;
pub mod sd;
pub mod sdhc;

pub use sd::SdCard;
pub use sdhc::Sdhc;
pub use sdhc::err::{SdhcError, SdhcResult};

use core::time::Duration;

pub trait Kernel {
    fn sleep(duration: Duration);
}

pub(crate) fn sleep(duration: Duration) {
    unsafe extern "Rust" {
        fn _sdhc_sd_sleep(duration: Duration);
    }

    unsafe {
        _sdhc_sd_sleep(duration);
    }
}

#[macro_export]
macro_rules! set_impl {
    ($t: ty) => {
        #[unsafe(no_mangle)]
        unsafe fn _sdhc_sd_sleep(duration: core::time::Duration) {
            <$t as $crate::Kernel>::sleep(duration)
        }
    };
}

#[cfg(test)]
mod test_kernel {
    use core::time::Duration;

    struct StdKernel;

    impl crate::Kernel for StdKernel {
        fn sleep(duration: Duration) {
            std::thread::sleep(duration);
        }
    }

    set_impl!(StdKernel);
}
