use bitflags::Flags;
use core::{ops, ptr::NonNull};

/*
 * Implement a BitsOps trait for all bitflag!
 * Facilitates common operations for all bitflag!
 * The principle is that all bitflag! are structs, and structs implement ops::BitOr and other operations
 * At this point, implement a BitsOps trait for structs that implement ops::BitOr
 * This way all bitflag! can be recognized as implementing the BitsOps trait
*/
pub trait BitsOps:
    ops::BitOr<Output = Self>
    + ops::BitAnd<Output = Self>
    + ops::Not<Output = Self>
    + ops::BitXor<Output = Self>
    + Sized
{
}
impl<T> BitsOps for T where
    T: ops::BitOr<Output = Self>
        + ops::BitAnd<Output = Self>
        + ops::Not<Output = Self>
        + ops::BitXor<Output = Self>
{
}

/*
 * Create a contiguous bitmask starting at bit position @l and ending at
 * position @h. For example
 * GENMASK(15, 8) gives us the 32bit vector 0x0000ff00.
 */
#[macro_export]
macro_rules! genmask {
    ($h:expr, $l:expr) => {
        (((!0u32) - (1u32 << $l) + 1) & ((!0u32) >> (32 - 1 - $h)))
    };
}

/* set 32-bit register [a:b] as x, where a is high bit, b is low bit, x is setting/getting value */
#[macro_export]
macro_rules! get_reg32_bits {
    ($reg:expr, $a:expr, $b:expr) => {
        ($reg & genmask!($a, $b)) >> $b
    };
}

#[macro_export]
macro_rules! set_reg32_bits {
    ($reg:expr, $a:expr, $b:expr) => {
        (($reg << $b) & genmask!($a, $b))
    };
}

/// Volatile accessor for a memory-mapped register file.
///
/// The SDHC register layout mixes 8, 16 and 32-bit registers, and the
/// controller requires every access to be a single load/store at the
/// declared width.
#[derive(Debug)]
pub struct Reg {
    pub addr: NonNull<u8>,
}

impl Reg {
    pub fn new(addr: NonNull<u8>) -> Self {
        Self { addr }
    }

    pub fn read_8(&self, reg: u32) -> u8 {
        unsafe {
            let ptr = self.addr.add(reg as _);
            ptr.cast().read_volatile()
        }
    }

    pub fn write_8(&self, reg: u32, val: u8) {
        unsafe {
            let ptr = self.addr.add(reg as _);
            ptr.cast().write_volatile(val);
        }
    }

    pub fn read_16(&self, reg: u32) -> u16 {
        unsafe {
            let ptr = self.addr.add(reg as _);
            ptr.cast().read_volatile()
        }
    }

    pub fn write_16(&self, reg: u32, val: u16) {
        unsafe {
            let ptr = self.addr.add(reg as _);
            ptr.cast().write_volatile(val);
        }
    }

    pub fn read_32(&self, reg: u32) -> u32 {
        unsafe {
            let ptr = self.addr.add(reg as _);
            ptr.cast().read_volatile()
        }
    }

    pub fn write_32(&self, reg: u32, val: u32) {
        unsafe {
            let ptr = self.addr.add(reg as _);
            ptr.cast().write_volatile(val);
        }
    }

    pub fn read_reg<F: FlagReg>(&self) -> F {
        F::from_bits_retain(self.read_32(F::REG))
    }

    pub fn write_reg<F: FlagReg>(&self, val: F) {
        self.write_32(F::REG, val.bits())
    }

    pub fn read_reg16<F: FlagReg16>(&self) -> F {
        F::from_bits_retain(self.read_16(F::REG))
    }

    pub fn write_reg16<F: FlagReg16>(&self, val: F) {
        self.write_16(F::REG, val.bits())
    }

    pub fn read_reg8<F: FlagReg8>(&self) -> F {
        F::from_bits_retain(self.read_8(F::REG))
    }

    pub fn write_reg8<F: FlagReg8>(&self, val: F) {
        self.write_8(F::REG, val.bits())
    }

    pub fn modify_reg8<F: FlagReg8>(&self, f: impl Fn(F) -> F) {
        let old = self.read_reg8::<F>();
        self.write_reg8(f(old));
    }

    pub fn set_reg8<F: FlagReg8 + Copy + BitsOps>(&self, val: F) {
        self.modify_reg8(|old| val | old)
    }

    pub fn get_base_addr(&self) -> NonNull<u8> {
        self.addr
    }
}

impl PartialEq for Reg {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

/// Ties a 32-bit `bitflags!` struct to its register offset.
pub trait FlagReg: Flags<Bits = u32> {
    const REG: u32;
}

/// Ties a 16-bit `bitflags!` struct to its register offset.
pub trait FlagReg16: Flags<Bits = u16> {
    const REG: u32;
}

/// Ties an 8-bit `bitflags!` struct to its register offset.
pub trait FlagReg8: Flags<Bits = u8> {
    const REG: u32;
}
