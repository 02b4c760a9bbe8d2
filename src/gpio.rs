//! Input lines of the Nomadik GPIO controller found in the Ux500 SoCs.
//!
//! The controller is split into banks of 32 lines. Only what the key checks need is exposed: a
//! line can be claimed, switched to input, and read.

use core::{
    convert::Infallible,
    ptr::{read_volatile, write_volatile},
    sync::atomic::{AtomicU32, Ordering},
};

use crate::hal;

const LINES_PER_BANK: u16 = 32;

/// Bank base addresses on the DB8500.
const BANK_BASES: [usize; 9] = [
    0x8012_e000,
    0x8012_e080,
    0x8000_e000,
    0x8000_e080,
    0x8000_e100,
    0x8000_e180,
    0x8011_e000,
    0x8011_e080,
    0xa03f_e000,
];

/// Data register, reflects the level of every line of the bank.
const GPIO_DAT: usize = 0x00;
/// Direction clear register, writing a 1 makes the line an input.
const GPIO_DIRC: usize = 0x18;

static GPIO_SET: GpioSet = GpioSet::new();

struct GpioSet {
    banks: [AtomicU32; BANK_BASES.len()],
}

impl GpioSet {
    const fn new() -> Self {
        Self {
            banks: [const { AtomicU32::new(0) }; BANK_BASES.len()],
        }
    }

    /// Returns true if the line was free and is now claimed.
    fn lock(&self, gpio: u16) -> bool {
        let Some(bank) = self.banks.get((gpio / LINES_PER_BANK) as usize) else {
            return false;
        };
        let mask = 1 << (gpio % LINES_PER_BANK);
        bank.fetch_or(mask, Ordering::Acquire) & mask == 0
    }

    fn unlock(&self, gpio: u16) {
        if let Some(bank) = self.banks.get((gpio / LINES_PER_BANK) as usize) {
            let mask = 1 << (gpio % LINES_PER_BANK);
            bank.fetch_and(!mask, Ordering::Release);
        }
    }
}

/// A claimed GPIO line configured as an input.
///
/// The claim is released when the pin is dropped.
#[derive(Debug)]
pub struct Pin {
    bank: *mut u32,
    gpio: u16,
}

impl Pin {
    /// Claim global GPIO number `gpio` and make it an input.
    ///
    /// Returns `None` if the line does not exist or is already claimed.
    pub fn get(gpio: u16) -> Option<Self> {
        let base = *BANK_BASES.get((gpio / LINES_PER_BANK) as usize)?;
        // Safety: The bank base comes from the DB8500 memory map.
        unsafe { Self::from_bank(base as *mut u32, gpio) }
    }

    /// Claim `gpio` using the register block at `bank`.
    ///
    /// # Safety
    ///
    /// `bank` must point to the register block of the bank holding `gpio`, valid for volatile reads
    /// and writes for as long as the pin lives.
    pub unsafe fn from_bank(bank: *mut u32, gpio: u16) -> Option<Self> {
        if !GPIO_SET.lock(gpio) {
            return None;
        }

        let mask = 1u32 << (gpio % LINES_PER_BANK);
        // Safety: The caller guarantees the register block is valid, and the direction clear
        // register only affects the lines whose bit is set.
        unsafe { write_volatile(bank.byte_add(GPIO_DIRC), mask) };

        Some(Pin { bank, gpio })
    }

    /// Global GPIO number of the line.
    pub fn gpio(&self) -> u16 {
        self.gpio
    }

    /// Returns `true` if the line is high, `false` if the line is low.
    pub fn level(&self) -> bool {
        let mask = 1u32 << (self.gpio % LINES_PER_BANK);
        // Safety: The register block is valid for reads, see `from_bank`.
        unsafe { read_volatile(self.bank.byte_add(GPIO_DAT)) & mask != 0 }
    }
}

impl Drop for Pin {
    fn drop(&mut self) {
        GPIO_SET.unlock(self.gpio);
    }
}

impl hal::digital::ErrorType for Pin {
    type Error = Infallible;
}

impl hal::digital::InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}
