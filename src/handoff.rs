//! The registers passed by the primary bootloader.
//!
//! Like a Linux kernel, we are entered with `r1` holding the machine type and `r2` the address of
//! the ATAG list. The entry stub has to save them before any other code can clobber them, long
//! before there is a [`BootContext`](crate::BootContext) to put them in.

use core::cell::Cell;

use critical_section::Mutex;

/// The raw hand-off words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    /// Machine type number (`r1`).
    pub machine_id: u32,
    /// Address of the ATAG list (`r2`).
    pub atags: usize,
}

static SAVED: Mutex<Cell<Option<Handoff>>> = Mutex::new(Cell::new(None));

/// Save the boot registers. Called from the entry stub with the registers as they were on entry.
#[unsafe(no_mangle)]
pub extern "C" fn save_boot_params(_r0: usize, r1: usize, r2: usize, _r3: usize) {
    save(Handoff {
        machine_id: r1 as u32,
        atags: r2,
    });
}

/// Save the hand-off words, replacing anything saved before.
pub fn save(handoff: Handoff) {
    critical_section::with(|cs| SAVED.borrow(cs).set(Some(handoff)));
}

/// The saved hand-off words, if [`save_boot_params`] ran.
pub fn saved() -> Option<Handoff> {
    critical_section::with(|cs| SAVED.borrow(cs).get())
}
