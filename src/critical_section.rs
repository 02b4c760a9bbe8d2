use core::{
    arch::asm,
    sync::atomic::{compiler_fence, Ordering},
};

use critical_section::{set_impl, Impl, RawRestoreState};

/// Mask bit for IRQs in the CPSR.
const CPSR_I: u32 = 1 << 7;

struct SingleCoreCriticalSection;

// Safety: The implementation upholds the safety invariants of the `aquire` and `release`
// functions. The bootloader only runs on the boot CPU, so masking IRQs is enough.
unsafe impl Impl for SingleCoreCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let mut cpsr: u32;
        // Safety: Reading the CPSR has no side effects. See section A4.1.32 of the ARMv6 manual.
        unsafe { asm!("mrs {}, cpsr", out(reg) cpsr, options(nomem, nostack, preserves_flags)) };
        if cpsr & CPSR_I == 0 {
            // Safety: IRQs were enabled, so we are not inside of a critical section.
            unsafe { asm!("cpsid i", options(nomem, nostack)) };
            compiler_fence(Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            compiler_fence(Ordering::SeqCst);
            // Safety: IRQs were enabled when the outermost critical section was entered.
            unsafe { asm!("cpsie i", options(nomem, nostack)) };
        }
    }
}

set_impl!(SingleCoreCriticalSection);
