//! Board support for Samsung phones built on the ST-Ericsson Ux500 ("stemmy").
//!
//! The vendor primary bootloader starts us with an ATAG list, the boot-parameter format early ARM
//! Linux kernels used. This crate reads the memory layout and the serial number out of that list,
//! keeps a filtered copy around for the vendor kernel (which still boots with ATAGs), and checks
//! the volume keys to pick a boot mode.
//!
//! The expected call sequence is:
//!
//! 1. [`handoff::save_boot_params`] from the entry stub, before anything else touches `r1`/`r2`.
//! 2. [`board::BootContext::on_handoff`] (or [`board::BootContext::from_handoff`]).
//! 3. [`board::BootContext::dram_init`], [`board::BootContext::dram_init_banksize`] and
//!    [`board::BootContext::board_init`].
//! 4. [`board::BootContext::misc_init`], once the heap and the environment are available.
//! 5. [`board::BootContext::on_emit`], right before jumping into the next stage.
#![cfg_attr(not(test), no_std)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod atag;
pub mod board;
pub mod config;
#[cfg(all(target_arch = "arm", target_os = "none"))]
mod critical_section;
pub mod env;
mod error;
pub mod gpio;
pub mod handoff;
pub mod keys;
pub mod scan;
pub mod transcode;

pub(crate) use embedded_hal as hal;
pub(crate) use embedded_io as eio;

pub use atag::{Record, TagKind, TagList};
pub use board::BootContext;
pub use error::Error;

trait Sealed {}

macro_rules! impl_sealed {
    ($($t:ty),*) => {
        $(
            impl Sealed for $t {}
        )*
    };
}
pub(crate) use impl_sealed;
