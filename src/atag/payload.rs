use crate::{impl_sealed, Sealed};

use super::{word, TagKind};

/// A record payload that can be decoded from the bytes following the header.
#[allow(private_bounds)]
pub trait Payload<'a>: Sealed + Sized {
    /// The record kinds carrying this payload.
    const KINDS: &'static [TagKind];

    /// Decode the payload. Returns `None` if `bytes` is too short.
    fn decode(bytes: &'a [u8]) -> Option<Self>;
}

/// `ATAG_CORE`. The payload is optional, a two word `ATAG_CORE` is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Core {
    /// Bit 0: mount the root filesystem read-only.
    pub flags: u32,
    pub pagesize: u32,
    pub rootdev: u32,
}

/// `ATAG_MEM`, one bank of physical memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mem {
    pub size: u32,
    pub start: u32,
}

/// `ATAG_INITRD` and `ATAG_INITRD2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Initrd {
    pub start: u32,
    pub size: u32,
}

/// `ATAG_SERIAL`, the 64-bit board serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialNr {
    pub low: u32,
    pub high: u32,
}

impl SerialNr {
    pub const fn value(&self) -> u64 {
        (self.high as u64) << 32 | self.low as u64
    }
}

/// `ATAG_CMDLINE`, the kernel command line without its NUL terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cmdline<'a>(pub &'a [u8]);

impl_sealed!(Core, Mem, Initrd, SerialNr, Cmdline<'_>);

impl<'a> Payload<'a> for Core {
    const KINDS: &'static [TagKind] = &[TagKind::Core];

    fn decode(bytes: &'a [u8]) -> Option<Self> {
        if bytes.is_empty() {
            return Some(Core::default());
        }
        Some(Core {
            flags: word(bytes, 0)?,
            pagesize: word(bytes, 1)?,
            rootdev: word(bytes, 2)?,
        })
    }
}

impl<'a> Payload<'a> for Mem {
    const KINDS: &'static [TagKind] = &[TagKind::Mem];

    fn decode(bytes: &'a [u8]) -> Option<Self> {
        Some(Mem {
            size: word(bytes, 0)?,
            start: word(bytes, 1)?,
        })
    }
}

impl<'a> Payload<'a> for Initrd {
    const KINDS: &'static [TagKind] = &[TagKind::Initrd, TagKind::Initrd2];

    fn decode(bytes: &'a [u8]) -> Option<Self> {
        Some(Initrd {
            start: word(bytes, 0)?,
            size: word(bytes, 1)?,
        })
    }
}

impl<'a> Payload<'a> for SerialNr {
    const KINDS: &'static [TagKind] = &[TagKind::SerialNr];

    fn decode(bytes: &'a [u8]) -> Option<Self> {
        Some(SerialNr {
            low: word(bytes, 0)?,
            high: word(bytes, 1)?,
        })
    }
}

impl<'a> Payload<'a> for Cmdline<'a> {
    const KINDS: &'static [TagKind] = &[TagKind::Cmdline];

    fn decode(bytes: &'a [u8]) -> Option<Self> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(Cmdline(&bytes[..end]))
    }
}
