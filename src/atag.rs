//! The ATAG list layout.
//!
//! An ATAG list is a sequence of records laid out back to back. Each record starts with a two-word
//! header, `size` then `tag`, where `size` counts 32-bit words and includes the header itself. The
//! next record starts `size * 4` bytes after the current one; nothing else delimits records.
//!
//! Words are stored in the byte order of the CPU that produced them, so everything here reads and
//! writes native-endian words.

use core::iter::FusedIterator;

pub mod payload;
pub mod writer;

pub use payload::{Cmdline, Core, Initrd, Mem, Payload, SerialNr};
pub use writer::TagWriter;

/// Size of a record header in bytes.
pub const HEADER_SIZE: usize = 8;
/// Size of a record header in words.
pub const HEADER_WORDS: u32 = 2;

/// The record types defined by the ARM Linux boot protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    None,
    Core,
    Mem,
    VideoText,
    Ramdisk,
    Initrd,
    Initrd2,
    SerialNr,
    Revision,
    VideoLfb,
    Cmdline,
    /// Any tag this crate does not know. These are carried along untouched.
    Unknown(u32),
}

impl TagKind {
    pub const ATAG_NONE: u32 = 0x0000_0000;
    pub const ATAG_CORE: u32 = 0x5441_0001;
    pub const ATAG_MEM: u32 = 0x5441_0002;
    pub const ATAG_VIDEOTEXT: u32 = 0x5441_0003;
    pub const ATAG_RAMDISK: u32 = 0x5441_0004;
    /// Deprecated, uses virtual addresses.
    pub const ATAG_INITRD: u32 = 0x5441_0005;
    pub const ATAG_INITRD2: u32 = 0x5442_0005;
    pub const ATAG_SERIAL: u32 = 0x5441_0006;
    pub const ATAG_REVISION: u32 = 0x5441_0007;
    pub const ATAG_VIDEOLFB: u32 = 0x5441_0008;
    pub const ATAG_CMDLINE: u32 = 0x5441_0009;

    /// The raw tag value as it appears in the header.
    pub const fn raw(self) -> u32 {
        match self {
            TagKind::None => Self::ATAG_NONE,
            TagKind::Core => Self::ATAG_CORE,
            TagKind::Mem => Self::ATAG_MEM,
            TagKind::VideoText => Self::ATAG_VIDEOTEXT,
            TagKind::Ramdisk => Self::ATAG_RAMDISK,
            TagKind::Initrd => Self::ATAG_INITRD,
            TagKind::Initrd2 => Self::ATAG_INITRD2,
            TagKind::SerialNr => Self::ATAG_SERIAL,
            TagKind::Revision => Self::ATAG_REVISION,
            TagKind::VideoLfb => Self::ATAG_VIDEOLFB,
            TagKind::Cmdline => Self::ATAG_CMDLINE,
            TagKind::Unknown(raw) => raw,
        }
    }
}

impl From<u32> for TagKind {
    fn from(raw: u32) -> Self {
        match raw {
            Self::ATAG_NONE => TagKind::None,
            Self::ATAG_CORE => TagKind::Core,
            Self::ATAG_MEM => TagKind::Mem,
            Self::ATAG_VIDEOTEXT => TagKind::VideoText,
            Self::ATAG_RAMDISK => TagKind::Ramdisk,
            Self::ATAG_INITRD => TagKind::Initrd,
            Self::ATAG_INITRD2 => TagKind::Initrd2,
            Self::ATAG_SERIAL => TagKind::SerialNr,
            Self::ATAG_REVISION => TagKind::Revision,
            Self::ATAG_VIDEOLFB => TagKind::VideoLfb,
            Self::ATAG_CMDLINE => TagKind::Cmdline,
            other => TagKind::Unknown(other),
        }
    }
}

/// Read the native-endian word at word index `index` of `bytes`.
pub(crate) fn word(bytes: &[u8], index: usize) -> Option<u32> {
    let start = index.checked_mul(4)?;
    let chunk = bytes.get(start..start.checked_add(4)?)?;
    Some(u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

/// A borrowed view of an ATAG list.
#[derive(Debug, Clone, Copy)]
pub struct TagList<'a> {
    bytes: &'a [u8],
    base: usize,
}

impl<'a> TagList<'a> {
    /// View `bytes` as an ATAG list. Traversal never goes past the end of the slice.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            base: bytes.as_ptr() as usize,
        }
    }

    /// View the ATAG list the previous boot stage left at `addr`.
    ///
    /// A null `addr` gives an empty list, which fails validation.
    ///
    /// # Safety
    ///
    /// This is the trust boundary with the primary bootloader. Nothing here checks that `addr`
    /// actually holds an ATAG list: the caller must guarantee that the `limit` bytes starting at
    /// `addr` are mapped, readable, and not written to for as long as the list is in use. The list
    /// itself is only bounded by its own terminator and by `limit`.
    pub unsafe fn from_raw(addr: usize, limit: usize) -> TagList<'static> {
        if addr == 0 {
            return TagList { bytes: &[], base: 0 };
        }
        // Safety: The caller guarantees that `limit` bytes at `addr` are readable and stay
        // unchanged for the lifetime of the program.
        let bytes = unsafe { core::slice::from_raw_parts(addr as *const u8, limit) };
        TagList { bytes, base: addr }
    }

    /// Address of the first record.
    pub fn addr(&self) -> usize {
        self.base
    }

    /// The raw tag of the first record, if the list holds at least one header.
    pub fn first_tag(&self) -> Option<u32> {
        word(self.bytes, 1)
    }

    /// Iterate over the records of the list, stopping at the terminator.
    pub fn records(&self) -> Records<'a> {
        Records {
            bytes: self.bytes,
            base: self.base,
            offset: 0,
        }
    }
}

impl<'a> IntoIterator for TagList<'a> {
    type Item = Record<'a>;
    type IntoIter = Records<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.records()
    }
}

/// A single record of an ATAG list, header included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    bytes: &'a [u8],
    addr: usize,
}

impl<'a> Record<'a> {
    /// Interpret `bytes` as one record, if the header fits and its size covers the whole record.
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        let size = word(bytes, 0)?;
        if size < HEADER_WORDS {
            return None;
        }
        let len = (size as usize).checked_mul(4)?;
        Some(Self {
            bytes: bytes.get(..len)?,
            addr: bytes.as_ptr() as usize,
        })
    }

    pub fn kind(&self) -> TagKind {
        TagKind::from(self.tag())
    }

    /// The raw tag value.
    pub fn tag(&self) -> u32 {
        // The header is checked when the record is created.
        word(self.bytes, 1).unwrap_or(TagKind::ATAG_NONE)
    }

    /// Size of the record in words, header included.
    pub fn size_words(&self) -> u32 {
        (self.bytes.len() / 4) as u32
    }

    /// Size of the record in bytes, header included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the record is only a header.
    pub fn is_empty(&self) -> bool {
        self.bytes.len() == HEADER_SIZE
    }

    /// The whole record, header included.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The bytes after the header.
    pub fn payload_bytes(&self) -> &'a [u8] {
        &self.bytes[HEADER_SIZE..]
    }

    /// Address the record was read from.
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Decode the payload as `P`. Returns `None` if the record is of another kind or too short.
    pub fn payload<P: Payload<'a>>(&self) -> Option<P> {
        if !P::KINDS.contains(&self.kind()) {
            return None;
        }
        P::decode(self.payload_bytes())
    }
}

/// Iterator over the records of a [`TagList`].
///
/// Stops at an `ATAG_NONE` record, at a header whose size is smaller than the header itself, at a
/// record running past the end of the list, or at the end of the list.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    bytes: &'a [u8],
    base: usize,
    offset: usize,
}

impl<'a> Records<'a> {
    fn finish(&mut self) -> Option<Record<'a>> {
        self.offset = self.bytes.len();
        None
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Record<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(rest) = self.bytes.get(self.offset..) else {
            return self.finish();
        };
        let (Some(size), Some(tag)) = (word(rest, 0), word(rest, 1)) else {
            return self.finish();
        };
        if tag == TagKind::ATAG_NONE {
            return self.finish();
        }
        let Some(record) = Record::parse(rest) else {
            log::warn!(
                "Truncated atag: tag {:#x} size {} at {:#x}",
                tag,
                size,
                self.base + self.offset
            );
            return self.finish();
        };
        let record = Record {
            addr: self.base + self.offset,
            ..record
        };
        self.offset += record.len();
        Some(record)
    }
}

impl FusedIterator for Records<'_> {}
