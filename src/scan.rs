//! Read-only queries over the list handed over by the primary bootloader.

use alloc::string::String;
use core::fmt;

use crate::{
    atag::{Mem, SerialNr, TagKind, TagList},
    env::{self, Environment},
    Error,
};

/// One bank of physical memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBank {
    pub start: u32,
    pub size: u32,
}

impl MemoryBank {
    /// First address past the bank.
    pub fn end(&self) -> u64 {
        self.start as u64 + self.size as u64
    }
}

impl From<Mem> for MemoryBank {
    fn from(mem: Mem) -> Self {
        Self {
            start: mem.start,
            size: mem.size,
        }
    }
}

/// The board serial number from `ATAG_SERIAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerialNumber(pub u64);

impl SerialNumber {
    /// The value stored in `serial#`: high word then low word, 8 lowercase hex digits each.
    pub fn to_env_string(&self) -> String {
        hex::encode(self.0.to_be_bytes())
    }
}

impl From<SerialNr> for SerialNumber {
    fn from(serial: SerialNr) -> Self {
        Self(serial.value())
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Check that `list` starts with `ATAG_CORE`.
///
/// Anything else means the primary bootloader did not pass ATAGs, or we were handed a stale
/// pointer, and the list must not be walked.
pub fn validate(list: TagList<'_>) -> Result<TagList<'_>, Error> {
    match list.first_tag() {
        Some(TagKind::ATAG_CORE) => Ok(list),
        tag => {
            let tag = tag.unwrap_or(TagKind::ATAG_NONE);
            log::error!("Invalid atags: tag {:#x} at {:#x}", tag, list.addr());
            Err(Error::MalformedList {
                tag,
                addr: list.addr(),
            })
        }
    }
}

fn mem_records<'a>(list: TagList<'a>) -> impl Iterator<Item = MemoryBank> + 'a {
    list.records()
        .filter_map(|record| record.payload::<Mem>())
        .map(MemoryBank::from)
}

/// Sum of the sizes of all memory banks.
pub fn total_memory(list: TagList<'_>) -> Result<u64, Error> {
    let list = validate(list)?;
    Ok(mem_records(list)
        .inspect(|bank| {
            log::debug!(
                "Memory: {:#x}-{:#x} (size {:#x})",
                bank.start,
                bank.end(),
                bank.size
            )
        })
        .map(|bank| bank.size as u64)
        .sum())
}

/// The first `N` memory banks, in list order. Further banks are ignored.
pub fn memory_banks<const N: usize>(
    list: TagList<'_>,
) -> Result<heapless::Vec<MemoryBank, N>, Error> {
    let list = validate(list)?;
    Ok(mem_records(list).take(N).collect())
}

/// The first serial number record of the list.
pub fn find_serial(list: TagList<'_>) -> Option<SerialNumber> {
    list.records()
        .find_map(|record| record.payload::<SerialNr>())
        .map(SerialNumber::from)
}

/// Store `serial` in `serial#`, unless it is already set.
///
/// Returns `true` if the variable was written.
pub fn set_serial<E: Environment + ?Sized>(serial: SerialNumber, env: &mut E) -> bool {
    if env.contains(env::SERIAL) {
        return false;
    }
    env.set(env::SERIAL, &serial.to_env_string());
    true
}

/// Find the serial number in `list` and store it in `serial#`, unless `serial#` is already set.
///
/// Returns the serial number that was stored.
pub fn extract_serial<E: Environment + ?Sized>(
    list: TagList<'_>,
    env: &mut E,
) -> Option<SerialNumber> {
    if env.contains(env::SERIAL) {
        return None;
    }
    let serial = find_serial(list)?;
    set_serial(serial, env).then_some(serial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        atag::tests::{build, END},
        env::EnvMap,
    };

    fn mem(start: u32, size: u32) -> (u32, &'static [u32]) {
        let words: &'static [u32] =
            alloc::boxed::Box::leak(alloc::vec![size, start].into_boxed_slice());
        (TagKind::ATAG_MEM, words)
    }

    #[test]
    fn total_memory_sums_every_bank() {
        let bytes = build(&[
            (TagKind::ATAG_CORE, &[0, 4096, 0]),
            mem(0x0000_0000, 0x1000_0000),
            (TagKind::ATAG_CMDLINE, &[0]),
            mem(0x2000_0000, 0x0800_0000),
            (TagKind::ATAG_SERIAL, &[2, 1]),
            mem(0x4000_0000, 0x0400_0000),
            END,
        ]);
        assert_eq!(total_memory(TagList::new(&bytes)), Ok(0x1c00_0000));
    }

    #[test]
    fn total_memory_does_not_overflow_32_bits() {
        let bytes = build(&[
            (TagKind::ATAG_CORE, &[]),
            mem(0x0000_0000, 0x8000_0000),
            mem(0x8000_0000, 0x8000_0000),
            END,
        ]);
        assert_eq!(total_memory(TagList::new(&bytes)), Ok(0x1_0000_0000));
    }

    #[test]
    fn malformed_list_is_rejected() {
        let bytes = build(&[mem(0x8000_0000, 0x2000_0000), END]);
        let list = TagList::new(&bytes);

        assert_eq!(
            validate(list).err(),
            Some(Error::MalformedList {
                tag: TagKind::ATAG_MEM,
                addr: list.addr()
            })
        );
        assert!(total_memory(list).is_err());
        assert!(memory_banks::<4>(list).is_err());
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(
            validate(TagList::new(&[])),
            Err(Error::MalformedList { tag: 0, .. })
        ));
    }

    #[test]
    fn banks_keep_list_order_and_truncate() {
        let bytes = build(&[
            (TagKind::ATAG_CORE, &[]),
            mem(0x4000_0000, 0x100),
            mem(0x0000_0000, 0x200),
            (TagKind::ATAG_SERIAL, &[0, 0]),
            mem(0x8000_0000, 0x300),
            END,
        ]);
        let list = TagList::new(&bytes);

        let banks = memory_banks::<2>(list).unwrap();
        assert_eq!(
            &banks[..],
            &[
                MemoryBank {
                    start: 0x4000_0000,
                    size: 0x100
                },
                MemoryBank {
                    start: 0x0000_0000,
                    size: 0x200
                },
            ]
        );
        assert_eq!(memory_banks::<8>(list).unwrap().len(), 3);
    }

    #[test]
    fn serial_is_high_word_first() {
        let bytes = build(&[(TagKind::ATAG_CORE, &[]), (TagKind::ATAG_SERIAL, &[0x2, 0x1]), END]);
        let mut env = EnvMap::new();

        let serial = extract_serial(TagList::new(&bytes), &mut env);
        assert_eq!(serial, Some(SerialNumber(0x0000_0001_0000_0002)));
        assert_eq!(env.get(env::SERIAL), Some("0000000100000002"));
        assert_eq!(serial.unwrap().to_string(), "0000000100000002");
    }

    #[test]
    fn existing_serial_is_kept() {
        let bytes = build(&[
            (TagKind::ATAG_CORE, &[]),
            (TagKind::ATAG_SERIAL, &[0xdead_beef, 0xcafe]),
            END,
        ]);
        let mut env = EnvMap::new();
        env.set(env::SERIAL, "from-env");

        assert_eq!(extract_serial(TagList::new(&bytes), &mut env), None);
        assert_eq!(extract_serial(TagList::new(&bytes), &mut env), None);
        assert_eq!(env.get(env::SERIAL), Some("from-env"));
    }

    #[test]
    fn repeated_extraction_writes_once() {
        let bytes = build(&[
            (TagKind::ATAG_CORE, &[]),
            (TagKind::ATAG_SERIAL, &[0xdead_beef, 0xcafe]),
            END,
        ]);
        let mut env = EnvMap::new();

        assert!(extract_serial(TagList::new(&bytes), &mut env).is_some());
        assert_eq!(extract_serial(TagList::new(&bytes), &mut env), None);
        assert_eq!(env.get(env::SERIAL), Some("0000cafedeadbeef"));
    }
}
