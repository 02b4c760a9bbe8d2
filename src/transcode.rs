//! The filtered copy of the hand-off list.
//!
//! The vendor kernel boots with ATAGs and expects most of what the primary bootloader passed, but
//! we regenerate the list header and the ramdisk location ourselves. Everything else is copied
//! as-is, in order.

use alloc::vec::Vec;

use crate::{
    atag::{SerialNr, TagKind, TagList},
    env::Environment,
    scan::{self, SerialNumber},
    Error,
};

/// Returns `true` for the records that are not carried over to the next stage.
pub fn is_dropped(kind: TagKind) -> bool {
    matches!(
        kind,
        TagKind::None | TagKind::Core | TagKind::Initrd | TagKind::Initrd2
    )
}

/// The records kept from the hand-off list, back to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredTags {
    bytes: Vec<u8>,
}

impl FilteredTags {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`, an empty copy is never created.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The copy as a list. It has no `ATAG_CORE`, so it is not a valid list on its own.
    pub fn tags(&self) -> TagList<'_> {
        TagList::new(&self.bytes)
    }
}

/// Number of bytes needed for the records that are kept.
///
/// `on_serial` is called for every serial number record on the way.
pub fn sizing(list: TagList<'_>, mut on_serial: impl FnMut(SerialNumber)) -> usize {
    let mut size = 0;
    for record in list.records() {
        if is_dropped(record.kind()) {
            continue;
        }
        if let Some(serial) = record.payload::<SerialNr>() {
            on_serial(serial.into());
        }
        size += record.len();
    }
    size
}

/// Copy the kept records into a buffer of exactly `size` bytes.
fn copy(list: TagList<'_>, size: usize) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(size)
        .map_err(|_| Error::AllocationFailure { size })?;

    for record in list.records().filter(|r| !is_dropped(r.kind())) {
        bytes.extend_from_slice(record.as_bytes());
    }
    debug_assert_eq!(bytes.len(), size);
    Ok(bytes)
}

/// Validate `list` and copy the records the next stage still needs.
///
/// The serial number is stored in `env` along the way, see [`scan::set_serial`]. Returns
/// `Ok(None)` when nothing is left to copy.
pub fn transcode<E: Environment + ?Sized>(
    list: TagList<'_>,
    env: &mut E,
) -> Result<Option<FilteredTags>, Error> {
    let list = scan::validate(list)?;

    let size = sizing(list, |serial| {
        scan::set_serial(serial, env);
    });
    if size == 0 {
        log::debug!("No atags to copy");
        return Ok(None);
    }

    let bytes = copy(list, size)?;
    log::debug!("Copied {} bytes of atags", bytes.len());
    Ok(Some(FilteredTags { bytes }))
}
