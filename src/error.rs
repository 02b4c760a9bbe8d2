use crate::{board::Phase, keys::Key};

/// Everything that can go wrong while handling the ATAG hand-off.
///
/// None of these stop the boot. The board code logs them and carries on without the feature that
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The first record of the list is not `ATAG_CORE`.
    #[error("invalid atags: tag {tag:#x} at {addr:#x}")]
    MalformedList { tag: u32, addr: usize },
    /// The buffer for the filtered copy could not be allocated.
    #[error("failed to allocate {size} bytes for the atag copy")]
    AllocationFailure { size: usize },
    /// The board configuration does not describe this key.
    #[error("no {0} key configured")]
    MissingConfig(Key),
    /// The key is configured but its GPIO line could not be claimed.
    #[error("failed to request {0} GPIO")]
    GpioRequest(Key),
    /// The output buffer cannot hold the records.
    #[error("output buffer too small for {needed} bytes")]
    OutputFull { needed: usize },
    /// An operation was called before the boot sequence reached it, or after it moved past it.
    #[error("{operation} called in phase {phase:?}")]
    OutOfOrder {
        phase: Phase,
        operation: &'static str,
    },
}
