//! Board constants.

/// Maximum number of DRAM banks reported to the memory setup.
pub const NR_DRAM_BANKS: usize = 4;

/// How far past the hand-off address the ATAG list may extend.
pub const ATAGS_LIMIT: usize = 16 * 1024;

/// `bootcmd` used when volume-up is held.
pub const RECOVERY_BOOTCMD: &str = "run recoverybootcmd";

/// `preboot` used when volume-down is held. It clears itself so fastboot is only entered once.
pub const FASTBOOT_PREBOOT: &str = "setenv preboot; run fastbootcmd";

/// Where a key is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyLine {
    /// Global GPIO number.
    pub gpio: u16,
    /// The key pulls the line low when pressed.
    pub active_low: bool,
}

impl KeyLine {
    pub const fn active_high(gpio: u16) -> Self {
        Self {
            gpio,
            active_low: false,
        }
    }

    pub const fn active_low(gpio: u16) -> Self {
        Self {
            gpio,
            active_low: true,
        }
    }
}

/// The volume keys, as described by the `gpio-keys` node of the device tree.
///
/// The wiring differs between phones of this family, so there is no built-in default: a missing
/// key just skips the corresponding boot mode check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyConfig {
    pub volume_up: Option<KeyLine>,
    pub volume_down: Option<KeyLine>,
}

/// Everything the board code can be tuned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub atags_limit: usize,
    pub recovery_bootcmd: &'static str,
    pub fastboot_preboot: &'static str,
    pub keys: KeyConfig,
}

impl BoardConfig {
    pub const fn new() -> Self {
        Self {
            atags_limit: ATAGS_LIMIT,
            recovery_bootcmd: RECOVERY_BOOTCMD,
            fastboot_preboot: FASTBOOT_PREBOOT,
            keys: KeyConfig {
                volume_up: None,
                volume_down: None,
            },
        }
    }

    pub const fn with_keys(self, keys: KeyConfig) -> Self {
        Self { keys, ..self }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new()
    }
}
