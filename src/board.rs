//! The board hooks, in the order the bootloader calls them.

use crate::{
    atag::TagList,
    config::BoardConfig,
    eio,
    env::Environment,
    handoff::Handoff,
    keys::{self, BootMode, KeyProvider},
    scan::{self, MemoryBank},
    transcode::{self, FilteredTags},
    Error,
};

/// How far the boot has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Nothing received yet.
    Uninitialized,
    /// The hand-off words are stored.
    RawCaptured,
    /// The filtered copy exists (or is known to be empty) and the keys were checked.
    Transcoded,
    /// The filtered copy was handed to the next stage.
    Emitted,
}

/// What the board reports to the generic board setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardInfo {
    /// Machine type to pass on to an ATAG kernel.
    pub arch_number: u32,
    /// Where the original ATAG list lives.
    pub boot_params: usize,
}

/// State carried from the hand-off to the jump into the next stage.
#[derive(Debug)]
pub struct BootContext<'a> {
    phase: Phase,
    machine_id: u32,
    tags: TagList<'a>,
    filtered: Option<FilteredTags>,
    boot_mode: BootMode,
    config: BoardConfig,
}

impl<'a> BootContext<'a> {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            phase: Phase::Uninitialized,
            machine_id: 0,
            tags: TagList::new(&[]),
            filtered: None,
            boot_mode: BootMode::empty(),
            config,
        }
    }

    /// Build the context from the words saved by the entry stub.
    ///
    /// # Safety
    ///
    /// `handoff.atags` must be null, or the `config.atags_limit` bytes following it must stay
    /// readable and unchanged for the rest of the boot. See [`TagList::from_raw`].
    pub unsafe fn from_handoff(handoff: Handoff, config: BoardConfig) -> BootContext<'static> {
        // Safety: Guaranteed by the caller.
        let tags = unsafe { TagList::from_raw(handoff.atags, config.atags_limit) };
        let mut ctx = BootContext::new(config);
        ctx.phase = Phase::RawCaptured;
        ctx.machine_id = handoff.machine_id;
        ctx.tags = tags;
        ctx
    }

    /// Store the machine type and the ATAG list. Nothing is checked here.
    pub fn on_handoff(&mut self, machine_id: u32, tags: TagList<'a>) -> Result<(), Error> {
        self.expect(&[Phase::Uninitialized], "on_handoff")?;
        self.machine_id = machine_id;
        self.tags = tags;
        self.phase = Phase::RawCaptured;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn machine_id(&self) -> u32 {
        self.machine_id
    }

    /// The list from the primary bootloader.
    pub fn tags(&self) -> TagList<'a> {
        self.tags
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// The filtered copy, once [`misc_init`](Self::misc_init) made one.
    pub fn filtered(&self) -> Option<&FilteredTags> {
        self.filtered.as_ref()
    }

    /// Boot modes selected by [`misc_init`](Self::misc_init).
    pub fn boot_mode(&self) -> BootMode {
        self.boot_mode
    }

    fn expect(&self, phases: &[Phase], operation: &'static str) -> Result<(), Error> {
        if phases.contains(&self.phase) {
            return Ok(());
        }
        log::warn!("{} called in phase {:?}", operation, self.phase);
        Err(Error::OutOfOrder {
            phase: self.phase,
            operation,
        })
    }

    fn captured(&self, operation: &'static str) -> Result<TagList<'a>, Error> {
        self.expect(
            &[Phase::RawCaptured, Phase::Transcoded, Phase::Emitted],
            operation,
        )?;
        Ok(self.tags)
    }

    /// Total RAM size.
    ///
    /// A malformed list yields `Err`, and the caller must then treat the board as having zero
    /// RAM rather than probing memory on its own.
    pub fn dram_init(&self) -> Result<u64, Error> {
        scan::total_memory(self.captured("dram_init")?)
    }

    /// Start and size of each DRAM bank, at most `N` of them.
    pub fn dram_init_banksize<const N: usize>(
        &self,
    ) -> Result<heapless::Vec<MemoryBank, N>, Error> {
        scan::memory_banks(self.captured("dram_init_banksize")?)
    }

    /// Machine type and ATAG address for the generic board code.
    pub fn board_init(&self) -> BoardInfo {
        BoardInfo {
            arch_number: self.machine_id,
            boot_params: self.tags.addr(),
        }
    }

    /// Copy the ATAGs the next stage needs, pick up the serial number and check the keys.
    ///
    /// Failing to copy the list is not an error for the boot: the next stage just does not get the
    /// vendor records. Returns the boot modes the keys selected.
    pub fn misc_init<K, E>(&mut self, keys: &mut K, env: &mut E) -> Result<BootMode, Error>
    where
        K: KeyProvider + ?Sized,
        E: Environment + ?Sized,
    {
        self.expect(&[Phase::RawCaptured], "misc_init")?;

        self.filtered = match transcode::transcode(self.tags, env) {
            Ok(filtered) => filtered,
            Err(err) => {
                log::warn!("Not copying atags: {}", err);
                None
            }
        };
        self.boot_mode = keys::check_keys(keys, env, &self.config);
        self.phase = Phase::Transcoded;
        Ok(self.boot_mode)
    }

    /// Append the filtered copy to the outgoing ATAG list and advance `cursor` past it.
    ///
    /// Does nothing if there is no copy. Returns the number of bytes written. If `cursor` is too
    /// short nothing is written.
    pub fn on_emit(&mut self, cursor: &mut &mut [u8]) -> Result<usize, Error> {
        self.expect(&[Phase::Transcoded, Phase::Emitted], "on_emit")?;

        let Some(filtered) = &self.filtered else {
            self.phase = Phase::Emitted;
            return Ok(0);
        };
        let needed = filtered.len();
        if cursor.len() < needed {
            log::error!(
                "No room for {} bytes of atags, {} left",
                needed,
                cursor.len()
            );
            return Err(Error::OutputFull { needed });
        }
        eio::Write::write_all(cursor, filtered.as_bytes())
            .map_err(|_| Error::OutputFull { needed })?;
        self.phase = Phase::Emitted;
        Ok(needed)
    }
}
