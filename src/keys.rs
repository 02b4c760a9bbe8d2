//! Boot mode selection from the volume keys.
//!
//! Holding volume-up while powering on boots into recovery, holding volume-down enters fastboot
//! once. Both can be held at the same time; the two checks do not know about each other.

use core::fmt;

use bitflags::bitflags;

use crate::{
    config::{BoardConfig, KeyConfig},
    env::{self, Environment},
    gpio,
    hal::{
        self,
        digital::{Error as _, InputPin},
    },
    Error,
};

/// The keys looked at during boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    VolumeUp,
    VolumeDown,
}

impl Key {
    /// Node name below the `gpio-keys` device tree node.
    pub const fn name(self) -> &'static str {
        match self {
            Key::VolumeUp => "volume-up",
            Key::VolumeDown => "volume-down",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Boot modes selected by the keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BootMode: u8 {
        /// `bootcmd` was switched to the recovery command.
        const RECOVERY = 1;
        /// `preboot` was armed to enter fastboot once.
        const FASTBOOT = 1 << 1;
    }
}

/// Hands out the input lines the keys are wired to.
pub trait KeyProvider {
    type Pin: InputPin;

    /// Get the line for `key`.
    ///
    /// [`Error::MissingConfig`] means the board does not have the key, any other error that it
    /// could not be requested. Either way the check for that key is skipped.
    fn request(&mut self, key: Key) -> Result<Self::Pin, Error>;
}

/// An input line read as logical levels: an active-low line reads high while the key is pressed.
#[derive(Debug)]
pub struct ActiveLevel<P> {
    pin: P,
    active_low: bool,
}

impl<P> ActiveLevel<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> hal::digital::ErrorType for ActiveLevel<P> {
    type Error = P::Error;
}

impl<P: InputPin> InputPin for ActiveLevel<P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_high()? != self.active_low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high()?)
    }
}

/// The keys of the board, read through the SoC GPIO controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoardKeys {
    config: KeyConfig,
}

impl BoardKeys {
    pub fn new(config: KeyConfig) -> Self {
        Self { config }
    }
}

impl KeyProvider for BoardKeys {
    type Pin = ActiveLevel<gpio::Pin>;

    fn request(&mut self, key: Key) -> Result<Self::Pin, Error> {
        let line = match key {
            Key::VolumeUp => self.config.volume_up,
            Key::VolumeDown => self.config.volume_down,
        }
        .ok_or(Error::MissingConfig(key))?;

        let pin = gpio::Pin::get(line.gpio).ok_or(Error::GpioRequest(key))?;
        Ok(ActiveLevel::new(pin, line.active_low))
    }
}

/// Returns `true` if `key` is configured, could be read, and is pressed.
fn pressed<K: KeyProvider + ?Sized>(keys: &mut K, key: Key) -> bool {
    let mut pin = match keys.request(key) {
        Ok(pin) => pin,
        Err(Error::MissingConfig(_)) => {
            log::debug!("No {} key", key);
            return false;
        }
        Err(err) => {
            log::error!("Failed to request {} GPIO: {}", key, err);
            return false;
        }
    };

    match pin.is_high() {
        Ok(level) => level,
        Err(err) => {
            log::error!("Failed to read {} GPIO: {:?}", key, err.kind());
            false
        }
    }
}

/// Check the volume keys and update `bootcmd`/`preboot` accordingly.
pub fn check_keys<K, E>(keys: &mut K, env: &mut E, config: &BoardConfig) -> BootMode
where
    K: KeyProvider + ?Sized,
    E: Environment + ?Sized,
{
    let mut mode = BootMode::empty();

    // Boot into recovery?
    if pressed(keys, Key::VolumeUp) {
        log::info!("Volume up held, booting recovery");
        env.set(env::BOOTCMD, config.recovery_bootcmd);
        mode |= BootMode::RECOVERY;
    }

    // Boot into fastboot?
    if pressed(keys, Key::VolumeDown) {
        log::info!("Volume down held, entering fastboot");
        env.set(env::PREBOOT, config.fastboot_preboot);
        mode |= BootMode::FASTBOOT;
    }

    mode
}
