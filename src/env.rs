//! The bootloader environment, as far as this board needs it.

use alloc::{collections::BTreeMap, string::String};

/// Board serial number, 16 hex digits.
pub const SERIAL: &str = "serial#";
/// Command run when autoboot is not interrupted.
pub const BOOTCMD: &str = "bootcmd";
/// Command run once before autoboot starts.
pub const PREBOOT: &str = "preboot";

/// A string key/value store.
///
/// On the device this is backed by the bootloader's environment. Setting a variable to the empty
/// string removes it.
pub trait Environment {
    fn get(&self, name: &str) -> Option<&str>;

    fn set(&mut self, name: &str, value: &str);

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// An in-memory [`Environment`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMap {
    vars: BTreeMap<String, String>,
}

impl EnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Environment for EnvMap {
    fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    fn set(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            self.vars.remove(name);
        } else {
            self.vars.insert(name.into(), value.into());
        }
    }
}

impl<E: Environment + ?Sized> Environment for &mut E {
    fn get(&self, name: &str) -> Option<&str> {
        (**self).get(name)
    }

    fn set(&mut self, name: &str, value: &str) {
        (**self).set(name, value)
    }
}
