//! On-board LED map.
//!
//! Keys are the sysfs LED names under `/sys/class/leds`; lookup mirrors
//! [`PinMap::lookup`](crate::pin::PinMap::lookup) without the capability filter.

use std::fmt;

/// One LED entry: sysfs name plus aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedDescriptor {
    /// sysfs name, e.g. `beaglebone:green:usr3`.
    pub id: &'static str,
    /// Secondary names (`"3"`, `"USR3"`, ...).
    pub aliases: &'static [&'static str],
}

/// LED table of one board.
#[derive(Debug, Clone, Copy)]
pub struct LedMap {
    leds: &'static [LedDescriptor],
}

impl LedMap {
    /// Wrap a static LED table.
    pub const fn new(leds: &'static [LedDescriptor]) -> Self {
        Self { leds }
    }

    /// Resolve `key` to the canonical sysfs LED name.
    pub fn lookup<K: fmt::Display>(&self, key: K) -> Option<&'static str> {
        let key = key.to_string();
        self.leds
            .iter()
            .find(|led| led.id == key || led.aliases.iter().any(|alias| *alias == key))
            .map(|led| led.id)
    }

    /// Iterate in table order.
    pub fn iter(&self) -> std::slice::Iter<'static, LedDescriptor> {
        self.leds.iter()
    }
}
