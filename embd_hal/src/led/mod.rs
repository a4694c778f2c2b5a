//! On-board LEDs and the generic LED driver.

pub mod sysfs;

use crate::cache::{Cache, DriverLink};
use embd_common::led::LedMap;
use embd_common::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

pub use sysfs::SysfsLed;

/// A controllable LED.
pub trait Led: Send + Sync {
    /// sysfs name.
    fn id(&self) -> &str;

    /// Turn on.
    fn on(&self) -> Result<()>;

    /// Turn off.
    fn off(&self) -> Result<()>;

    /// Flip the current state.
    fn toggle(&self) -> Result<()>;

    /// True if brightness is non-zero.
    fn is_on(&self) -> Result<bool>;

    /// Release the LED. Idempotent.
    fn close(&self) -> Result<()>;
}

/// Handle an LED keeps to remove itself from its driver.
pub type LedLink = DriverLink<&'static str>;

/// Builds an LED for a resolved sysfs name.
pub type LedFactory = Box<dyn Fn(&'static str, LedLink) -> Result<Arc<dyn Led>> + Send + Sync>;

/// Generic LED driver: LED map plus a cache of open LEDs.
pub struct LedDriver {
    led_map: LedMap,
    factory: LedFactory,
    leds: Cache<&'static str, Arc<dyn Led>>,
}

impl LedDriver {
    /// Create a driver over `led_map`.
    pub fn new(led_map: LedMap, factory: LedFactory) -> Self {
        Self {
            led_map,
            factory,
            leds: Cache::new(),
        }
    }

    /// The board's LED map.
    pub fn led_map(&self) -> &LedMap {
        &self.led_map
    }

    /// LED for `key` (id, alias or integer), opened on first use.
    pub fn led<K: fmt::Display>(&self, key: K) -> Result<Arc<dyn Led>> {
        let id = self
            .led_map
            .lookup(&key)
            .ok_or_else(|| Error::led_not_found(&key))?;
        self.leds.acquire(
            id,
            |led| Ok(Arc::clone(led)),
            |link| {
                let led = (self.factory)(id, link)?;
                Ok((Arc::clone(&led), led))
            },
        )
    }

    /// Forget the cached LED `id` without closing it.
    pub fn unregister(&self, id: &str) {
        if let Some(led) = self.led_map.iter().find(|led| led.id == id) {
            self.leds.remove(&led.id);
        }
    }

    /// Close every open LED; the first failure is returned.
    pub fn close(&self) -> Result<()> {
        let mut first = None;
        for led in self.leds.drain() {
            if let Err(e) = led.close() {
                warn!(led = led.id(), error = %e, "led close failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}
