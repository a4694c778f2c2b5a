//! Host descriptors: which drivers a board provides and how to build them.

use crate::gpio::GpioDriver;
use crate::i2c::I2cDriver;
use crate::led::LedDriver;
use crate::spi::SpiDriver;
use embd_common::config::HalConfig;

/// Builds the GPIO driver.
pub type GpioDriverFactory = Box<dyn Fn(&HalConfig) -> GpioDriver + Send + Sync>;

/// Builds the I²C driver.
pub type I2cDriverFactory = Box<dyn Fn(&HalConfig) -> I2cDriver + Send + Sync>;

/// Builds the LED driver.
pub type LedDriverFactory = Box<dyn Fn(&HalConfig) -> LedDriver + Send + Sync>;

/// Builds the SPI driver.
pub type SpiDriverFactory = Box<dyn Fn(&HalConfig) -> SpiDriver + Send + Sync>;

/// Per-board driver factories. A `None` slot means the board lacks that
/// subsystem.
#[derive(Default)]
pub struct Descriptor {
    /// GPIO (digital, analog, PWM).
    pub gpio: Option<GpioDriverFactory>,
    /// I²C.
    pub i2c: Option<I2cDriverFactory>,
    /// On-board LEDs.
    pub led: Option<LedDriverFactory>,
    /// SPI.
    pub spi: Option<SpiDriverFactory>,
}

impl Descriptor {
    /// Names of the subsystems this descriptor provides.
    pub fn features(&self) -> Vec<&'static str> {
        [
            ("gpio", self.gpio.is_some()),
            ("i2c", self.i2c.is_some()),
            ("led", self.led.is_some()),
            ("spi", self.spi.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

impl std::fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("features", &self.features())
            .finish()
    }
}

/// Produces the descriptor for a board revision.
pub type Describer = fn(u32) -> Descriptor;
