//! BeagleBone Black.
//!
//! Digital I/O uses sysfs GPIO; analog inputs and PWM outputs are provided
//! by device-tree overlays loaded through the cape manager.

pub mod analog;
pub mod capemgr;
pub mod pins;
pub mod pwm;

pub use analog::BbbAnalogPin;
pub use capemgr::CapeManager;
pub use pins::{LEDS, PINS};
pub use pwm::BbbPwmPin;

use crate::descriptor::Descriptor;
use crate::gpio::GpioDriver;
use crate::gpio::sysfs::SysfsDigitalPin;
use crate::i2c::{I2cDriver, LinuxI2cBus};
use crate::led::{LedDriver, SysfsLed};
use crate::spi::{LinuxSpiBus, SpiDriver, SpiInitializer};
use embd_common::config::HalConfig;

/// spidev minor of the SPI0 controller once `BB-SPIDEV0` is loaded.
pub const SPI_MINOR: u8 = 1;

/// Overlay that exposes SPI0 as `/dev/spidev1.*`.
pub const SPI_OVERLAY: &str = "BB-SPIDEV0";

/// BeagleBone Black descriptor. The revision is ignored.
pub fn describe(_revision: u32) -> Descriptor {
    Descriptor {
        gpio: Some(Box::new(|config: &HalConfig| {
            GpioDriver::new(
                PINS,
                Some(SysfsDigitalPin::factory(&config.paths)),
                Some(BbbAnalogPin::factory(&config.paths)),
                Some(BbbPwmPin::factory(&config.paths, &config.pwm)),
            )
        })),
        i2c: Some(Box::new(|config: &HalConfig| {
            I2cDriver::new(LinuxI2cBus::factory(&config.paths, config.i2c.write_delay()))
        })),
        led: Some(Box::new(|config: &HalConfig| {
            LedDriver::new(LEDS, SysfsLed::factory(&config.paths))
        })),
        spi: Some(Box::new(|config: &HalConfig| {
            let capemgr = CapeManager::new(&config.paths);
            let initializer = SpiInitializer::new(move || capemgr.ensure_enabled(SPI_OVERLAY));
            SpiDriver::new(
                config.spi.clone(),
                LinuxSpiBus::factory(&config.paths, SPI_MINOR, Some(initializer)),
            )
        })),
    }
}
