//! Process-wide convenience API.
//!
//! Free functions that forward to a global [`Hal`]. The context is created by
//! host detection on first use, or installed explicitly with [`install`]
//! (for a config file or a test fixture). Code that wants several contexts,
//! or no global state, should use [`Hal`] directly.

use crate::context::Hal;
use crate::gpio::{AnalogPin, DigitalPin, Direction, Level, PwmPin};
use crate::i2c::I2cBus;
use crate::led::Led;
use crate::spi::{SpiBus, SpiMode};
use embd_common::Result;
use embd_common::host::Host;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

static HAL: Mutex<Option<Arc<Hal>>> = parking_lot::const_mutex(None);

/// Use `hal` for every subsequent call, replacing any current context.
///
/// The previous context is returned unclosed.
pub fn install(hal: Hal) -> Option<Arc<Hal>> {
    HAL.lock().replace(Arc::new(hal))
}

/// The global context, detecting the host on first use.
pub fn hal() -> Result<Arc<Hal>> {
    let mut slot = HAL.lock();
    if let Some(hal) = slot.as_ref() {
        return Ok(Arc::clone(hal));
    }
    let hal = Arc::new(Hal::detect()?);
    *slot = Some(Arc::clone(&hal));
    Ok(hal)
}

/// Detected (or installed) host and revision.
pub fn detect_host() -> Result<(Host, u32)> {
    let hal = hal()?;
    Ok((hal.host(), hal.revision()))
}

/// Close every driver and drop the global context.
pub fn close() -> Result<()> {
    let hal = HAL.lock().take();
    hal.map_or(Ok(()), |hal| hal.close())
}

// ─── GPIO ───────────────────────────────────────────────────────────

/// Create the GPIO driver.
pub fn init_gpio() -> Result<()> {
    hal()?.init_gpio()
}

/// Close the GPIO driver and its pins.
pub fn close_gpio() -> Result<()> {
    hal()?.close_gpio()
}

/// Digital pin for `key`.
pub fn new_digital_pin<K: fmt::Display>(key: K) -> Result<Arc<dyn DigitalPin>> {
    hal()?.new_digital_pin(key)
}

/// Analog pin for `key`.
pub fn new_analog_pin<K: fmt::Display>(key: K) -> Result<Arc<dyn AnalogPin>> {
    hal()?.new_analog_pin(key)
}

/// PWM pin for `key`.
pub fn new_pwm_pin<K: fmt::Display>(key: K) -> Result<Arc<dyn PwmPin>> {
    hal()?.new_pwm_pin(key)
}

/// Set the direction of pin `key`.
pub fn set_direction<K: fmt::Display>(key: K, direction: Direction) -> Result<()> {
    hal()?.set_direction(key, direction)
}

/// Drive pin `key`.
pub fn digital_write<K: fmt::Display>(key: K, level: Level) -> Result<()> {
    hal()?.digital_write(key, level)
}

/// Sample pin `key`.
pub fn digital_read<K: fmt::Display>(key: K) -> Result<Level> {
    hal()?.digital_read(key)
}

/// Set the active-low flag of pin `key`.
pub fn active_low<K: fmt::Display>(key: K, enabled: bool) -> Result<()> {
    hal()?.active_low(key, enabled)
}

/// Enable the pull-up of pin `key`.
pub fn pull_up<K: fmt::Display>(key: K) -> Result<()> {
    hal()?.pull_up(key)
}

/// Enable the pull-down of pin `key`.
pub fn pull_down<K: fmt::Display>(key: K) -> Result<()> {
    hal()?.pull_down(key)
}

/// Sample analog pin `key`.
pub fn analog_read<K: fmt::Display>(key: K) -> Result<i32> {
    hal()?.analog_read(key)
}

// ─── I²C / SPI ──────────────────────────────────────────────────────

/// Create the I²C driver.
pub fn init_i2c() -> Result<()> {
    hal()?.init_i2c()
}

/// Close the I²C driver and its buses.
pub fn close_i2c() -> Result<()> {
    hal()?.close_i2c()
}

/// I²C bus `n`.
pub fn new_i2c_bus(n: u8) -> Result<Arc<dyn I2cBus>> {
    hal()?.new_i2c_bus(n)
}

/// Create the SPI driver.
pub fn init_spi() -> Result<()> {
    hal()?.init_spi()
}

/// Close the SPI driver and its buses.
pub fn close_spi() -> Result<()> {
    hal()?.close_spi()
}

/// SPI bus on `channel`.
pub fn new_spi_bus(
    mode: SpiMode,
    channel: u8,
    speed_hz: u32,
    bits_per_word: u8,
    delay_us: u16,
) -> Result<Arc<dyn SpiBus>> {
    hal()?.new_spi_bus(mode, channel, speed_hz, bits_per_word, delay_us)
}

// ─── LED ────────────────────────────────────────────────────────────

/// Create the LED driver.
pub fn init_led() -> Result<()> {
    hal()?.init_led()
}

/// Close the LED driver and its LEDs.
pub fn close_led() -> Result<()> {
    hal()?.close_led()
}

/// LED for `key`.
pub fn new_led<K: fmt::Display>(key: K) -> Result<Arc<dyn Led>> {
    hal()?.new_led(key)
}

/// Turn LED `key` on.
pub fn led_on<K: fmt::Display>(key: K) -> Result<()> {
    hal()?.led_on(key)
}

/// Turn LED `key` off.
pub fn led_off<K: fmt::Display>(key: K) -> Result<()> {
    hal()?.led_off(key)
}

/// Toggle LED `key`.
pub fn led_toggle<K: fmt::Display>(key: K) -> Result<()> {
    hal()?.led_toggle(key)
}
