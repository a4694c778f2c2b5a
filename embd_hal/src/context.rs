//! The HAL context: one host descriptor plus its lazily created drivers.
//!
//! Each subsystem has a driver slot. `init_*` fills a slot explicitly and
//! refuses to do so twice; the pin/bus helpers fill it on first use.
//! `close_*` closes the driver and empties the slot, after which it can be
//! initialized again.

use crate::descriptor::Descriptor;
use crate::detect;
use crate::gpio::{AnalogPin, DigitalPin, Direction, GpioDriver, Level, PwmPin};
use crate::host_registry::{self, HostRegistry};
use crate::i2c::{I2cBus, I2cDriver};
use crate::led::{Led, LedDriver};
use crate::spi::{SpiBus, SpiDriver, SpiMode};
use embd_common::config::HalConfig;
use embd_common::host::Host;
use embd_common::{Error, Result};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Slot<D> {
    name: &'static str,
    driver: Mutex<Option<Arc<D>>>,
}

impl<D> Slot<D> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            driver: Mutex::new(None),
        }
    }

    fn init(&self, host: Host, build: Option<impl FnOnce() -> D>) -> Result<Arc<D>> {
        let mut driver = self.driver.lock();
        if driver.is_some() {
            return Err(Error::AlreadyInitialized(self.name));
        }
        Self::fill(&mut driver, self.name, host, build)
    }

    fn get_or_init(&self, host: Host, build: Option<impl FnOnce() -> D>) -> Result<Arc<D>> {
        let mut driver = self.driver.lock();
        match driver.as_ref() {
            Some(existing) => Ok(Arc::clone(existing)),
            None => Self::fill(&mut driver, self.name, host, build),
        }
    }

    fn fill(
        driver: &mut Option<Arc<D>>,
        name: &'static str,
        host: Host,
        build: Option<impl FnOnce() -> D>,
    ) -> Result<Arc<D>> {
        let build = build.ok_or(Error::FeatureNotSupported { feature: name, host })?;
        let created = Arc::new(build());
        *driver = Some(Arc::clone(&created));
        debug!(driver = name, "driver initialized");
        Ok(created)
    }

    fn take(&self) -> Option<Arc<D>> {
        self.driver.lock().take()
    }
}

/// Per-host HAL context.
pub struct Hal {
    host: Host,
    revision: u32,
    config: HalConfig,
    descriptor: Descriptor,
    gpio: Slot<GpioDriver>,
    i2c: Slot<I2cDriver>,
    led: Slot<LedDriver>,
    spi: Slot<SpiDriver>,
}

impl Hal {
    /// Context for an explicit host, revision and descriptor.
    pub fn new(host: Host, revision: u32, descriptor: Descriptor, config: HalConfig) -> Self {
        info!(%host, revision, features = ?descriptor.features(), "hal context created");
        Self {
            host,
            revision,
            config,
            descriptor,
            gpio: Slot::new("gpio"),
            i2c: Slot::new("i2c"),
            led: Slot::new("led"),
            spi: Slot::new("spi"),
        }
    }

    /// Context for the running host using the process-wide registry.
    ///
    /// `config.host` overrides detection: a configured tag skips `uname`, a
    /// configured revision skips cpuinfo.
    pub fn from_config(config: HalConfig) -> Result<Self> {
        config.validate()?;
        let (host, revision) = Self::identify(&config)?;
        let descriptor = host_registry::describe(host, revision)?;
        Ok(Self::new(host, revision, descriptor, config))
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied registry.
    pub fn with_registry(registry: &HostRegistry, config: HalConfig) -> Result<Self> {
        config.validate()?;
        let (host, revision) = Self::identify(&config)?;
        let descriptor = registry.describe(host, revision)?;
        Ok(Self::new(host, revision, descriptor, config))
    }

    /// Detect the host with default configuration.
    pub fn detect() -> Result<Self> {
        Self::from_config(HalConfig::default())
    }

    fn identify(config: &HalConfig) -> Result<(Host, u32)> {
        match (config.host.tag, config.host.revision) {
            (Some(host), Some(revision)) => Ok((host, revision)),
            (Some(host), None) => {
                let cpuinfo = std::fs::read_to_string(&config.paths.cpuinfo).ok();
                Ok((host, detect::resolve_revision(cpuinfo.as_deref())))
            }
            (None, revision) => {
                let info = detect::detect_host(&config.paths)?;
                Ok((info.host, revision.unwrap_or(info.revision)))
            }
        }
    }

    /// Host tag.
    pub fn host(&self) -> Host {
        self.host
    }

    /// Board revision.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Active configuration.
    pub fn config(&self) -> &HalConfig {
        &self.config
    }

    /// The host descriptor.
    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    // ─── Driver lifecycle ───────────────────────────────────────────

    fn gpio_builder(&self) -> Option<impl FnOnce() -> GpioDriver + '_> {
        self.descriptor.gpio.as_ref().map(|f| move || f(&self.config))
    }

    fn i2c_builder(&self) -> Option<impl FnOnce() -> I2cDriver + '_> {
        self.descriptor.i2c.as_ref().map(|f| move || f(&self.config))
    }

    fn led_builder(&self) -> Option<impl FnOnce() -> LedDriver + '_> {
        self.descriptor.led.as_ref().map(|f| move || f(&self.config))
    }

    fn spi_builder(&self) -> Option<impl FnOnce() -> SpiDriver + '_> {
        self.descriptor.spi.as_ref().map(|f| move || f(&self.config))
    }

    /// Create the GPIO driver. Fails with [`Error::AlreadyInitialized`] if it
    /// exists.
    pub fn init_gpio(&self) -> Result<()> {
        self.gpio.init(self.host, self.gpio_builder()).map(drop)
    }

    /// Create the I²C driver.
    pub fn init_i2c(&self) -> Result<()> {
        self.i2c.init(self.host, self.i2c_builder()).map(drop)
    }

    /// Create the LED driver.
    pub fn init_led(&self) -> Result<()> {
        self.led.init(self.host, self.led_builder()).map(drop)
    }

    /// Create the SPI driver.
    pub fn init_spi(&self) -> Result<()> {
        self.spi.init(self.host, self.spi_builder()).map(drop)
    }

    /// The GPIO driver, created on first use.
    pub fn gpio(&self) -> Result<Arc<GpioDriver>> {
        self.gpio.get_or_init(self.host, self.gpio_builder())
    }

    /// The I²C driver, created on first use.
    pub fn i2c(&self) -> Result<Arc<I2cDriver>> {
        self.i2c.get_or_init(self.host, self.i2c_builder())
    }

    /// The LED driver, created on first use.
    pub fn led(&self) -> Result<Arc<LedDriver>> {
        self.led.get_or_init(self.host, self.led_builder())
    }

    /// The SPI driver, created on first use.
    pub fn spi(&self) -> Result<Arc<SpiDriver>> {
        self.spi.get_or_init(self.host, self.spi_builder())
    }

    /// Close the GPIO driver and every pin it opened.
    pub fn close_gpio(&self) -> Result<()> {
        self.gpio.take().map_or(Ok(()), |driver| driver.close())
    }

    /// Close the I²C driver and its buses.
    pub fn close_i2c(&self) -> Result<()> {
        self.i2c.take().map_or(Ok(()), |driver| driver.close())
    }

    /// Close the LED driver and its LEDs.
    pub fn close_led(&self) -> Result<()> {
        self.led.take().map_or(Ok(()), |driver| driver.close())
    }

    /// Close the SPI driver and its buses.
    pub fn close_spi(&self) -> Result<()> {
        self.spi.take().map_or(Ok(()), |driver| driver.close())
    }

    /// Close every driver. All are attempted; the first failure is returned.
    pub fn close(&self) -> Result<()> {
        let results = [
            self.close_gpio(),
            self.close_i2c(),
            self.close_led(),
            self.close_spi(),
        ];
        let mut first = None;
        for result in results {
            if let Err(e) = result {
                warn!(error = %e, "driver close failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    // ─── GPIO helpers ───────────────────────────────────────────────

    /// Digital pin for `key`.
    pub fn new_digital_pin<K: fmt::Display>(&self, key: K) -> Result<Arc<dyn DigitalPin>> {
        self.gpio()?.digital_pin(key)
    }

    /// Analog pin for `key`.
    pub fn new_analog_pin<K: fmt::Display>(&self, key: K) -> Result<Arc<dyn AnalogPin>> {
        self.gpio()?.analog_pin(key)
    }

    /// PWM pin for `key`.
    pub fn new_pwm_pin<K: fmt::Display>(&self, key: K) -> Result<Arc<dyn PwmPin>> {
        self.gpio()?.pwm_pin(key)
    }

    /// Set the direction of pin `key`.
    pub fn set_direction<K: fmt::Display>(&self, key: K, direction: Direction) -> Result<()> {
        self.new_digital_pin(key)?.set_direction(direction)
    }

    /// Drive pin `key`.
    pub fn digital_write<K: fmt::Display>(&self, key: K, level: Level) -> Result<()> {
        self.new_digital_pin(key)?.write(level)
    }

    /// Sample pin `key`.
    pub fn digital_read<K: fmt::Display>(&self, key: K) -> Result<Level> {
        self.new_digital_pin(key)?.read()
    }

    /// Set the active-low flag of pin `key`.
    pub fn active_low<K: fmt::Display>(&self, key: K, enabled: bool) -> Result<()> {
        self.new_digital_pin(key)?.active_low(enabled)
    }

    /// Enable the pull-up of pin `key`.
    pub fn pull_up<K: fmt::Display>(&self, key: K) -> Result<()> {
        self.new_digital_pin(key)?.pull_up()
    }

    /// Enable the pull-down of pin `key`.
    pub fn pull_down<K: fmt::Display>(&self, key: K) -> Result<()> {
        self.new_digital_pin(key)?.pull_down()
    }

    /// Sample analog pin `key`.
    pub fn analog_read<K: fmt::Display>(&self, key: K) -> Result<i32> {
        self.new_analog_pin(key)?.analog_read()
    }

    // ─── Bus and LED helpers ────────────────────────────────────────

    /// I²C bus `n`.
    pub fn new_i2c_bus(&self, n: u8) -> Result<Arc<dyn I2cBus>> {
        self.i2c()?.bus(n)
    }

    /// SPI bus on `channel`; zero speed/bits select the configured defaults.
    pub fn new_spi_bus(
        &self,
        mode: SpiMode,
        channel: u8,
        speed_hz: u32,
        bits_per_word: u8,
        delay_us: u16,
    ) -> Result<Arc<dyn SpiBus>> {
        self.spi()?
            .bus(mode, channel, speed_hz, bits_per_word, delay_us)
    }

    /// LED for `key`.
    pub fn new_led<K: fmt::Display>(&self, key: K) -> Result<Arc<dyn Led>> {
        self.led()?.led(key)
    }

    /// Turn LED `key` on.
    pub fn led_on<K: fmt::Display>(&self, key: K) -> Result<()> {
        self.new_led(key)?.on()
    }

    /// Turn LED `key` off.
    pub fn led_off<K: fmt::Display>(&self, key: K) -> Result<()> {
        self.new_led(key)?.off()
    }

    /// Toggle LED `key`.
    pub fn led_toggle<K: fmt::Display>(&self, key: K) -> Result<()> {
        self.new_led(key)?.toggle()
    }
}

impl fmt::Debug for Hal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hal")
            .field("host", &self.host)
            .field("revision", &self.revision)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
