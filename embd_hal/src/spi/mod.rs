//! SPI buses and the generic SPI driver.
//!
//! Every transfer is full duplex: the buffer is clocked out and overwritten
//! in place with what the slave returned.

pub mod linux;

use crate::cache::{Cache, DriverLink};
use embd_common::config::SpiConfig;
use embd_common::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

pub use linux::{LinuxSpiBus, SpiDevFile, SpiDevice};

/// SPI clock polarity/phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0.
    #[default]
    Mode0,
    /// CPOL=0, CPHA=1.
    Mode1,
    /// CPOL=1, CPHA=0.
    Mode2,
    /// CPOL=1, CPHA=1.
    Mode3,
}

impl SpiMode {
    /// Value written with `SPI_IOC_WR_MODE`.
    pub fn bits(self) -> u8 {
        match self {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        }
    }
}

impl TryFrom<u8> for SpiMode {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(SpiMode::Mode0),
            1 => Ok(SpiMode::Mode1),
            2 => Ok(SpiMode::Mode2),
            3 => Ok(SpiMode::Mode3),
            other => Err(Error::OutOfRange(format!("spi mode {other}"))),
        }
    }
}

/// Everything a bus needs to open and clock its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiSettings {
    /// Clock mode.
    pub mode: SpiMode,
    /// Chip select (`/dev/spidev<minor>.<channel>`).
    pub channel: u8,
    /// Clock speed in Hz.
    pub speed_hz: u32,
    /// Bits per word.
    pub bits_per_word: u8,
    /// Delay after each transfer, in µs.
    pub delay_us: u16,
}

/// One SPI slave on a chip select.
pub trait SpiBus: Send + Sync {
    /// Chip select this bus drives.
    fn channel(&self) -> u8;

    /// Clock `data` out and replace it with the received bytes.
    fn transfer_and_receive_data(&self, data: &mut [u8]) -> Result<()>;

    /// Clock out `len` zero bytes and return what came back.
    fn receive_data(&self, len: usize) -> Result<Vec<u8>>;

    /// Exchange a single byte.
    fn transfer_and_receive_byte(&self, data: u8) -> Result<u8>;

    /// Clock out a zero byte and return the received one.
    fn receive_byte(&self) -> Result<u8>;

    /// Half-duplex write through `write(2)`; returns the byte count.
    fn write(&self, data: &[u8]) -> Result<usize>;

    /// Release the device node. Idempotent.
    fn close(&self) -> Result<()>;
}

/// One-shot board hook run before the first SPI device is opened (e.g. a
/// device-tree overlay that creates `/dev/spidev*`).
///
/// A failed run is retried by the next bus that initializes.
pub struct SpiInitializer {
    hook: Box<dyn Fn() -> Result<()> + Send + Sync>,
    done: Mutex<bool>,
}

impl SpiInitializer {
    /// Wrap `hook`.
    pub fn new(hook: impl Fn() -> Result<()> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            hook: Box::new(hook),
            done: Mutex::new(false),
        })
    }

    /// Run the hook unless it already succeeded.
    pub fn run(&self) -> Result<()> {
        let mut done = self.done.lock();
        if !*done {
            (self.hook)()?;
            *done = true;
            debug!("spi initializer ran");
        }
        Ok(())
    }
}

/// Handle a bus keeps to remove itself from its driver.
pub type SpiLink = DriverLink<u8>;

/// Builds a bus from resolved settings.
pub type SpiBusFactory = Box<dyn Fn(SpiSettings, SpiLink) -> Result<Arc<dyn SpiBus>> + Send + Sync>;

/// Generic SPI driver. Buses are created on demand; the driver tracks the
/// latest bus per chip select so it can close them.
pub struct SpiDriver {
    defaults: SpiConfig,
    factory: SpiBusFactory,
    buses: Cache<u8, Arc<dyn SpiBus>>,
}

impl SpiDriver {
    /// Create a driver; zero speed, bits or delay passed to
    /// [`bus`](Self::bus) fall back to `defaults`.
    pub fn new(defaults: SpiConfig, factory: SpiBusFactory) -> Self {
        Self {
            defaults,
            factory,
            buses: Cache::new(),
        }
    }

    /// Create a bus on `channel`.
    ///
    /// Zero `speed_hz`, `bits_per_word` or `delay_us` selects the configured
    /// default. A bus previously returned for the same channel stays usable
    /// but is no longer closed by [`close`](Self::close).
    pub fn bus(
        &self,
        mode: SpiMode,
        channel: u8,
        speed_hz: u32,
        bits_per_word: u8,
        delay_us: u16,
    ) -> Result<Arc<dyn SpiBus>> {
        let settings = SpiSettings {
            mode,
            channel,
            speed_hz: if speed_hz == 0 { self.defaults.speed_hz } else { speed_hz },
            bits_per_word: if bits_per_word == 0 {
                self.defaults.bits_per_word
            } else {
                bits_per_word
            },
            delay_us: if delay_us == 0 { self.defaults.delay_us } else { delay_us },
        };
        let (bus, previous) = self
            .buses
            .replace(channel, |link| (self.factory)(settings, link))?;
        if previous.is_some() {
            debug!(channel, "spi bus replaced");
        }
        Ok(bus)
    }

    /// Number of tracked buses.
    pub fn open_buses(&self) -> usize {
        self.buses.len()
    }

    /// Close every tracked bus; the first failure is returned.
    pub fn close(&self) -> Result<()> {
        let mut first = None;
        for bus in self.buses.drain() {
            if let Err(e) = bus.close() {
                warn!(channel = bus.channel(), error = %e, "spi bus close failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}
