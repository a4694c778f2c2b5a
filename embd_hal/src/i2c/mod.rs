//! I²C buses and the generic I²C driver.
//!
//! Register helpers are combined write-then-read transactions issued in one
//! `I2C_RDWR` call, so no other master can slip in between the register
//! select and the data phase. Word values are big-endian on the wire.

pub mod linux;

use crate::cache::{Cache, DriverLink};
use embd_common::Result;
use std::sync::Arc;
use tracing::warn;

pub use linux::{I2cDevFile, I2cDevice, I2cMessage, LinuxI2cBus};

/// One I²C master.
pub trait I2cBus: Send + Sync {
    /// Adapter number (`/dev/i2c-<bus>`).
    fn bus(&self) -> u8;

    /// Read a single byte from `addr`.
    fn read_byte(&self, addr: u8) -> Result<u8>;

    /// Read `len` bytes from `addr`.
    fn read_bytes(&self, addr: u8, len: usize) -> Result<Vec<u8>>;

    /// Write a single byte to `addr`.
    fn write_byte(&self, addr: u8, value: u8) -> Result<()>;

    /// Write `data` to `addr`.
    fn write_bytes(&self, addr: u8, data: &[u8]) -> Result<()>;

    /// Fill `buf` starting at register `reg`.
    fn read_from_reg(&self, addr: u8, reg: u8, buf: &mut [u8]) -> Result<()>;

    /// Read one byte from register `reg`.
    fn read_byte_from_reg(&self, addr: u8, reg: u8) -> Result<u8>;

    /// Read a big-endian word from register `reg`.
    fn read_word_from_reg(&self, addr: u8, reg: u8) -> Result<u16>;

    /// Write `data` starting at register `reg`.
    fn write_to_reg(&self, addr: u8, reg: u8, data: &[u8]) -> Result<()>;

    /// Write one byte to register `reg`.
    fn write_byte_to_reg(&self, addr: u8, reg: u8, value: u8) -> Result<()>;

    /// Write a big-endian word to register `reg`.
    fn write_word_to_reg(&self, addr: u8, reg: u8, value: u16) -> Result<()>;

    /// Release the device node and drop out of the driver cache. Idempotent.
    fn close(&self) -> Result<()>;
}

/// Handle a bus keeps to remove itself from its driver's cache.
pub type BusLink = DriverLink<u8>;

/// Builds a bus for an adapter number.
pub type I2cBusFactory = Box<dyn Fn(u8, BusLink) -> Result<Arc<dyn I2cBus>> + Send + Sync>;

/// Generic I²C driver: one cached bus per adapter number.
pub struct I2cDriver {
    factory: I2cBusFactory,
    buses: Cache<u8, Arc<dyn I2cBus>>,
}

impl I2cDriver {
    /// Create a driver that builds buses with `factory`.
    pub fn new(factory: I2cBusFactory) -> Self {
        Self {
            factory,
            buses: Cache::new(),
        }
    }

    /// Bus `n`, created on first use.
    pub fn bus(&self, n: u8) -> Result<Arc<dyn I2cBus>> {
        self.buses.acquire(
            n,
            |bus| Ok(Arc::clone(bus)),
            |link| {
                let bus = (self.factory)(n, link)?;
                Ok((Arc::clone(&bus), bus))
            },
        )
    }

    /// Forget bus `n` without closing it.
    pub fn unregister(&self, n: u8) {
        self.buses.remove(&n);
    }

    /// Number of open buses.
    pub fn open_buses(&self) -> usize {
        self.buses.len()
    }

    /// Close every bus; the first failure is returned.
    pub fn close(&self) -> Result<()> {
        let mut first = None;
        for bus in self.buses.drain() {
            if let Err(e) = bus.close() {
                warn!(bus = bus.bus(), error = %e, "i2c bus close failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}
