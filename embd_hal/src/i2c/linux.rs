//! I²C through the Linux `i2c-dev` character device.
//!
//! Plain reads and writes go through `read(2)`/`write(2)` after selecting the
//! slave with `I2C_SLAVE`. Register accesses use `I2C_RDWR`, which carries
//! the slave address in every message.

use super::{BusLink, I2cBus, I2cBusFactory};
use embd_common::config::PathsConfig;
use embd_common::consts::I2C_M_RD;
use embd_common::{Error, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

// ─── Kernel Interface ───────────────────────────────────────────────

mod ioctl {
    use embd_common::consts::{I2C_RDWR, I2C_SLAVE};

    /// `struct i2c_msg` from `<linux/i2c.h>`.
    #[repr(C)]
    pub struct RawMsg {
        pub addr: u16,
        pub flags: u16,
        pub len: u16,
        pub buf: *mut u8,
    }

    /// `struct i2c_rdwr_ioctl_data` from `<linux/i2c-dev.h>`.
    #[repr(C)]
    pub struct RdwrData {
        pub msgs: *mut RawMsg,
        pub nmsgs: u32,
    }

    nix::ioctl_write_int_bad!(set_slave, I2C_SLAVE);
    nix::ioctl_write_ptr_bad!(rdwr, I2C_RDWR, RdwrData);
}

/// One segment of a combined transaction.
#[derive(Debug)]
pub enum I2cMessage<'a> {
    /// Send `data` to `addr`.
    Write {
        /// 7-bit slave address.
        addr: u8,
        /// Bytes to send.
        data: &'a [u8],
    },
    /// Fill `buf` from `addr`.
    Read {
        /// 7-bit slave address.
        addr: u8,
        /// Receive buffer.
        buf: &'a mut [u8],
    },
}

impl I2cMessage<'_> {
    /// Slave address.
    pub fn addr(&self) -> u8 {
        match self {
            I2cMessage::Write { addr, .. } | I2cMessage::Read { addr, .. } => *addr,
        }
    }

    /// `i2c_msg.flags`: `I2C_M_RD` for reads, `0` for writes.
    pub fn flags(&self) -> u16 {
        match self {
            I2cMessage::Write { .. } => 0,
            I2cMessage::Read { .. } => I2C_M_RD,
        }
    }

    /// Payload length.
    pub fn len(&self) -> usize {
        match self {
            I2cMessage::Write { data, .. } => data.len(),
            I2cMessage::Read { buf, .. } => buf.len(),
        }
    }

    /// True for a zero-length message.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_raw(&mut self) -> Result<ioctl::RawMsg> {
        let len = u16::try_from(self.len())
            .map_err(|_| Error::OutOfRange(format!("i2c message of {} bytes", self.len())))?;
        let addr = u16::from(self.addr());
        let flags = self.flags();
        let buf = match self {
            // The kernel only reads from write buffers.
            I2cMessage::Write { data, .. } => data.as_ptr().cast_mut(),
            I2cMessage::Read { buf, .. } => buf.as_mut_ptr(),
        };
        Ok(ioctl::RawMsg {
            addr,
            flags,
            len,
            buf,
        })
    }
}

/// Raw access to an I²C adapter; the seam between [`LinuxI2cBus`] and the
/// kernel.
pub trait I2cDevice: Send {
    /// Select the slave for subsequent `read`/`write`.
    fn set_slave(&mut self, addr: u8) -> Result<()>;

    /// Read into `buf`, returning the byte count.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write `data`, returning the byte count.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Issue `msgs` as one combined transaction.
    fn transfer(&mut self, msgs: &mut [I2cMessage<'_>]) -> Result<()>;
}

/// An open `/dev/i2c-N` node.
pub struct I2cDevFile {
    file: File,
    path: PathBuf,
}

impl I2cDevFile {
    /// Open the device node read-write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::io("open", &path, e))?;
        Ok(Self { file, path })
    }
}

impl I2cDevice for I2cDevFile {
    fn set_slave(&mut self, addr: u8) -> Result<()> {
        // SAFETY: I2C_SLAVE takes the address by value; the fd is open.
        unsafe { ioctl::set_slave(self.file.as_raw_fd(), i32::from(addr)) }
            .map_err(|errno| Error::sys("ioctl(I2C_SLAVE)", errno))?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file
            .read(buf)
            .map_err(|e| Error::io("read", &self.path, e))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.file
            .write(data)
            .map_err(|e| Error::io("write", &self.path, e))
    }

    fn transfer(&mut self, msgs: &mut [I2cMessage<'_>]) -> Result<()> {
        let mut raw = msgs
            .iter_mut()
            .map(I2cMessage::as_raw)
            .collect::<Result<Vec<_>>>()?;
        let data = ioctl::RdwrData {
            msgs: raw.as_mut_ptr(),
            nmsgs: raw.len() as u32,
        };
        // SAFETY: every message points into a buffer borrowed from `msgs`,
        // which outlives the call; `raw` outlives `data`.
        unsafe { ioctl::rdwr(self.file.as_raw_fd(), &data) }
            .map_err(|errno| Error::sys("ioctl(I2C_RDWR)", errno))?;
        Ok(())
    }
}

// ─── Bus ────────────────────────────────────────────────────────────

type DeviceOpener = Box<dyn Fn(u8) -> Result<Box<dyn I2cDevice>> + Send + Sync>;

#[derive(Default)]
struct BusState {
    device: Option<Box<dyn I2cDevice>>,
    slave: Option<u8>,
    closed: bool,
}

/// [`I2cBus`] over an [`I2cDevice`], opened on first use.
///
/// The bus remembers the last selected slave and skips redundant
/// `I2C_SLAVE` calls.
pub struct LinuxI2cBus {
    bus: u8,
    link: BusLink,
    write_delay: Option<Duration>,
    open: DeviceOpener,
    state: Mutex<BusState>,
}

impl LinuxI2cBus {
    /// Bus `bus` backed by the device node at `path`.
    pub fn new(bus: u8, path: impl Into<PathBuf>, link: BusLink, write_delay: Option<Duration>) -> Self {
        let path = path.into();
        Self::with_opener(bus, link, write_delay, move |_| {
            Ok(Box::new(I2cDevFile::open(&path)?) as Box<dyn I2cDevice>)
        })
    }

    /// Bus `bus` whose device comes from `open`, called once on first use.
    pub fn with_opener(
        bus: u8,
        link: BusLink,
        write_delay: Option<Duration>,
        open: impl Fn(u8) -> Result<Box<dyn I2cDevice>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            bus,
            link,
            write_delay,
            open: Box::new(open),
            state: Mutex::new(BusState::default()),
        }
    }

    /// Factory for [`I2cDriver`](super::I2cDriver) using `/dev/i2c-N` under
    /// `paths`.
    pub fn factory(paths: &PathsConfig, write_delay: Option<Duration>) -> I2cBusFactory {
        let paths = paths.clone();
        Box::new(move |bus, link| {
            Ok(Arc::new(Self::new(bus, paths.i2c_device(bus), link, write_delay)) as Arc<dyn I2cBus>)
        })
    }

    /// Run `f` on the open device, selecting `addr` first when given.
    fn with_device<R>(
        &self,
        addr: Option<u8>,
        f: impl FnOnce(&mut dyn I2cDevice) -> Result<R>,
    ) -> Result<R> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed(format!("i2c bus {}", self.bus)));
        }
        if state.device.is_none() {
            state.device = Some((self.open)(self.bus)?);
            debug!(bus = self.bus, "i2c bus opened");
        }

        let BusState { device, slave, .. } = &mut *state;
        let Some(device) = device.as_deref_mut() else {
            return Err(Error::Closed(format!("i2c bus {}", self.bus)));
        };
        if let Some(addr) = addr {
            if *slave != Some(addr) {
                device.set_slave(addr)?;
                *slave = Some(addr);
                trace!(bus = self.bus, addr, "slave selected");
            }
        }
        f(device)
    }
}

fn expect_len(op: &'static str, expected: usize, actual: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::ShortTransfer {
            op,
            expected,
            actual,
        });
    }
    Ok(())
}

impl I2cBus for LinuxI2cBus {
    fn bus(&self) -> u8 {
        self.bus
    }

    fn read_byte(&self, addr: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.with_device(Some(addr), |device| {
            expect_len("i2c read", 1, device.read(&mut buf)?)
        })?;
        Ok(buf[0])
    }

    fn read_bytes(&self, addr: u8, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.with_device(Some(addr), |device| {
            expect_len("i2c read", len, device.read(&mut buf)?)
        })?;
        Ok(buf)
    }

    fn write_byte(&self, addr: u8, value: u8) -> Result<()> {
        self.with_device(Some(addr), |device| {
            expect_len("i2c write", 1, device.write(&[value])?)
        })
    }

    fn write_bytes(&self, addr: u8, data: &[u8]) -> Result<()> {
        let delay = self.write_delay;
        self.with_device(Some(addr), |device| match delay {
            Some(delay) => {
                for byte in data {
                    expect_len("i2c write", 1, device.write(std::slice::from_ref(byte))?)?;
                    thread::sleep(delay);
                }
                Ok(())
            }
            None => expect_len("i2c write", data.len(), device.write(data)?),
        })
    }

    fn read_from_reg(&self, addr: u8, reg: u8, buf: &mut [u8]) -> Result<()> {
        let select = [reg];
        self.with_device(None, |device| {
            device.transfer(&mut [
                I2cMessage::Write {
                    addr,
                    data: &select,
                },
                I2cMessage::Read { addr, buf },
            ])
        })
    }

    fn read_byte_from_reg(&self, addr: u8, reg: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_from_reg(addr, reg, &mut buf)?;
        Ok(buf[0])
    }

    fn read_word_from_reg(&self, addr: u8, reg: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_from_reg(addr, reg, &mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_to_reg(&self, addr: u8, reg: u8, data: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(reg);
        frame.extend_from_slice(data);
        self.with_device(None, |device| {
            device.transfer(&mut [I2cMessage::Write { addr, data: &frame }])
        })
    }

    fn write_byte_to_reg(&self, addr: u8, reg: u8, value: u8) -> Result<()> {
        self.write_to_reg(addr, reg, &[value])
    }

    fn write_word_to_reg(&self, addr: u8, reg: u8, value: u16) -> Result<()> {
        self.write_to_reg(addr, reg, &value.to_be_bytes())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.slave = None;
        if state.device.take().is_some() {
            debug!(bus = self.bus, "i2c bus closed");
        }
        self.link.unregister();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_flags_and_lengths() {
        let data = [1, 2, 3];
        let mut buf = [0u8; 2];
        let write = I2cMessage::Write { addr: 0x20, data: &data };
        let read = I2cMessage::Read { addr: 0x20, buf: &mut buf };
        assert_eq!(write.flags(), 0);
        assert_eq!(write.len(), 3);
        assert_eq!(read.flags(), I2C_M_RD);
        assert_eq!(read.len(), 2);
    }

    #[test]
    fn raw_message_layout() {
        let data = [0x05, 0x12, 0x34];
        let mut msg = I2cMessage::Write { addr: 0x20, data: &data };
        let raw = msg.as_raw().unwrap();
        assert_eq!(raw.addr, 0x20);
        assert_eq!(raw.flags, 0);
        assert_eq!(raw.len, 3);
        assert_eq!(raw.buf.cast_const(), data.as_ptr());
    }

    #[test]
    fn oversized_message_is_rejected() {
        let data = vec![0u8; usize::from(u16::MAX) + 1];
        let mut msg = I2cMessage::Write { addr: 0x20, data: &data };
        assert!(matches!(msg.as_raw(), Err(Error::OutOfRange(_))));
    }

    #[test]
    fn missing_device_node_fails_on_first_use() {
        let bus = LinuxI2cBus::new(7, "/nonexistent/i2c-7", BusLink::detached(7), None);
        assert!(matches!(bus.read_byte(0x20), Err(Error::Io { op: "open", .. })));
    }
}
