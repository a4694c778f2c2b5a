//! SPI through the Linux `spidev` character device.

use super::{SpiBus, SpiBusFactory, SpiInitializer, SpiLink, SpiSettings};
use embd_common::config::PathsConfig;
use embd_common::{Error, Result};
use parking_lot::Mutex;
use static_assertions::const_assert_eq;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

// ─── Kernel Interface ───────────────────────────────────────────────

const SPI_IOC_MAGIC: u8 = b'k';

/// `struct spi_ioc_transfer` from `<linux/spi/spidev.h>`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    pad: u8,
}

const_assert_eq!(std::mem::size_of::<SpiIocTransfer>(), 32);

mod ioctl {
    use super::{SPI_IOC_MAGIC, SpiIocTransfer};

    nix::ioctl_write_ptr!(wr_mode, SPI_IOC_MAGIC, 1, u8);
    nix::ioctl_write_ptr!(wr_bits_per_word, SPI_IOC_MAGIC, 3, u8);
    nix::ioctl_write_ptr!(wr_max_speed_hz, SPI_IOC_MAGIC, 4, u32);
    nix::ioctl_write_buf!(message, SPI_IOC_MAGIC, 0, SpiIocTransfer);
}

/// Raw access to a spidev node; the seam between [`LinuxSpiBus`] and the
/// kernel.
pub trait SpiDevice: Send {
    /// `SPI_IOC_WR_MODE`.
    fn set_mode(&mut self, mode: u8) -> Result<()>;

    /// `SPI_IOC_WR_MAX_SPEED_HZ`.
    fn set_max_speed_hz(&mut self, hz: u32) -> Result<()>;

    /// `SPI_IOC_WR_BITS_PER_WORD`.
    fn set_bits_per_word(&mut self, bits: u8) -> Result<()>;

    /// One full-duplex transfer; `buf` is both transmit and receive buffer.
    fn transfer(&mut self, buf: &mut [u8], settings: &SpiSettings) -> Result<()>;

    /// Plain `write(2)`.
    fn write(&mut self, data: &[u8]) -> Result<usize>;
}

/// An open `/dev/spidevM.C` node.
pub struct SpiDevFile {
    file: File,
    path: PathBuf,
}

impl SpiDevFile {
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

impl SpiDevice for SpiDevFile {
    fn set_mode(&mut self, mode: u8) -> Result<()> {
        // SAFETY: the kernel reads one u8 through the pointer.
        unsafe { ioctl::wr_mode(self.file.as_raw_fd(), &mode) }
            .map_err(|errno| Error::sys("ioctl(SPI_IOC_WR_MODE)", errno))?;
        Ok(())
    }

    fn set_max_speed_hz(&mut self, hz: u32) -> Result<()> {
        // SAFETY: the kernel reads one u32 through the pointer.
        unsafe { ioctl::wr_max_speed_hz(self.file.as_raw_fd(), &hz) }
            .map_err(|errno| Error::sys("ioctl(SPI_IOC_WR_MAX_SPEED_HZ)", errno))?;
        Ok(())
    }

    fn set_bits_per_word(&mut self, bits: u8) -> Result<()> {
        // SAFETY: the kernel reads one u8 through the pointer.
        unsafe { ioctl::wr_bits_per_word(self.file.as_raw_fd(), &bits) }
            .map_err(|errno| Error::sys("ioctl(SPI_IOC_WR_BITS_PER_WORD)", errno))?;
        Ok(())
    }

    fn transfer(&mut self, buf: &mut [u8], settings: &SpiSettings) -> Result<()> {
        let len = u32::try_from(buf.len())
            .map_err(|_| Error::OutOfRange(format!("spi transfer of {} bytes", buf.len())))?;
        let ptr = buf.as_mut_ptr() as u64;
        let xfer = SpiIocTransfer {
            tx_buf: ptr,
            rx_buf: ptr,
            len,
            speed_hz: settings.speed_hz,
            delay_usecs: settings.delay_us,
            bits_per_word: settings.bits_per_word,
            ..SpiIocTransfer::default()
        };
        // SAFETY: tx and rx point at `buf`, which stays borrowed for the call.
        unsafe { ioctl::message(self.file.as_raw_fd(), std::slice::from_ref(&xfer)) }
            .map_err(|errno| Error::sys("ioctl(SPI_IOC_MESSAGE)", errno))?;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.file
            .write(data)
            .map_err(|e| Error::io("write", &self.path, e))
    }
}

// ─── Bus ────────────────────────────────────────────────────────────

type DeviceOpener = Box<dyn Fn(&SpiSettings) -> Result<Box<dyn SpiDevice>> + Send + Sync>;

#[derive(Default)]
struct BusState {
    device: Option<Box<dyn SpiDevice>>,
    closed: bool,
}

/// [`SpiBus`] over a [`SpiDevice`], configured on first use.
pub struct LinuxSpiBus {
    settings: SpiSettings,
    link: SpiLink,
    initializer: Option<Arc<SpiInitializer>>,
    open: DeviceOpener,
    state: Mutex<BusState>,
}

impl LinuxSpiBus {
    /// Bus on `/dev/spidev<minor>.<channel>` under `paths`.
    pub fn new(
        paths: &PathsConfig,
        minor: u8,
        settings: SpiSettings,
        link: SpiLink,
        initializer: Option<Arc<SpiInitializer>>,
    ) -> Self {
        let path = paths.spi_device(minor, settings.channel);
        Self::with_opener(settings, link, initializer, move |_| {
            Ok(Box::new(SpiDevFile::open(&path)?) as Box<dyn SpiDevice>)
        })
    }

    /// Bus whose device comes from `open`, called once on first use.
    pub fn with_opener(
        settings: SpiSettings,
        link: SpiLink,
        initializer: Option<Arc<SpiInitializer>>,
        open: impl Fn(&SpiSettings) -> Result<Box<dyn SpiDevice>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            settings,
            link,
            initializer,
            open: Box::new(open),
            state: Mutex::new(BusState::default()),
        }
    }

    /// Factory for [`SpiDriver`](super::SpiDriver) on spidev minor `minor`.
    pub fn factory(
        paths: &PathsConfig,
        minor: u8,
        initializer: Option<Arc<SpiInitializer>>,
    ) -> SpiBusFactory {
        let paths = paths.clone();
        Box::new(move |settings, link| {
            Ok(Arc::new(Self::new(&paths, minor, settings, link, initializer.clone())) as Arc<dyn SpiBus>)
        })
    }

    /// Resolved settings.
    pub fn settings(&self) -> &SpiSettings {
        &self.settings
    }

    fn with_device<R>(&self, f: impl FnOnce(&mut dyn SpiDevice) -> Result<R>) -> Result<R> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed(format!("spi bus {}", self.settings.channel)));
        }
        if state.device.is_none() {
            if let Some(initializer) = &self.initializer {
                initializer.run()?;
            }
            let mut device = (self.open)(&self.settings)?;
            device.set_mode(self.settings.mode.bits())?;
            device.set_max_speed_hz(self.settings.speed_hz)?;
            device.set_bits_per_word(self.settings.bits_per_word)?;
            debug!(
                channel = self.settings.channel,
                speed_hz = self.settings.speed_hz,
                bits_per_word = self.settings.bits_per_word,
                "spi bus configured"
            );
            state.device = Some(device);
        }
        match state.device.as_deref_mut() {
            Some(device) => f(device),
            None => Err(Error::Closed(format!("spi bus {}", self.settings.channel))),
        }
    }
}

impl SpiBus for LinuxSpiBus {
    fn channel(&self) -> u8 {
        self.settings.channel
    }

    fn transfer_and_receive_data(&self, data: &mut [u8]) -> Result<()> {
        let settings = self.settings;
        self.with_device(|device| device.transfer(data, &settings))
    }

    fn receive_data(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.transfer_and_receive_data(&mut buf)?;
        Ok(buf)
    }

    fn transfer_and_receive_byte(&self, data: u8) -> Result<u8> {
        let mut buf = [data];
        self.transfer_and_receive_data(&mut buf)?;
        Ok(buf[0])
    }

    fn receive_byte(&self) -> Result<u8> {
        self.transfer_and_receive_byte(0)
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        self.with_device(|device| device.write(data))
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        if state.device.take().is_some() {
            debug!(channel = self.settings.channel, "spi bus closed");
        }
        self.link.unregister();
        Ok(())
    }
}
