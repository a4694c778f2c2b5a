//! Digital pins through the legacy `/sys/class/gpio` interface.
//!
//! A pin is exported lazily on its first operation and unexported on
//! `close()`. The `direction`, `value` and `active_low` attribute files stay
//! open for the pin's lifetime.

use super::{DigitalPin, Direction, Edge, EdgeHandler, Level, PinLink};
use crate::interrupt::{self, Dispatcher};
use crate::sysfs::{rewrite, write_attr};
use embd_common::config::PathsConfig;
use embd_common::pin::PinDescriptor;
use embd_common::{Error, Result};
use nix::errno::Errno;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

struct PinFiles {
    direction: File,
    /// Shared so interrupt registration can outlive a state lock.
    value: Arc<File>,
    active_low: File,
}

#[derive(Default)]
struct PinState {
    files: Option<PinFiles>,
    exported: bool,
    watching: Option<Arc<Dispatcher>>,
    closed: bool,
}

/// sysfs-backed [`DigitalPin`].
pub struct SysfsDigitalPin {
    id: &'static str,
    n: u32,
    gpio_dir: PathBuf,
    link: PinLink,
    dispatcher: Option<Arc<Dispatcher>>,
    state: Mutex<PinState>,
    this: Weak<SysfsDigitalPin>,
}

impl SysfsDigitalPin {
    /// Create an unexported pin for `descriptor` under `gpio_dir`
    /// (normally `/sys/class/gpio`). Interrupts go through the process-wide
    /// dispatcher.
    pub fn new(descriptor: &PinDescriptor, gpio_dir: impl Into<PathBuf>, link: PinLink) -> Arc<Self> {
        Self::build(descriptor, gpio_dir.into(), link, None)
    }

    /// Like [`new`](Self::new) but dispatching interrupts through `dispatcher`.
    pub fn with_dispatcher(
        descriptor: &PinDescriptor,
        gpio_dir: impl Into<PathBuf>,
        link: PinLink,
        dispatcher: Arc<Dispatcher>,
    ) -> Arc<Self> {
        Self::build(descriptor, gpio_dir.into(), link, Some(dispatcher))
    }

    fn build(
        descriptor: &PinDescriptor,
        gpio_dir: PathBuf,
        link: PinLink,
        dispatcher: Option<Arc<Dispatcher>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id: descriptor.id,
            n: descriptor.digital_logical,
            gpio_dir,
            link,
            dispatcher,
            state: Mutex::new(PinState::default()),
            this: this.clone(),
        })
    }

    /// Factory for [`GpioDriver`](super::GpioDriver) rooted at `paths`.
    pub fn factory(paths: &PathsConfig) -> super::DigitalPinFactory {
        let gpio_dir = paths.gpio_dir();
        Box::new(move |descriptor, link| {
            Ok(Self::new(descriptor, gpio_dir.clone(), link) as Arc<dyn DigitalPin>)
        })
    }

    fn attr(&self, name: &str) -> PathBuf {
        pin_dir(&self.gpio_dir, self.n).join(name)
    }

    fn export(&self) -> Result<()> {
        match write_attr(&self.gpio_dir.join("export"), &self.n.to_string()) {
            Err(e) if e.raw_os_error() == Some(Errno::EBUSY as i32) => {
                trace!(pin = self.id, "already exported");
                Ok(())
            }
            other => other,
        }
    }

    fn unexport(&self) -> Result<()> {
        write_attr(&self.gpio_dir.join("unexport"), &self.n.to_string())
    }

    fn open_attr(&self, name: &str) -> Result<File> {
        let path = self.attr(name);
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::io("open", path, e))
    }

    /// Export on first use and hand back the open attribute files.
    fn files<'a>(&self, state: &'a mut PinState) -> Result<&'a mut PinFiles> {
        if state.closed {
            return Err(Error::Closed(format!("pin {}", self.id)));
        }
        if state.files.is_none() {
            if !state.exported {
                self.export()?;
                state.exported = true;
            }
            let files = PinFiles {
                direction: self.open_attr("direction")?,
                value: Arc::new(self.open_attr("value")?),
                active_low: self.open_attr("active_low")?,
            };
            debug!(pin = self.id, gpio = self.n, "exported");
            state.files = Some(files);
        }
        state
            .files
            .as_mut()
            .ok_or_else(|| Error::Closed(format!("pin {}", self.id)))
    }

    fn dispatcher(&self) -> Result<Arc<Dispatcher>> {
        match &self.dispatcher {
            Some(dispatcher) => Ok(Arc::clone(dispatcher)),
            None => interrupt::global(),
        }
    }

    fn wait_for(&self, level: Level, deadline: Instant, timeout: Duration) -> Result<Instant> {
        loop {
            if self.read()? == level {
                return Ok(Instant::now());
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "pin {} did not reach {level} within {timeout:?}",
                    self.id
                )));
            }
        }
    }
}

impl DigitalPin for SysfsDigitalPin {
    fn id(&self) -> &str {
        self.id
    }

    fn n(&self) -> u32 {
        self.n
    }

    fn write(&self, level: Level) -> Result<()> {
        let mut state = self.state.lock();
        let files = self.files(&mut state)?;
        let value = if level == Level::High { "1" } else { "0" };
        rewrite(&mut files.value, &self.attr("value"), value)
    }

    fn read(&self) -> Result<Level> {
        let mut state = self.state.lock();
        let files = self.files(&mut state)?;
        let path = self.attr("value");
        files
            .value
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::io("seek", &path, e))?;
        let mut buf = [0u8; 1];
        let read = files
            .value
            .read(&mut buf)
            .map_err(|e| Error::io("read", &path, e))?;
        if read != 1 {
            return Err(Error::ShortTransfer {
                op: "gpio read",
                expected: 1,
                actual: read,
            });
        }
        Ok(Level::from(buf[0] == b'1'))
    }

    fn set_direction(&self, direction: Direction) -> Result<()> {
        let mut state = self.state.lock();
        let files = self.files(&mut state)?;
        rewrite(&mut files.direction, &self.attr("direction"), direction.as_str())
    }

    fn active_low(&self, enabled: bool) -> Result<()> {
        let mut state = self.state.lock();
        let files = self.files(&mut state)?;
        let value = if enabled { "1" } else { "0" };
        rewrite(&mut files.active_low, &self.attr("active_low"), value)
    }

    fn pull_up(&self) -> Result<()> {
        Err(Error::NotImplemented("pull up via sysfs gpio"))
    }

    fn pull_down(&self) -> Result<()> {
        Err(Error::NotImplemented("pull down via sysfs gpio"))
    }

    fn time_pulse(&self, level: Level, timeout: Duration) -> Result<Duration> {
        let deadline = Instant::now() + timeout;
        self.wait_for(!level, deadline, timeout)?;
        let start = self.wait_for(level, deadline, timeout)?;
        let end = self.wait_for(!level, deadline, timeout)?;
        Ok(end - start)
    }

    fn watch(&self, edge: Edge, handler: EdgeHandler) -> Result<()> {
        let mut state = self.state.lock();
        let files = self.files(&mut state)?;
        write_attr(&self.attr("edge"), edge.as_str())?;

        let dispatcher = self.dispatcher()?;
        let this = self.this.clone();
        dispatcher.register(files.value.as_fd(), move || {
            if let Some(pin) = this.upgrade() {
                handler(&*pin);
            }
        })?;
        state.watching = Some(dispatcher);
        debug!(pin = self.id, edge = edge.as_str(), "watching");
        Ok(())
    }

    fn stop_watching(&self) -> Result<()> {
        let (dispatcher, value) = {
            let mut state = self.state.lock();
            let Some(dispatcher) = state.watching.take() else {
                return Ok(());
            };
            match &state.files {
                Some(files) => (dispatcher, Arc::clone(&files.value)),
                None => return Ok(()),
            }
        };
        dispatcher.unregister(value.as_fd())
    }

    fn close(&self) -> Result<()> {
        let (watching, files, exported) = {
            let mut state = self.state.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            (
                state.watching.take(),
                state.files.take(),
                std::mem::take(&mut state.exported),
            )
        };
        self.link.unregister();

        // The state lock is released here: a handler still running may touch
        // this pin, and unregister waits for it.
        let mut first = None;
        if let (Some(dispatcher), Some(files)) = (watching, &files) {
            if let Err(e) = dispatcher.unregister(files.value.as_fd()) {
                first.get_or_insert(e);
            }
        }
        drop(files);
        if exported {
            if let Err(e) = self.unexport() {
                first.get_or_insert(e);
            }
            debug!(pin = self.id, gpio = self.n, "unexported");
        }
        first.map_or(Ok(()), Err)
    }
}

/// Path of pin `n`'s directory under `gpio_dir`, e.g. `/sys/class/gpio/gpio4`.
pub fn pin_dir(gpio_dir: &Path, n: u32) -> PathBuf {
    gpio_dir.join(format!("gpio{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use embd_common::pin::Capability;
    use std::fs;
    use tempfile::TempDir;

    static PIN: PinDescriptor = PinDescriptor {
        id: "P1_7",
        aliases: &["4"],
        caps: Capability::DIGITAL,
        digital_logical: 4,
        analog_logical: 0,
    };

    fn fake_gpio(root: &Path) -> PathBuf {
        let gpio = root.join("gpio");
        let pin = pin_dir(&gpio, 4);
        fs::create_dir_all(&pin).unwrap();
        for name in ["export", "unexport"] {
            fs::write(gpio.join(name), "").unwrap();
        }
        for (name, value) in [("direction", "in"), ("value", "0"), ("active_low", "0"), ("edge", "none")] {
            fs::write(pin.join(name), value).unwrap();
        }
        gpio
    }

    #[test]
    fn first_operation_exports() {
        let dir = TempDir::new().unwrap();
        let gpio = fake_gpio(dir.path());
        let pin = SysfsDigitalPin::new(&PIN, &gpio, PinLink::detached("P1_7"));
        assert_eq!(fs::read_to_string(gpio.join("export")).unwrap(), "");

        pin.set_direction(Direction::Out).unwrap();
        assert_eq!(fs::read_to_string(gpio.join("export")).unwrap(), "4");
        assert_eq!(fs::read_to_string(pin_dir(&gpio, 4).join("direction")).unwrap(), "out");
    }

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let gpio = fake_gpio(dir.path());
        let pin = SysfsDigitalPin::new(&PIN, &gpio, PinLink::detached("P1_7"));
        pin.write(Level::High).unwrap();
        assert_eq!(pin.read().unwrap(), Level::High);
        pin.write(Level::Low).unwrap();
        assert_eq!(pin.read().unwrap(), Level::Low);
    }

    #[test]
    fn time_pulse_times_out_on_static_line() {
        let dir = TempDir::new().unwrap();
        let gpio = fake_gpio(dir.path());
        let pin = SysfsDigitalPin::new(&PIN, &gpio, PinLink::detached("P1_7"));
        let err = pin
            .time_pulse(Level::High, Duration::from_millis(20))
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn close_is_idempotent_and_tolerates_unused_pin() {
        let dir = TempDir::new().unwrap();
        let gpio = fake_gpio(dir.path());
        let pin = SysfsDigitalPin::new(&PIN, &gpio, PinLink::detached("P1_7"));
        pin.close().unwrap();
        pin.close().unwrap();
        assert_eq!(fs::read_to_string(gpio.join("unexport")).unwrap(), "");
        assert!(matches!(pin.read(), Err(Error::Closed(_))));
    }

    #[test]
    fn close_unexports_used_pin() {
        let dir = TempDir::new().unwrap();
        let gpio = fake_gpio(dir.path());
        let pin = SysfsDigitalPin::new(&PIN, &gpio, PinLink::detached("P1_7"));
        pin.read().unwrap();
        pin.close().unwrap();
        assert_eq!(fs::read_to_string(gpio.join("unexport")).unwrap(), "4");
    }

    #[test]
    fn pulls_are_not_implemented() {
        let dir = TempDir::new().unwrap();
        let pin = SysfsDigitalPin::new(&PIN, dir.path(), PinLink::detached("P1_7"));
        assert!(matches!(pin.pull_up(), Err(Error::NotImplemented(_))));
        assert!(matches!(pin.pull_down(), Err(Error::NotImplemented(_))));
    }
}
