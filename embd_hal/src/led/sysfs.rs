//! LEDs through `/sys/class/leds/<name>/brightness`.

use super::{Led, LedFactory, LedLink};
use crate::sysfs::{reread, rewrite};
use embd_common::config::PathsConfig;
use embd_common::{Error, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct LedState {
    brightness: Option<File>,
    closed: bool,
}

/// sysfs-backed [`Led`]. The brightness file is opened on first use.
pub struct SysfsLed {
    id: &'static str,
    path: PathBuf,
    link: LedLink,
    state: Mutex<LedState>,
}

impl SysfsLed {
    /// LED `id` under `leds_dir` (normally `/sys/class/leds`).
    pub fn new(id: &'static str, leds_dir: impl Into<PathBuf>, link: LedLink) -> Self {
        Self {
            id,
            path: leds_dir.into().join(id).join("brightness"),
            link,
            state: Mutex::new(LedState::default()),
        }
    }

    /// Factory for [`LedDriver`](super::LedDriver) rooted at `paths`.
    pub fn factory(paths: &PathsConfig) -> LedFactory {
        let leds_dir = paths.leds_dir();
        Box::new(move |id, link| Ok(Arc::new(Self::new(id, leds_dir.clone(), link)) as Arc<dyn Led>))
    }

    fn with_file<R>(&self, f: impl FnOnce(&mut File) -> Result<R>) -> Result<R> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed(format!("led {}", self.id)));
        }
        if state.brightness.is_none() {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(&self.path)
                .map_err(|e| Error::io("open", &self.path, e))?;
            debug!(led = self.id, "led opened");
            state.brightness = Some(file);
        }
        match state.brightness.as_mut() {
            Some(file) => f(file),
            None => Err(Error::Closed(format!("led {}", self.id))),
        }
    }

    fn set(&self, on: bool) -> Result<()> {
        self.with_file(|file| rewrite(file, &self.path, if on { "1" } else { "0" }))
    }
}

impl Led for SysfsLed {
    fn id(&self) -> &str {
        self.id
    }

    fn on(&self) -> Result<()> {
        self.set(true)
    }

    fn off(&self) -> Result<()> {
        self.set(false)
    }

    fn toggle(&self) -> Result<()> {
        let on = self.is_on()?;
        self.set(!on)
    }

    fn is_on(&self) -> Result<bool> {
        let raw = self.with_file(|file| reread(file, &self.path))?;
        let brightness = raw.trim().parse::<u32>().map_err(|_| {
            Error::io(
                "parse",
                &self.path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, format!("brightness {raw:?}")),
            )
        })?;
        Ok(brightness != 0)
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.brightness = None;
        self.link.unregister();
        Ok(())
    }
}
