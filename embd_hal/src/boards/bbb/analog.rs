//! BeagleBone ADC inputs through the `cape-bone-iio` helper.

use super::capemgr::CapeManager;
use crate::gpio::{AnalogPin, AnalogPinFactory, PinLink};
use crate::sysfs::{Segment, find_path, render_pattern, reread};
use embd_common::config::PathsConfig;
use embd_common::pin::PinDescriptor;
use embd_common::{Error, Result};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

const IIO_OVERLAY: &str = "cape-bone-iio";

#[derive(Default)]
struct AnalogState {
    file: Option<(File, PathBuf)>,
    closed: bool,
}

/// ADC channel `AIN<n>`, read from
/// `/sys/devices/ocp.*/helper.*/AIN<n>`.
pub struct BbbAnalogPin {
    id: &'static str,
    n: u32,
    link: PinLink,
    capemgr: CapeManager,
    devices_dir: PathBuf,
    state: Mutex<AnalogState>,
}

impl BbbAnalogPin {
    /// Create an uninitialized pin; the overlay is loaded on first read.
    pub fn new(descriptor: &PinDescriptor, paths: &PathsConfig, link: PinLink) -> Self {
        Self {
            id: descriptor.id,
            n: descriptor.analog_logical,
            link,
            capemgr: CapeManager::new(paths),
            devices_dir: paths.devices_dir(),
            state: Mutex::new(AnalogState::default()),
        }
    }

    /// Factory for [`GpioDriver`](crate::gpio::GpioDriver).
    pub fn factory(paths: &PathsConfig) -> AnalogPinFactory {
        let paths = paths.clone();
        Box::new(move |descriptor, link| {
            Ok(Arc::new(Self::new(descriptor, &paths, link)) as Arc<dyn AnalogPin>)
        })
    }

    fn open(&self) -> Result<(File, PathBuf)> {
        self.capemgr.ensure_enabled(IIO_OVERLAY)?;
        let channel = format!("AIN{}", self.n);
        let pattern = [
            Segment::Prefix("ocp."),
            Segment::Prefix("helper."),
            Segment::Exact(&channel),
        ];
        let path = find_path(&self.devices_dir, &pattern)?.ok_or_else(|| {
            Error::io(
                "find",
                render_pattern(&self.devices_dir, &pattern),
                io::Error::from(ErrorKind::NotFound),
            )
        })?;
        let file = File::open(&path).map_err(|e| Error::io("open", &path, e))?;
        debug!(pin = self.id, channel = %channel, "adc channel opened");
        Ok((file, path))
    }
}

impl AnalogPin for BbbAnalogPin {
    fn id(&self) -> &str {
        self.id
    }

    fn n(&self) -> u32 {
        self.n
    }

    fn analog_read(&self) -> Result<i32> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed(format!("pin {}", self.id)));
        }
        if state.file.is_none() {
            state.file = Some(self.open()?);
        }
        let Some((file, path)) = state.file.as_mut() else {
            return Err(Error::Closed(format!("pin {}", self.id)));
        };
        let raw = reread(file, path)?;
        raw.trim().parse::<i32>().map_err(|_| {
            Error::io(
                "parse",
                path.as_path(),
                io::Error::new(ErrorKind::InvalidData, format!("adc value {raw:?}")),
            )
        })
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.file = None;
        self.link.unregister();
        Ok(())
    }
}
