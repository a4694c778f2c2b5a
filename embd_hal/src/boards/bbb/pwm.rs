//! BeagleBone hardware PWM through the `bone_pwm_<pin>` overlays.
//!
//! Loading the overlay creates `/sys/devices/ocp.*/pwm_test_<pin>.*/` with
//! `period`, `duty` and `polarity` attributes. The directory shows up
//! asynchronously, so initialization polls for it.

use super::capemgr::CapeManager;
use crate::gpio::{PinLink, Polarity, PwmPin, PwmPinFactory};
use crate::sysfs::{Segment, rewrite, wait_for_path};
use embd_common::config::{PathsConfig, PwmConfig};
use embd_common::consts::{PWM_DEFAULT_PERIOD_NS, PWM_MAX_PERIOD_NS, SERVO_PERIOD_NS};
use embd_common::pin::PinDescriptor;
use embd_common::util::map;
use embd_common::{Error, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const PWM_OVERLAY: &str = "am33xx_pwm";

struct Attr {
    file: File,
    path: PathBuf,
}

impl Attr {
    fn open(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(name);
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| Error::io("open", &path, e))?;
        Ok(Self { file, path })
    }

    fn write(&mut self, value: impl ToString) -> Result<()> {
        rewrite(&mut self.file, &self.path, &value.to_string())
    }
}

struct PwmFiles {
    period: Attr,
    duty: Attr,
    polarity: Attr,
}

struct PwmState {
    /// `bone_pwm_<pin>` was requested from the cape manager.
    overlay_loaded: bool,
    files: Option<PwmFiles>,
    period: u64,
    duty: u64,
    polarity: Polarity,
    closed: bool,
}

/// PWM output on a BeagleBone header pin.
pub struct BbbPwmPin {
    id: &'static str,
    link: PinLink,
    capemgr: CapeManager,
    devices_dir: PathBuf,
    timing: PwmConfig,
    state: Mutex<PwmState>,
}

impl BbbPwmPin {
    /// Create an uninitialized pin; overlays load on first use.
    pub fn new(descriptor: &PinDescriptor, paths: &PathsConfig, timing: PwmConfig, link: PinLink) -> Self {
        Self {
            id: descriptor.id,
            link,
            capemgr: CapeManager::new(paths),
            devices_dir: paths.devices_dir(),
            timing,
            state: Mutex::new(PwmState {
                overlay_loaded: false,
                files: None,
                period: 0,
                duty: 0,
                polarity: Polarity::Normal,
                closed: false,
            }),
        }
    }

    /// Factory for [`GpioDriver`](crate::gpio::GpioDriver).
    pub fn factory(paths: &PathsConfig, timing: &PwmConfig) -> PwmPinFactory {
        let paths = paths.clone();
        let timing = timing.clone();
        Box::new(move |descriptor, link| {
            Ok(Arc::new(Self::new(descriptor, &paths, timing.clone(), link)) as Arc<dyn PwmPin>)
        })
    }

    fn overlay(&self) -> String {
        format!("bone_pwm_{}", self.id)
    }

    /// Load the overlays, wait for the attributes, open them and reset the
    /// output to polarity normal, duty 0, period 500 µs.
    fn init(&self, state: &mut PwmState) -> Result<()> {
        if state.closed {
            return Err(Error::Closed(format!("pin {}", self.id)));
        }
        if state.files.is_some() {
            return Ok(());
        }

        if !state.overlay_loaded {
            self.capemgr.ensure_enabled(PWM_OVERLAY)?;
            self.capemgr.ensure_enabled(&self.overlay())?;
            state.overlay_loaded = true;
        }

        let dir_prefix = format!("pwm_test_{}.", self.id);
        let period_path = wait_for_path(
            &self.devices_dir,
            &[
                Segment::Prefix("ocp."),
                Segment::Prefix(&dir_prefix),
                Segment::Exact("period"),
            ],
            self.timing.settle_timeout(),
            self.timing.poll_interval(),
        )?;
        let dir = period_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.devices_dir.clone());

        state.files = Some(PwmFiles {
            period: Attr::open(&dir, "period")?,
            duty: Attr::open(&dir, "duty")?,
            polarity: Attr::open(&dir, "polarity")?,
        });
        // A failed reset drops the files so the next call starts over.
        if let Err(e) = self.reset(state) {
            state.files = None;
            return Err(e);
        }
        debug!(pin = self.id, dir = %dir.display(), "pwm opened");
        Ok(())
    }

    fn reset(&self, state: &mut PwmState) -> Result<()> {
        Self::write_polarity(state, Polarity::Normal)?;
        Self::write_duty(state, 0)?;
        Self::write_period(state, PWM_DEFAULT_PERIOD_NS)
    }

    fn files(state: &mut PwmState) -> Result<&mut PwmFiles> {
        state
            .files
            .as_mut()
            .ok_or_else(|| Error::Closed("pwm attributes not open".into()))
    }

    fn write_period(state: &mut PwmState, ns: u64) -> Result<()> {
        if ns > PWM_MAX_PERIOD_NS {
            return Err(Error::OutOfRange(format!(
                "period {ns} ns exceeds {PWM_MAX_PERIOD_NS} ns"
            )));
        }
        if ns < state.duty {
            return Err(Error::OutOfRange(format!(
                "period {ns} ns is shorter than duty {} ns",
                state.duty
            )));
        }
        Self::files(state)?.period.write(ns)?;
        state.period = ns;
        Ok(())
    }

    fn write_duty(state: &mut PwmState, ns: u64) -> Result<()> {
        if ns > state.period {
            return Err(Error::OutOfRange(format!(
                "duty {ns} ns exceeds period {} ns",
                state.period
            )));
        }
        Self::files(state)?.duty.write(ns)?;
        state.duty = ns;
        Ok(())
    }

    fn write_polarity(state: &mut PwmState, polarity: Polarity) -> Result<()> {
        Self::files(state)?.polarity.write(polarity.as_str())?;
        state.polarity = polarity;
        Ok(())
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut PwmState) -> Result<R>) -> Result<R> {
        let mut state = self.state.lock();
        self.init(&mut state)?;
        f(&mut state)
    }
}

impl PwmPin for BbbPwmPin {
    fn id(&self) -> &str {
        self.id
    }

    fn set_period(&self, ns: u64) -> Result<()> {
        self.with_state(|state| Self::write_period(state, ns))
    }

    fn set_duty(&self, ns: u64) -> Result<()> {
        self.with_state(|state| Self::write_duty(state, ns))
    }

    fn set_polarity(&self, polarity: Polarity) -> Result<()> {
        self.with_state(|state| Self::write_polarity(state, polarity))
    }

    fn set_microseconds(&self, us: u64) -> Result<()> {
        self.with_state(|state| {
            if state.period != SERVO_PERIOD_NS {
                warn!(
                    pin = self.id,
                    period_ns = state.period,
                    "servo pulse on a pwm whose period is not 20 ms"
                );
            }
            let ns = us.checked_mul(1000).ok_or_else(|| {
                Error::OutOfRange(format!("pulse of {us} µs"))
            })?;
            Self::write_duty(state, ns)
        })
    }

    fn analog_write(&self, value: u8) -> Result<()> {
        self.with_state(|state| {
            let period = i64::try_from(state.period)
                .map_err(|_| Error::OutOfRange(format!("period {} ns", state.period)))?;
            let duty = map(i64::from(value), 0, 255, 0, period);
            Self::write_duty(state, duty.unsigned_abs())
        })
    }

    fn period(&self) -> u64 {
        self.state.lock().period
    }

    fn duty(&self) -> u64 {
        self.state.lock().duty
    }

    fn polarity(&self) -> Polarity {
        self.state.lock().polarity
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        self.link.unregister();

        let mut first = None;
        if state.files.is_some() {
            first = self.reset(&mut state).err();
            state.files = None;
        }
        if std::mem::take(&mut state.overlay_loaded) {
            if let Err(e) = self.capemgr.remove(&self.overlay()) {
                first.get_or_insert(e);
            }
        }
        debug!(pin = self.id, "pwm closed");
        first.map_or(Ok(()), Err)
    }
}
