//! Digital, analog and PWM pins plus the generic GPIO driver.
//!
//! The [`GpioDriver`] owns a board's [`PinMap`] and one factory per pin kind.
//! It resolves keys to descriptors and hands out cached pins: asking twice
//! for the same pin yields the same `Arc`, and a pin that is already open in
//! one mode cannot be reopened in another.

pub mod sysfs;

use crate::cache::{Cache, DriverLink};
use embd_common::pin::{Capability, PinDescriptor, PinMap};
use embd_common::{Error, Result};
use std::fmt;
use std::ops::Not;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

// ─── Pin Values ─────────────────────────────────────────────────────

/// Logic level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Logic 0.
    Low,
    /// Logic 1.
    High,
}

impl Level {
    /// Character written to / read from a sysfs `value` file.
    pub fn as_char(self) -> char {
        match self {
            Level::Low => '0',
            Level::High => '1',
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level == Level::High
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Data direction of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input.
    In,
    /// Output.
    Out,
}

impl Direction {
    /// sysfs spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Which transitions raise an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// No interrupts.
    None,
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
    /// Both transitions.
    Both,
}

impl Edge {
    /// sysfs spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Edge::None => "none",
            Edge::Rising => "rising",
            Edge::Falling => "falling",
            Edge::Both => "both",
        }
    }
}

impl std::str::FromStr for Edge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Edge::None),
            "rising" => Ok(Edge::Rising),
            "falling" => Ok(Edge::Falling),
            "both" => Ok(Edge::Both),
            other => Err(Error::OutOfRange(format!("unknown edge {other:?}"))),
        }
    }
}

/// PWM output polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Duty cycle is the high time.
    #[default]
    Normal,
    /// Duty cycle is the low time.
    Inverse,
}

impl Polarity {
    /// sysfs spelling (`0` / `1`).
    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Normal => "0",
            Polarity::Inverse => "1",
        }
    }
}

// ─── Pin Traits ─────────────────────────────────────────────────────

/// Handler passed to [`DigitalPin::watch`]; receives the pin that fired.
pub type EdgeHandler = Box<dyn Fn(&dyn DigitalPin) + Send + Sync>;

/// A GPIO line driven through the kernel.
///
/// Instances are shared (`Arc`) and internally synchronized.
pub trait DigitalPin: Send + Sync {
    /// Canonical pin id (`P1_12`).
    fn id(&self) -> &str;

    /// Kernel GPIO number.
    fn n(&self) -> u32;

    /// Drive the output.
    fn write(&self, level: Level) -> Result<()>;

    /// Sample the input.
    fn read(&self) -> Result<Level>;

    /// Switch direction.
    fn set_direction(&self, direction: Direction) -> Result<()>;

    /// Invert the logic sense of reads and writes.
    fn active_low(&self, enabled: bool) -> Result<()>;

    /// Enable the internal pull-up.
    fn pull_up(&self) -> Result<()>;

    /// Enable the internal pull-down.
    fn pull_down(&self) -> Result<()>;

    /// Measure the length of the next pulse at `level`.
    ///
    /// Waits for any pulse already in progress to finish, then for the line to
    /// reach `level`, and returns how long it stayed there. Busy-polls; the
    /// whole measurement is bounded by `timeout`.
    fn time_pulse(&self, level: Level, timeout: Duration) -> Result<Duration>;

    /// Call `handler` on every `edge` transition.
    fn watch(&self, edge: Edge, handler: EdgeHandler) -> Result<()>;

    /// Cancel a previous [`watch`](Self::watch).
    fn stop_watching(&self) -> Result<()>;

    /// Release the line and drop out of the driver cache. Idempotent.
    fn close(&self) -> Result<()>;
}

/// An ADC input.
pub trait AnalogPin: Send + Sync {
    /// Canonical pin id.
    fn id(&self) -> &str;

    /// ADC channel.
    fn n(&self) -> u32;

    /// Sample the channel.
    fn analog_read(&self) -> Result<i32>;

    /// Release the channel. Idempotent.
    fn close(&self) -> Result<()>;
}

/// A hardware PWM output. Times are in nanoseconds.
pub trait PwmPin: Send + Sync {
    /// Canonical pin id.
    fn id(&self) -> &str;

    /// Set the period.
    fn set_period(&self, ns: u64) -> Result<()>;

    /// Set the duty cycle; must not exceed the period.
    fn set_duty(&self, ns: u64) -> Result<()>;

    /// Set the output polarity.
    fn set_polarity(&self, polarity: Polarity) -> Result<()>;

    /// Set the duty cycle in microseconds (servo style).
    fn set_microseconds(&self, us: u64) -> Result<()>;

    /// Scale `value` (0..=255) onto the current period and set that duty.
    fn analog_write(&self, value: u8) -> Result<()>;

    /// Current period.
    fn period(&self) -> u64;

    /// Current duty cycle.
    fn duty(&self) -> u64;

    /// Current polarity.
    fn polarity(&self) -> Polarity;

    /// Reset the output and release it. Idempotent.
    fn close(&self) -> Result<()>;
}

// ─── GPIO Driver ────────────────────────────────────────────────────

/// Handle a pin keeps to remove itself from its driver's cache.
pub type PinLink = DriverLink<&'static str>;

/// Builds a digital pin for a descriptor.
pub type DigitalPinFactory =
    Box<dyn Fn(&'static PinDescriptor, PinLink) -> Result<Arc<dyn DigitalPin>> + Send + Sync>;

/// Builds an analog pin for a descriptor.
pub type AnalogPinFactory =
    Box<dyn Fn(&'static PinDescriptor, PinLink) -> Result<Arc<dyn AnalogPin>> + Send + Sync>;

/// Builds a PWM pin for a descriptor.
pub type PwmPinFactory =
    Box<dyn Fn(&'static PinDescriptor, PinLink) -> Result<Arc<dyn PwmPin>> + Send + Sync>;

#[derive(Clone)]
enum OpenPin {
    Digital(Arc<dyn DigitalPin>),
    Analog(Arc<dyn AnalogPin>),
    Pwm(Arc<dyn PwmPin>),
}

impl OpenPin {
    fn mode(&self) -> &'static str {
        match self {
            OpenPin::Digital(_) => "digital",
            OpenPin::Analog(_) => "analog",
            OpenPin::Pwm(_) => "pwm",
        }
    }

    fn close(&self) -> Result<()> {
        match self {
            OpenPin::Digital(pin) => pin.close(),
            OpenPin::Analog(pin) => pin.close(),
            OpenPin::Pwm(pin) => pin.close(),
        }
    }
}

/// Generic GPIO driver: pin map, per-kind factories and the live-pin cache.
pub struct GpioDriver {
    pin_map: PinMap,
    digital: Option<DigitalPinFactory>,
    analog: Option<AnalogPinFactory>,
    pwm: Option<PwmPinFactory>,
    pins: Cache<&'static str, OpenPin>,
}

impl GpioDriver {
    /// Create a driver over `pin_map`. A `None` factory makes that pin kind
    /// unavailable ([`Error::IoNotSupported`]).
    pub fn new(
        pin_map: PinMap,
        digital: Option<DigitalPinFactory>,
        analog: Option<AnalogPinFactory>,
        pwm: Option<PwmPinFactory>,
    ) -> Self {
        Self {
            pin_map,
            digital,
            analog,
            pwm,
            pins: Cache::new(),
        }
    }

    /// The board's pin map.
    pub fn pin_map(&self) -> &PinMap {
        &self.pin_map
    }

    fn open<K, T: ?Sized>(
        &self,
        key: K,
        cap: Capability,
        mode: &'static str,
        factory: Option<&(dyn Fn(&'static PinDescriptor, PinLink) -> Result<Arc<T>> + Send + Sync)>,
        wrap: fn(Arc<T>) -> OpenPin,
        unwrap: fn(&OpenPin) -> Option<Arc<T>>,
    ) -> Result<Arc<T>>
    where
        K: fmt::Display,
    {
        let factory = factory.ok_or(Error::IoNotSupported(mode))?;
        let descriptor = self
            .pin_map
            .lookup(&key, Some(cap))
            .ok_or_else(|| Error::pin_not_found(&key))?;

        self.pins.acquire(
            descriptor.id,
            |open| {
                unwrap(open).ok_or_else(|| Error::CapabilityConflict {
                    pin: descriptor.id.to_string(),
                    current: open.mode(),
                    requested: mode,
                })
            },
            |link| {
                let pin = factory(descriptor, link)?;
                debug!(pin = descriptor.id, mode, "pin opened");
                Ok((wrap(Arc::clone(&pin)), pin))
            },
        )
    }

    /// Digital pin for `key`, opened on first use.
    ///
    /// # Errors
    ///
    /// [`Error::IoNotSupported`] without a digital factory,
    /// [`Error::NotFound`] when no digital-capable pin matches,
    /// [`Error::CapabilityConflict`] when the pin is open in another mode.
    pub fn digital_pin<K: fmt::Display>(&self, key: K) -> Result<Arc<dyn DigitalPin>> {
        self.open(
            key,
            Capability::DIGITAL,
            "digital",
            self.digital.as_deref(),
            OpenPin::Digital,
            |open| match open {
                OpenPin::Digital(pin) => Some(Arc::clone(pin)),
                _ => None,
            },
        )
    }

    /// Analog pin for `key`, opened on first use.
    pub fn analog_pin<K: fmt::Display>(&self, key: K) -> Result<Arc<dyn AnalogPin>> {
        self.open(
            key,
            Capability::ANALOG,
            "analog",
            self.analog.as_deref(),
            OpenPin::Analog,
            |open| match open {
                OpenPin::Analog(pin) => Some(Arc::clone(pin)),
                _ => None,
            },
        )
    }

    /// PWM pin for `key`, opened on first use.
    pub fn pwm_pin<K: fmt::Display>(&self, key: K) -> Result<Arc<dyn PwmPin>> {
        self.open(
            key,
            Capability::PWM,
            "pwm",
            self.pwm.as_deref(),
            OpenPin::Pwm,
            |open| match open {
                OpenPin::Pwm(pin) => Some(Arc::clone(pin)),
                _ => None,
            },
        )
    }

    /// Forget the cached instance for pin `id` without closing it.
    pub fn unregister(&self, id: &str) {
        if let Some(descriptor) = self.pin_map.iter().find(|pin| pin.id == id) {
            self.pins.remove(&descriptor.id);
        }
    }

    /// Number of open pins.
    pub fn open_pins(&self) -> usize {
        self.pins.len()
    }

    /// Close every open pin. All pins are attempted; the first failure is
    /// returned.
    pub fn close(&self) -> Result<()> {
        let mut first = None;
        for pin in self.pins.drain() {
            if let Err(e) = pin.close() {
                warn!(mode = pin.mode(), error = %e, "pin close failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}
