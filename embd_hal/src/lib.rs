//! # embd HAL
//!
//! Linux hardware abstraction for single-board computers: GPIO (digital,
//! analog, PWM) through sysfs, I²C and SPI through the `i2c-dev` and `spidev`
//! ioctls, on-board LEDs, and BeagleBone overlays through the cape manager.
//!
//! ## Architecture
//!
//! - [`boards`] describe each supported host (pin map, LED map, driver
//!   factories) and register with a [`HostRegistry`].
//! - [`Hal`] holds one host's [`Descriptor`] and creates the generic drivers
//!   ([`GpioDriver`](gpio::GpioDriver), [`I2cDriver`](i2c::I2cDriver),
//!   [`SpiDriver`](spi::SpiDriver), [`LedDriver`](led::LedDriver)) on demand.
//! - Drivers cache what they hand out: every key that names the same pin
//!   yields the same `Arc`, until the pin is closed.
//! - [`interrupt`] runs a single epoll thread that dispatches GPIO edges.
//! - [`facade`] offers free functions over a process-wide [`Hal`].
//!
//! ```no_run
//! use embd_hal::facade;
//! use embd_hal::gpio::{Direction, Level};
//!
//! # fn main() -> embd_common::Result<()> {
//! facade::set_direction(10, Direction::Out)?;
//! facade::digital_write(10, Level::High)?;
//! facade::close()?;
//! # Ok(())
//! # }
//! ```

pub mod boards;
pub mod cache;
pub mod context;
pub mod descriptor;
pub mod detect;
pub mod facade;
pub mod gpio;
pub mod host_registry;
pub mod i2c;
pub mod interrupt;
pub mod led;
pub mod spi;
pub mod sysfs;

pub use context::Hal;
pub use descriptor::Descriptor;
pub use host_registry::HostRegistry;
