//! embd Common Library
//!
//! Board-independent building blocks of the embd hardware abstraction layer.
//!
//! # Module Structure
//!
//! - [`pin`] - Capability bits, pin descriptors and pin-map lookup
//! - [`led`] - On-board LED map
//! - [`host`] - Host tags, kernel version gate, board revision parsing
//! - [`error`] - Error taxonomy and `Result` alias
//! - [`config`] - Configuration types and TOML loader
//! - [`consts`] - Kernel paths, ioctl numbers, defaults
//! - [`util`] - Numeric helpers
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use embd_common::prelude::*;
//!
//! static PINS: &[PinDescriptor] = &[PinDescriptor {
//!     id: "P1_12",
//!     aliases: &["18", "GPIO_18", "PWM0"],
//!     caps: Capability::DIGITAL,
//!     digital_logical: 18,
//!     analog_logical: 0,
//! }];
//!
//! let map = PinMap::new(PINS);
//! assert_eq!(map.lookup(18, Some(Capability::DIGITAL)).unwrap().id, "P1_12");
//! ```

pub mod config;
pub mod consts;
pub mod error;
pub mod host;
pub mod led;
pub mod pin;
pub mod prelude;
pub mod util;

pub use error::{Error, Result};
