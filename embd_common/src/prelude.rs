//! Prelude module for common re-exports.
//!
//! ```rust
//! use embd_common::prelude::*;
//! ```

// ─── Data Model ─────────────────────────────────────────────────────
pub use crate::host::{Host, KernelVersion};
pub use crate::led::{LedDescriptor, LedMap};
pub use crate::pin::{Capability, PinDescriptor, PinMap};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{Error, Result};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, HalConfig, LogLevel, PathsConfig};

// ─── Helpers ────────────────────────────────────────────────────────
pub use crate::util::map;
