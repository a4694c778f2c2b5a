//! Error taxonomy shared by every embd crate.
//!
//! Library callers see failures as [`Error`] values; the `embd` binary prints
//! the message and exits non-zero. The HAL never retries on its own.

use crate::config::ConfigError;
use crate::host::Host;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the HAL and its data model.
#[derive(Debug, Error)]
pub enum Error {
    /// Host detection failed, or the host has no registered describer.
    #[error("unsupported host: {0}")]
    UnsupportedHost(String),

    /// The host descriptor lacks the requested subsystem.
    #[error("{feature} not supported on {host}")]
    FeatureNotSupported {
        /// Subsystem name (`gpio`, `i2c`, `spi`, `led`).
        feature: &'static str,
        /// Host the request was made against.
        host: Host,
    },

    /// A pin factory is absent for the requested capability.
    #[error("{0} io not supported on this host")]
    IoNotSupported(&'static str),

    /// No pin (or LED) matches the key.
    #[error("no {kind} matching {key}")]
    NotFound {
        /// `pin` or `led`.
        kind: &'static str,
        /// The lookup key as rendered by the caller.
        key: String,
    },

    /// The pin is already open in a different mode.
    #[error("pin {pin} already initialized for {current} io, cannot open as {requested}")]
    CapabilityConflict {
        /// Pin identifier.
        pin: String,
        /// Mode the cached instance was opened with.
        current: &'static str,
        /// Mode requested by the caller.
        requested: &'static str,
    },

    /// File open/read/write failure against a kernel interface.
    #[error("{op} {}: {source}", path.display())]
    Io {
        /// Operation being attempted (`open`, `read`, `write`, ...).
        op: &'static str,
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// ioctl/epoll/fcntl failure.
    #[error("{op}: {errno}")]
    Sys {
        /// Syscall or ioctl name.
        op: &'static str,
        /// OS error number.
        errno: nix::errno::Errno,
    },

    /// Read or write moved fewer bytes than requested.
    #[error("{op}: short transfer ({actual} of {expected} bytes)")]
    ShortTransfer {
        /// Operation name.
        op: &'static str,
        /// Bytes requested.
        expected: usize,
        /// Bytes moved.
        actual: usize,
    },

    /// A bounded wait expired.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// Interrupt registration for a descriptor that is already watched.
    #[error("fd {0} already registered for interrupts")]
    AlreadyRegistered(i32),

    /// Operation has no implementation on this backend.
    #[error("{0} not implemented")]
    NotImplemented(&'static str),

    /// Argument outside its accepted range.
    #[error("{0}")]
    OutOfRange(String),

    /// Kernel release string could not be parsed.
    #[error("invalid kernel version: {0:?}")]
    InvalidKernelVersion(String),

    /// Kernel is older than the minimum the HAL supports.
    #[error("kernel version {found} is too old, need at least {required}")]
    KernelTooOld {
        /// Detected version.
        found: String,
        /// Minimum version.
        required: String,
    },

    /// A façade slot was initialized twice without a close in between.
    #[error("{0} already initialized")]
    AlreadyInitialized(&'static str),

    /// The pin or bus was closed and cannot be used again.
    #[error("{0} is closed")]
    Closed(String),

    /// Configuration loading or validation failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Build an [`Error::Io`] for `path`.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Build an [`Error::Sys`] for a failed syscall.
    pub fn sys(op: &'static str, errno: nix::errno::Errno) -> Self {
        Self::Sys { op, errno }
    }

    /// Lookup miss for a pin key.
    pub fn pin_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            kind: "pin",
            key: key.to_string(),
        }
    }

    /// Lookup miss for an LED key.
    pub fn led_not_found(key: impl ToString) -> Self {
        Self::NotFound {
            kind: "led",
            key: key.to_string(),
        }
    }

    /// OS error number carried by this error, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Io { source, .. } => source.raw_os_error(),
            Self::Sys { errno, .. } => Some(*errno as i32),
            _ => None,
        }
    }
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_not_supported_names_host() {
        let err = Error::FeatureNotSupported {
            feature: "spi",
            host: Host::Chip,
        };
        assert_eq!(err.to_string(), "spi not supported on CHIP");
    }

    #[test]
    fn pin_not_found_message() {
        assert_eq!(Error::pin_not_found(42).to_string(), "no pin matching 42");
        assert_eq!(
            Error::led_not_found("usr9").to_string(),
            "no led matching usr9"
        );
    }

    #[test]
    fn raw_os_error_from_io_and_sys() {
        let io = Error::io(
            "write",
            "/sys/class/gpio/export",
            std::io::Error::from_raw_os_error(ebusy()),
        );
        assert_eq!(io.raw_os_error(), Some(ebusy()));

        let sys = Error::sys("ioctl I2C_SLAVE", nix::errno::Errno::ENXIO);
        assert_eq!(sys.raw_os_error(), Some(nix::errno::Errno::ENXIO as i32));
        assert_eq!(Error::NotImplemented("pull up").raw_os_error(), None);
    }

    fn ebusy() -> i32 {
        nix::errno::Errno::EBUSY as i32
    }

    #[test]
    fn config_error_converts() {
        let err: Error = ConfigError::FileNotFound.into();
        assert!(matches!(err, Error::Config(ConfigError::FileNotFound)));
    }
}
