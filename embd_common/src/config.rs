//! Configuration loading traits and types.
//!
//! Every value has a default, so an empty file (or no file at all) yields a
//! HAL that talks to the real kernel interfaces under `/sys`, `/dev` and
//! `/proc`. Pointing [`PathsConfig`] at a scratch directory lets the whole
//! stack run against a fake tree.
//!
//! # TOML Example
//!
//! ```toml
//! log_level = "debug"
//!
//! [host]
//! tag = "bbb"
//!
//! [paths]
//! sysfs = "/sys"
//!
//! [spi]
//! speed_hz = 500000
//! ```

use crate::consts::{
    DEFAULT_CPUINFO_PATH, DEFAULT_DEV_ROOT, DEFAULT_PWM_POLL_INTERVAL_MS,
    DEFAULT_PWM_SETTLE_TIMEOUT_MS, DEFAULT_SPI_BITS_PER_WORD, DEFAULT_SPI_DELAY_US,
    DEFAULT_SPI_SPEED_HZ, DEFAULT_SYSFS_ROOT,
};
use crate::host::Host;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Host detection override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Skip `uname` and use this tag.
    pub tag: Option<Host>,
    /// Skip `/proc/cpuinfo` and use this revision.
    pub revision: Option<u32>,
}

/// Filesystem roots the backends derive their paths from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// sysfs mount point.
    pub sysfs: PathBuf,
    /// Device node directory.
    pub dev: PathBuf,
    /// cpuinfo file used for board revision detection.
    pub cpuinfo: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sysfs: PathBuf::from(DEFAULT_SYSFS_ROOT),
            dev: PathBuf::from(DEFAULT_DEV_ROOT),
            cpuinfo: PathBuf::from(DEFAULT_CPUINFO_PATH),
        }
    }
}

impl PathsConfig {
    /// All three roots under `root` (`root/sys`, `root/dev`, `root/proc/cpuinfo`).
    pub fn under(root: &Path) -> Self {
        Self {
            sysfs: root.join("sys"),
            dev: root.join("dev"),
            cpuinfo: root.join("proc").join("cpuinfo"),
        }
    }

    /// `/sys/class/gpio`.
    pub fn gpio_dir(&self) -> PathBuf {
        self.sysfs.join("class").join("gpio")
    }

    /// `/sys/class/leds`.
    pub fn leds_dir(&self) -> PathBuf {
        self.sysfs.join("class").join("leds")
    }

    /// `/sys/devices`.
    pub fn devices_dir(&self) -> PathBuf {
        self.sysfs.join("devices")
    }

    /// `/dev/i2c-<bus>`.
    pub fn i2c_device(&self, bus: u8) -> PathBuf {
        self.dev.join(format!("i2c-{bus}"))
    }

    /// `/dev/spidev<minor>.<channel>`.
    pub fn spi_device(&self, minor: u8, channel: u8) -> PathBuf {
        self.dev.join(format!("spidev{minor}.{channel}"))
    }
}

/// I²C tuning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct I2cConfig {
    /// Per-byte delay for multi-byte writes. `0` issues one kernel write.
    pub write_delay_ms: u64,
}

impl I2cConfig {
    /// Per-byte delay, `None` when disabled.
    pub fn write_delay(&self) -> Option<Duration> {
        (self.write_delay_ms > 0).then(|| Duration::from_millis(self.write_delay_ms))
    }
}

/// SPI bus defaults applied when a caller passes `0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpiConfig {
    /// Clock speed in Hz.
    pub speed_hz: u32,
    /// Bits per word.
    pub bits_per_word: u8,
    /// Inter-word delay in µs.
    pub delay_us: u16,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            speed_hz: DEFAULT_SPI_SPEED_HZ,
            bits_per_word: DEFAULT_SPI_BITS_PER_WORD,
            delay_us: DEFAULT_SPI_DELAY_US,
        }
    }
}

/// BeagleBone PWM overlay timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PwmConfig {
    /// How long to wait for the `period` file after enabling the overlay.
    pub settle_timeout_ms: u64,
    /// Poll interval while waiting.
    pub poll_interval_ms: u64,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            settle_timeout_ms: DEFAULT_PWM_SETTLE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_PWM_POLL_INTERVAL_MS,
        }
    }
}

impl PwmConfig {
    /// Settle timeout as a `Duration`.
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Complete HAL configuration (`/etc/embd/embd.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HalConfig {
    /// Logging verbosity level.
    pub log_level: LogLevel,
    /// Host detection override.
    pub host: HostConfig,
    /// Filesystem roots.
    pub paths: PathsConfig,
    /// I²C tuning.
    pub i2c: I2cConfig,
    /// SPI defaults.
    pub spi: SpiConfig,
    /// BeagleBone PWM timing.
    pub pwm: PwmConfig,
}

impl HalConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `spi.speed_hz` or `spi.bits_per_word` is zero
    /// - `pwm.poll_interval_ms` is zero or exceeds `pwm.settle_timeout_ms`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spi.speed_hz == 0 {
            return Err(ConfigError::ValidationError(
                "spi.speed_hz cannot be zero".to_string(),
            ));
        }
        if self.spi.bits_per_word == 0 {
            return Err(ConfigError::ValidationError(
                "spi.bits_per_word cannot be zero".to_string(),
            ));
        }
        if self.pwm.poll_interval_ms == 0 || self.pwm.poll_interval_ms > self.pwm.settle_timeout_ms
        {
            return Err(ConfigError::ValidationError(format!(
                "pwm.poll_interval_ms must be in 1..={}",
                self.pwm.settle_timeout_ms
            )));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
            assert_eq!(level.as_directive(), text);
        }
    }

    #[test]
    fn test_defaults_point_at_real_kernel_interfaces() {
        let config = HalConfig::default();
        assert_eq!(config.paths.gpio_dir(), PathBuf::from("/sys/class/gpio"));
        assert_eq!(config.paths.leds_dir(), PathBuf::from("/sys/class/leds"));
        assert_eq!(config.paths.i2c_device(1), PathBuf::from("/dev/i2c-1"));
        assert_eq!(config.paths.spi_device(0, 1), PathBuf::from("/dev/spidev0.1"));
        assert_eq!(config.spi.speed_hz, 1_000_000);
        assert_eq!(config.spi.bits_per_word, 8);
        assert_eq!(config.pwm.settle_timeout(), Duration::from_millis(500));
        assert_eq!(config.pwm.poll_interval(), Duration::from_millis(10));
        assert!(config.i2c.write_delay().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_spi_speed() {
        let mut config = HalConfig::default();
        config.spi.speed_hz = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_rejects_poll_longer_than_timeout() {
        let mut config = HalConfig::default();
        config.pwm.poll_interval_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = HalConfig::load(Path::new("/nonexistent/path/embd.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = HalConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_loader_rejects_unknown_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[spi]\nspeed = 10").unwrap();

        let result = HalConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_config_loader_success() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"log_level = "debug"

[host]
tag = "bbb"
revision = 2

[paths]
sysfs = "/tmp/fake/sys"

[i2c]
write_delay_ms = 20

[spi]
speed_hz = 500000
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = HalConfig::load(file.path()).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.host.tag, Some(Host::Bbb));
        assert_eq!(config.host.revision, Some(2));
        assert_eq!(config.paths.sysfs, PathBuf::from("/tmp/fake/sys"));
        assert_eq!(config.paths.dev, PathBuf::from("/dev"));
        assert_eq!(config.i2c.write_delay(), Some(Duration::from_millis(20)));
        assert_eq!(config.spi.speed_hz, 500_000);
        assert_eq!(config.spi.bits_per_word, 8);
    }
}
