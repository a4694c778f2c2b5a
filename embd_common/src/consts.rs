//! Kernel interface paths, ioctl numbers and defaults.
//!
//! Single source of truth for every literal the backends hand to the kernel.

// ─── Filesystem Roots ───────────────────────────────────────────────

/// sysfs mount point.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

/// Device node directory.
pub const DEFAULT_DEV_ROOT: &str = "/dev";

/// Board revision source.
pub const DEFAULT_CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/embd/embd.toml";

// ─── I²C ────────────────────────────────────────────────────────────

/// `I2C_SLAVE`: set the slave address for plain read/write.
pub const I2C_SLAVE: u32 = 0x0703;

/// `I2C_RDWR`: combined transfer of several messages.
pub const I2C_RDWR: u32 = 0x0707;

/// `i2c_msg.flags` bit for a read message.
pub const I2C_M_RD: u16 = 0x0001;

// ─── SPI ────────────────────────────────────────────────────────────

/// `SPI_IOC_WR_MODE`.
pub const SPI_IOC_WR_MODE: u32 = 0x4001_6B01;

/// `SPI_IOC_WR_BITS_PER_WORD`.
pub const SPI_IOC_WR_BITS_PER_WORD: u32 = 0x4001_6B03;

/// `SPI_IOC_WR_MAX_SPEED_HZ`.
pub const SPI_IOC_WR_MAX_SPEED_HZ: u32 = 0x4004_6B04;

/// `SPI_IOC_MESSAGE(n)`: full-duplex transfer of `n` descriptors (32 bytes each).
pub const fn spi_ioc_message(n: u32) -> u32 {
    0x4000_6B00 + n * 0x0020_0000
}

/// Default SPI clock (1 MHz).
pub const DEFAULT_SPI_SPEED_HZ: u32 = 1_000_000;

/// Default SPI word size.
pub const DEFAULT_SPI_BITS_PER_WORD: u8 = 8;

/// Default inter-word delay.
pub const DEFAULT_SPI_DELAY_US: u16 = 0;

// ─── BeagleBone PWM ─────────────────────────────────────────────────

/// Largest accepted PWM period (1 s).
pub const PWM_MAX_PERIOD_NS: u64 = 1_000_000_000;

/// Period applied on init and close (2 kHz).
pub const PWM_DEFAULT_PERIOD_NS: u64 = 500_000;

/// Period hobby servos expect (20 ms).
pub const SERVO_PERIOD_NS: u64 = 20_000_000;

/// Default wait for the PWM `period` file after enabling the overlay.
pub const DEFAULT_PWM_SETTLE_TIMEOUT_MS: u64 = 500;

/// Default poll interval during that wait.
pub const DEFAULT_PWM_POLL_INTERVAL_MS: u64 = 10;

// ─── Interrupts ─────────────────────────────────────────────────────

/// Events drained per `epoll_wait` call.
pub const EPOLL_MAX_EVENTS: usize = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spi_message_ioctl_matches_kernel_encoding() {
        assert_eq!(spi_ioc_message(1), 0x4020_6B00);
        assert_eq!(spi_ioc_message(2), 0x4040_6B00);
    }

    #[test]
    fn pwm_defaults_are_in_range() {
        assert!(PWM_DEFAULT_PERIOD_NS <= PWM_MAX_PERIOD_NS);
        assert!(SERVO_PERIOD_NS <= PWM_MAX_PERIOD_NS);
        assert!(DEFAULT_PWM_POLL_INTERVAL_MS <= DEFAULT_PWM_SETTLE_TIMEOUT_MS);
    }
}
