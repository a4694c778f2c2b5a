//! Host tags, kernel version gate and board revision parsing.
//!
//! Detection itself (calling `uname(2)` and reading `/proc/cpuinfo`) lives in
//! `embd_hal::detect`; this module holds the pure parsing so it can be tested
//! without a board.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported single-board computer families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Host {
    /// Raspberry Pi (all revisions).
    Rpi,
    /// BeagleBone Black.
    Bbb,
    /// Next Thing Co. C.H.I.P.
    Chip,
    /// Intel Galileo (tag only, no board definition).
    Galileo,
    /// Cubietruck (tag only, no board definition).
    Cubietruck,
    /// Radxa Rock (tag only, no board definition).
    Radxa,
}

impl Host {
    /// Every tag, in declaration order.
    pub const ALL: [Host; 6] = [
        Host::Rpi,
        Host::Bbb,
        Host::Chip,
        Host::Galileo,
        Host::Cubietruck,
        Host::Radxa,
    ];

    /// Map a kernel node name (`uname -n`) to a host tag.
    pub fn from_node_name(node: &str) -> Option<Host> {
        match node.trim() {
            "raspberrypi" => Some(Host::Rpi),
            "beaglebone" => Some(Host::Bbb),
            "chip" => Some(Host::Chip),
            _ => None,
        }
    }

    /// Lowercase tag used in configuration files.
    pub fn tag(self) -> &'static str {
        match self {
            Host::Rpi => "rpi",
            Host::Bbb => "bbb",
            Host::Chip => "chip",
            Host::Galileo => "galileo",
            Host::Cubietruck => "cubietruck",
            Host::Radxa => "radxa",
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Host::Rpi => "RPi",
            Host::Bbb => "BBB",
            Host::Chip => "CHIP",
            Host::Galileo => "Galileo",
            Host::Cubietruck => "CubieTruck",
            Host::Radxa => "Radxa",
        };
        f.write_str(name)
    }
}

impl FromStr for Host {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Host::ALL
            .into_iter()
            .find(|host| host.tag() == wanted)
            .ok_or_else(|| Error::UnsupportedHost(s.to_string()))
    }
}

// ─── Kernel Version ─────────────────────────────────────────────────

/// Oldest kernel the sysfs/ioctl backends are known to work with.
pub const MIN_KERNEL_VERSION: KernelVersion = KernelVersion::new(3, 8, 0);

/// `major.minor.patch` triple parsed from a kernel release string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KernelVersion {
    /// Major number.
    pub major: u32,
    /// Minor number.
    pub minor: u32,
    /// Patch level (0 when absent).
    pub patch: u32,
}

impl KernelVersion {
    /// Construct from components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `major.minor[.patch][+|-suffix]`, e.g. `3.8.10+` or `4.19.66-v7+`.
    pub fn parse(release: &str) -> Result<Self> {
        let invalid = || Error::InvalidKernelVersion(release.to_string());

        let release = release.trim();
        let numeric = release
            .split(['+', '-'])
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(invalid)?;

        let parts = numeric
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;

        match parts.as_slice() {
            [major, minor] => Ok(Self::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Self::new(*major, *minor, *patch)),
            _ => Err(invalid()),
        }
    }

    /// Reject kernels older than [`MIN_KERNEL_VERSION`].
    pub fn ensure_supported(&self) -> Result<()> {
        if *self < MIN_KERNEL_VERSION {
            return Err(Error::KernelTooOld {
                found: self.to_string(),
                required: MIN_KERNEL_VERSION.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for KernelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for KernelVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ─── Board Revision ─────────────────────────────────────────────────

/// Extract the hexadecimal `Revision` field from `/proc/cpuinfo` contents.
///
/// Over-volted Raspberry Pis report a `1000` prefix (e.g. `1000000e`); the
/// warranty bit is masked off so the value still selects the right pin map.
pub fn parse_cpuinfo_revision(cpuinfo: &str) -> Option<u32> {
    let value = cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "Revision").then(|| value.trim())
    })?;
    let revision = u32::from_str_radix(value, 16).ok()?;
    Some(revision & !0x1000_0000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_suffixed_versions() {
        assert_eq!(KernelVersion::parse("3.8.2").unwrap(), KernelVersion::new(3, 8, 2));
        assert_eq!(
            KernelVersion::parse("3.8.10+").unwrap(),
            KernelVersion::new(3, 8, 10)
        );
        assert_eq!(
            KernelVersion::parse("4.19.66-v7+").unwrap(),
            KernelVersion::new(4, 19, 66)
        );
        assert_eq!(KernelVersion::parse("5.10").unwrap(), KernelVersion::new(5, 10, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(KernelVersion::parse("").is_err());
        assert!(KernelVersion::parse("linux").is_err());
        assert!(KernelVersion::parse("3").is_err());
        assert!(KernelVersion::parse("3.8.1.4").is_err());
        assert!(KernelVersion::parse("-3.8").is_err());
    }

    #[test]
    fn minimum_version_gate() {
        assert!(KernelVersion::parse("3.7.5").unwrap().ensure_supported().is_err());
        assert!(KernelVersion::parse("2.6.32").unwrap().ensure_supported().is_err());
        assert!(KernelVersion::parse("3.8.0").unwrap().ensure_supported().is_ok());
        assert!(KernelVersion::parse("3.8.13-bone47").unwrap().ensure_supported().is_ok());
        assert!(KernelVersion::parse("6.1.21-v8+").unwrap().ensure_supported().is_ok());
    }

    #[test]
    fn too_old_error_names_both_versions() {
        let err = KernelVersion::new(3, 7, 5).ensure_supported().unwrap_err();
        assert_eq!(
            err.to_string(),
            "kernel version 3.7.5 is too old, need at least 3.8.0"
        );
    }

    #[test]
    fn host_from_node_name() {
        assert_eq!(Host::from_node_name("raspberrypi\n"), Some(Host::Rpi));
        assert_eq!(Host::from_node_name("beaglebone"), Some(Host::Bbb));
        assert_eq!(Host::from_node_name("chip"), Some(Host::Chip));
        assert_eq!(Host::from_node_name("workstation"), None);
    }

    #[test]
    fn host_tags_round_trip() {
        for host in Host::ALL {
            assert_eq!(host.tag().parse::<Host>().unwrap(), host);
        }
        assert_eq!("BBB".parse::<Host>().unwrap(), Host::Bbb);
        assert!(matches!(
            "pdp11".parse::<Host>(),
            Err(Error::UnsupportedHost(_))
        ));
    }

    #[test]
    fn cpuinfo_revision() {
        let cpuinfo = "processor\t: 0\nHardware\t: BCM2708\nRevision\t: 000e\nSerial\t\t: 00000000\n";
        assert_eq!(parse_cpuinfo_revision(cpuinfo), Some(0x000e));

        let overvolted = "Revision\t: 1000000f\n";
        assert_eq!(parse_cpuinfo_revision(overvolted), Some(0x000f));

        let pi3 = "Revision\t: a02082\n";
        assert_eq!(parse_cpuinfo_revision(pi3), Some(0xa02082));

        assert_eq!(parse_cpuinfo_revision("Hardware\t: Generic AM33XX\n"), None);
    }
}
