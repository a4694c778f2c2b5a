//! Host detection from `uname(2)` and `/proc/cpuinfo`.

use embd_common::config::PathsConfig;
use embd_common::host::{Host, KernelVersion, parse_cpuinfo_revision};
use embd_common::{Error, Result};
use serde::Serialize;
use std::fs;
use tracing::{debug, warn};

/// What detection found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostInfo {
    /// Board family.
    pub host: Host,
    /// Board revision (0 when unknown).
    pub revision: u32,
}

/// Resolve the host from a node name and kernel release.
///
/// # Errors
///
/// [`Error::InvalidKernelVersion`] / [`Error::KernelTooOld`] for an unusable
/// kernel, [`Error::UnsupportedHost`] for an unknown node name.
pub fn resolve_host(node: &str, release: &str) -> Result<Host> {
    KernelVersion::parse(release)?.ensure_supported()?;
    Host::from_node_name(node).ok_or_else(|| Error::UnsupportedHost(node.trim().to_string()))
}

/// Board revision from cpuinfo contents, 0 when absent.
pub fn resolve_revision(cpuinfo: Option<&str>) -> u32 {
    cpuinfo.and_then(parse_cpuinfo_revision).unwrap_or(0)
}

/// Detect the running host.
pub fn detect_host(paths: &PathsConfig) -> Result<HostInfo> {
    let uts = nix::sys::utsname::uname().map_err(|errno| Error::sys("uname", errno))?;
    let node = uts.nodename().to_string_lossy();
    let release = uts.release().to_string_lossy();
    debug!(node = %node, release = %release, "uname");

    let host = resolve_host(&node, &release)?;
    let cpuinfo = match fs::read_to_string(&paths.cpuinfo) {
        Ok(contents) => Some(contents),
        Err(e) => {
            warn!(path = %paths.cpuinfo.display(), error = %e, "cpuinfo unreadable, assuming revision 0");
            None
        }
    };
    let revision = resolve_revision(cpuinfo.as_deref());
    Ok(HostInfo { host, revision })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_nodes_resolve() {
        assert_eq!(resolve_host("raspberrypi", "4.19.66-v7+").unwrap(), Host::Rpi);
        assert_eq!(resolve_host("beaglebone", "3.8.13-bone47").unwrap(), Host::Bbb);
        assert_eq!(resolve_host("chip", "4.4.13-ntc-mlc").unwrap(), Host::Chip);
    }

    #[test]
    fn old_kernel_is_rejected_before_node_lookup() {
        assert!(matches!(
            resolve_host("raspberrypi", "3.7.5"),
            Err(Error::KernelTooOld { .. })
        ));
        assert!(matches!(
            resolve_host("workstation", "garbage"),
            Err(Error::InvalidKernelVersion(_))
        ));
    }

    #[test]
    fn unknown_node_is_unsupported() {
        assert!(matches!(
            resolve_host("workstation", "6.1.0"),
            Err(Error::UnsupportedHost(node)) if node == "workstation"
        ));
    }

    #[test]
    fn revision_defaults_to_zero() {
        assert_eq!(resolve_revision(None), 0);
        assert_eq!(resolve_revision(Some("Hardware\t: BCM2835\n")), 0);
        assert_eq!(resolve_revision(Some("Revision\t: 0010\n")), 0x10);
    }
}
