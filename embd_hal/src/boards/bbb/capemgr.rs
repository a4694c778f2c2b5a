//! BeagleBone cape manager (`/sys/devices/bone_capemgr.*/slots`).
//!
//! Writing an overlay name to `slots` loads it; writing `-<slot>` unloads
//! the overlay in that slot. A slot line looks like
//! `  7: ff:P-O-L Override Board Name,00A0,Override Manuf,bone_pwm_P9_14`.

use crate::sysfs::{Segment, append_attr, find_path, read_attr, render_pattern};
use embd_common::config::PathsConfig;
use embd_common::{Error, Result};
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use tracing::{debug, info};

const SLOTS_PATTERN: [Segment<'static>; 2] = [Segment::Prefix("bone_capemgr."), Segment::Exact("slots")];

/// Overlays whose removal is known to be safe. Unloading others (notably the
/// ADC helper) can panic the kernel.
const REMOVABLE_PREFIX: &str = "bone_pwm_";

/// Handle on the cape manager's slot file.
#[derive(Debug, Clone)]
pub struct CapeManager {
    devices_dir: PathBuf,
}

impl CapeManager {
    /// Cape manager under `paths.devices_dir()`.
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            devices_dir: paths.devices_dir(),
        }
    }

    fn slots(&self) -> Result<PathBuf> {
        find_path(&self.devices_dir, &SLOTS_PATTERN)?.ok_or_else(|| {
            Error::io(
                "find",
                render_pattern(&self.devices_dir, &SLOTS_PATTERN),
                io::Error::from(ErrorKind::NotFound),
            )
        })
    }

    /// True if `feature` appears in the slot list.
    pub fn is_enabled(&self, feature: &str) -> Result<bool> {
        Ok(read_attr(&self.slots()?)?.contains(feature))
    }

    /// Load `feature` unless it is already loaded.
    pub fn ensure_enabled(&self, feature: &str) -> Result<()> {
        let slots = self.slots()?;
        if read_attr(&slots)?.contains(feature) {
            debug!(feature, "overlay already loaded");
            return Ok(());
        }
        append_attr(&slots, feature)?;
        info!(feature, "overlay loaded");
        Ok(())
    }

    /// Unload `feature` if it is loaded.
    ///
    /// Only PWM pin overlays (`bone_pwm_*`) may be removed.
    pub fn remove(&self, feature: &str) -> Result<()> {
        if !feature.starts_with(REMOVABLE_PREFIX) {
            return Err(Error::NotImplemented("removing overlays other than bone_pwm_*"));
        }
        let slots = self.slots()?;
        let listing = read_attr(&slots)?;
        let Some(slot) = listing
            .lines()
            .find(|line| line.contains(feature))
            .and_then(parse_slot_number)
        else {
            debug!(feature, "overlay not loaded, nothing to remove");
            return Ok(());
        };
        append_attr(&slots, &format!("-{slot}"))?;
        info!(feature, slot, "overlay removed");
        Ok(())
    }
}

/// Slot number at the start of a `slots` line (`" 7: ff:P-O-L ..."` -> 7).
fn parse_slot_number(line: &str) -> Option<u32> {
    line.split_once(':')?.0.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_number_parsing() {
        assert_eq!(
            parse_slot_number(" 7: ff:P-O-L Override Board Name,00A0,Override Manuf,bone_pwm_P9_14"),
            Some(7)
        );
        assert_eq!(parse_slot_number("12: 54:PF---"), Some(12));
        assert_eq!(parse_slot_number("garbage"), None);
    }
}
