//! Built-in board definitions.

pub mod bbb;
pub mod chip;
pub mod rpi;

use crate::host_registry::HostRegistry;
use embd_common::host::Host;

/// Register every built-in board with `registry`.
pub fn register_all_hosts(registry: &mut HostRegistry) {
    registry.register(Host::Rpi, rpi::describe);
    registry.register(Host::Bbb, bbb::describe);
    registry.register(Host::Chip, chip::describe);
}
