//! Registry of host describers.
//!
//! Provides a `HostRegistry` struct mapping each [`Host`] tag to the function
//! that builds its [`Descriptor`]. Board modules are registered explicitly at
//! startup; the registry itself carries no board knowledge.

use crate::descriptor::{Describer, Descriptor};
use embd_common::host::Host;
use embd_common::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Registry of available host describers.
///
/// Constructed at startup, populated via `register()`, and handed to
/// [`Hal`](crate::Hal) by reference. Testable in isolation.
pub struct HostRegistry {
    describers: HashMap<Host, Describer>,
}

impl HostRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            describers: HashMap::new(),
        }
    }

    /// Registry holding every built-in board.
    pub fn with_builtin_boards() -> Self {
        let mut registry = Self::new();
        crate::boards::register_all_hosts(&mut registry);
        registry
    }

    /// Register a describer.
    ///
    /// # Panics
    /// Panics if the host is already registered.
    pub fn register(&mut self, host: Host, describer: Describer) {
        if self.describers.contains_key(&host) {
            panic!("Host '{host}' is already registered");
        }
        self.describers.insert(host, describer);
    }

    /// Get a describer by host tag.
    pub fn get_describer(&self, host: Host) -> Option<Describer> {
        self.describers.get(&host).copied()
    }

    /// Build the descriptor for `host` at `revision`.
    ///
    /// # Errors
    /// Returns `Error::UnsupportedHost` if no describer is registered.
    pub fn describe(&self, host: Host, revision: u32) -> Result<Descriptor> {
        let describer = self
            .get_describer(host)
            .ok_or_else(|| Error::UnsupportedHost(host.to_string()))?;
        Ok(describer(revision))
    }

    /// List all registered hosts.
    pub fn list_hosts(&self) -> Vec<Host> {
        self.describers.keys().copied().collect()
    }
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Process-wide registry ──────────────────────────────────────────
//
// Free functions over a global registry, pre-populated with the built-in
// boards, for callers that go through the façade.

static GLOBAL_REGISTRY: LazyLock<RwLock<HostRegistry>> =
    LazyLock::new(|| RwLock::new(HostRegistry::with_builtin_boards()));

/// Register a describer globally.
///
/// # Panics
/// Panics if the host is already registered.
pub fn register_host(host: Host, describer: Describer) {
    GLOBAL_REGISTRY.write().register(host, describer);
}

/// Get a describer from the global registry.
pub fn describer_for(host: Host) -> Option<Describer> {
    GLOBAL_REGISTRY.read().get_describer(host)
}

/// Build a descriptor from the global registry.
pub fn describe(host: Host, revision: u32) -> Result<Descriptor> {
    GLOBAL_REGISTRY.read().describe(host, revision)
}
