//! Collaborators the assembler reads from: pool hydration and id generation.
//!
//! The traits are the seams; `CatalogHydrator` and `SequentialIds` are the
//! in-process defaults used by the harness and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::catalog::Catalog;
use crate::config::AssemblyConfig;
use crate::presets::PresetSource;

/// Supplies pools for randomisable slots plus per-role filters.
pub trait PoolHydrator: Sync {
    /// Every template that may go into `slot` on `parent_tpl`.
    fn dynamic_pool(&self, parent_tpl: &str, slot: &str) -> Vec<String>;
    /// Templates the role may not carry at this level.
    fn blacklist(&self, role: &str, level: u32) -> Vec<String>;
    /// weapon base class → sight base classes.
    fn sight_whitelist(&self, role: &str) -> HashMap<String, Vec<String>>;
}

/// Hydrates pools straight from catalog slot filters and role config.
pub struct CatalogHydrator<'a> {
    catalog: &'a Catalog,
    config: &'a AssemblyConfig,
}

impl<'a> CatalogHydrator<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a AssemblyConfig) -> Self {
        Self { catalog, config }
    }
}

impl PoolHydrator for CatalogHydrator<'_> {
    fn dynamic_pool(&self, parent_tpl: &str, slot: &str) -> Vec<String> {
        self.catalog
            .get(parent_tpl)
            .and_then(|t| t.slot(slot))
            .map(|s| {
                s.allowed()
                    .iter()
                    .filter(|id| self.catalog.contains(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn blacklist(&self, role: &str, level: u32) -> Vec<String> {
        self.config.role(role).blacklist_for(level)
    }

    fn sight_whitelist(&self, role: &str) -> HashMap<String, Vec<String>> {
        self.config.role(role).weapon_sight_whitelist.clone()
    }
}

/// Fresh ids for attached nodes. Shared across threads.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Prefix plus a zero-padded hex counter.
#[derive(Debug, Default)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{:012x}", self.prefix, n)
    }
}

/// Read-only bundle handed to every assembly call.
#[derive(Clone, Copy)]
pub struct AssemblyServices<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a AssemblyConfig,
    pub hydrator: &'a dyn PoolHydrator,
    pub presets: &'a dyn PresetSource,
    pub ids: &'a dyn IdSource,
}
