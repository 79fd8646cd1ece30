//! Default presets — known-good configurations used for "default mod" picks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, ContentPack};

/// One child of a preset, keyed by the slot it occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetItem {
    /// Template the child hangs off. `None` matches any parent.
    #[serde(default)]
    pub parent_tpl: Option<String>,
    pub slot: String,
    pub tpl: String,
}

/// A known-good configuration for a root item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub root_tpl: String,
    /// Only default presets are used for default-mod picks.
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub items: Vec<PresetItem>,
}

impl Preset {
    /// Template the preset puts in `slot` under `parent_tpl`.
    ///
    /// An entry naming the exact parent wins over a parent-less entry.
    pub fn item_for_slot(&self, parent_tpl: &str, slot: &str) -> Option<&str> {
        let mut loose = None;
        for item in self.items.iter().filter(|i| i.slot == slot) {
            match item.parent_tpl.as_deref() {
                Some(p) if p == parent_tpl => return Some(&item.tpl),
                None if loose.is_none() => loose = Some(item.tpl.as_str()),
                _ => {}
            }
        }
        loose
    }
}

/// Source of default presets.
pub trait PresetSource: Sync {
    fn default_preset(&self, root_tpl: &str) -> Option<&Preset>;
}

/// In-memory preset table keyed by root template.
#[derive(Debug, Clone, Default)]
pub struct PresetBook {
    by_root: HashMap<String, Preset>,
}

impl PresetBook {
    /// Keep the first default preset seen per root template.
    pub fn new(presets: Vec<Preset>) -> Self {
        let mut by_root = HashMap::new();
        for preset in presets.into_iter().filter(|p| p.default) {
            by_root.entry(preset.root_tpl.clone()).or_insert(preset);
        }
        Self { by_root }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(ContentPack::from_json(json)?.presets))
    }

    pub fn len(&self) -> usize {
        self.by_root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_root.is_empty()
    }
}

impl PresetSource for PresetBook {
    fn default_preset(&self, root_tpl: &str) -> Option<&Preset> {
        self.by_root.get(root_tpl)
    }
}
