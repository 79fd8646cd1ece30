//! Compatibility catalog — immutable item templates and base class lookups.
//!
//! Base classes are ordinary catalog nodes: a template's `parent` points at
//! its base class, which may itself have a parent. `is_of_base_class` walks
//! that chain, so a `collimator` is also a `sight` if the catalog says so.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A named attachment point on a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDef {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    /// Template ids allowed in this slot. `None` means the entry is malformed.
    #[serde(default)]
    pub filter: Option<Vec<String>>,
    /// Built-in plate for removable plate slots.
    #[serde(default)]
    pub default_plate: Option<String>,
}

impl SlotDef {
    /// Allowed ids, empty when the filter list is missing.
    pub fn allowed(&self) -> &[String] {
        self.filter.as_deref().unwrap_or(&[])
    }

    pub fn allows(&self, tpl: &str) -> bool {
        self.allowed().iter().any(|id| id == tpl)
    }
}

/// Catalog entry for one item type. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Base class id.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub slots: Vec<SlotDef>,
    #[serde(default)]
    pub conflicting_items: Vec<String>,
    #[serde(default = "one")]
    pub width: u8,
    #[serde(default = "one")]
    pub height: u8,
    #[serde(default)]
    pub foldable: bool,
    /// Cartridge capacity for magazines.
    #[serde(default)]
    pub max_ammo_capacity: Option<u32>,
    /// Protection tier for plates and armor.
    #[serde(default)]
    pub armor_class: Option<u8>,
}

fn one() -> u8 {
    1
}

impl ItemTemplate {
    /// Minimal template with no slots, mostly for tests and fixtures.
    pub fn new(id: &str, parent: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            parent: Some(parent.to_string()),
            slots: Vec::new(),
            conflicting_items: Vec::new(),
            width: 1,
            height: 1,
            foldable: false,
            max_ammo_capacity: None,
            armor_class: None,
        }
    }

    pub fn with_slot(mut self, name: &str, required: bool, filter: &[&str]) -> Self {
        self.slots.push(SlotDef {
            name: name.to_string(),
            required,
            filter: Some(filter.iter().map(|s| s.to_string()).collect()),
            default_plate: None,
        });
        self
    }

    pub fn with_conflicts(mut self, ids: &[&str]) -> Self {
        self.conflicting_items = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.max_ammo_capacity = Some(capacity);
        self
    }

    pub fn with_armor_class(mut self, class: u8) -> Self {
        self.armor_class = Some(class);
        self
    }

    pub fn slot(&self, name: &str) -> Option<&SlotDef> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn has_slots(&self) -> bool {
        !self.slots.is_empty()
    }
}

/// Errors raised while loading catalog content.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate template id: {0}")]
    DuplicateTemplate(String),

    #[error("Template {template} slot {slot}: {reason}")]
    Malformed {
        template: String,
        slot: String,
        reason: String,
    },
}

/// On-disk content layout: templates plus optional presets.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentPack {
    #[serde(default)]
    pub templates: Vec<ItemTemplate>,
    #[serde(default)]
    pub presets: Vec<crate::presets::Preset>,
}

impl ContentPack {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// Read-only template store.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: HashMap<String, ItemTemplate>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids.
    ///
    /// Slots without a filter list are accepted here; the assembler reports
    /// them as malformed when it reaches them, so one bad entry doesn't
    /// take the whole catalog down.
    pub fn from_templates(templates: Vec<ItemTemplate>) -> Result<Self, CatalogError> {
        let mut map = HashMap::with_capacity(templates.len());
        for template in templates {
            if map.contains_key(&template.id) {
                return Err(CatalogError::DuplicateTemplate(template.id));
            }
            map.insert(template.id.clone(), template);
        }
        Ok(Self { templates: map })
    }

    /// Parse a `ContentPack` and keep only its templates.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::from_templates(ContentPack::from_json(json)?.templates)
    }

    pub fn get(&self, id: &str) -> Option<&ItemTemplate> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// True if `id` is `class_id` or descends from it.
    pub fn is_of_base_class(&self, id: &str, class_id: &str) -> bool {
        let mut current = Some(id);
        // Chain length can't exceed the catalog size unless it loops.
        for _ in 0..=self.templates.len() {
            let Some(cur) = current else {
                return false;
            };
            if cur == class_id {
                return true;
            }
            current = self.templates.get(cur).and_then(|t| t.parent.as_deref());
        }
        false
    }

    pub fn is_of_any_base_class(&self, id: &str, class_ids: &[&str]) -> bool {
        class_ids.iter().any(|c| self.is_of_base_class(id, c))
    }

    /// Direct base class of a template.
    pub fn parent_class(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|t| t.parent.as_deref())
    }
}
