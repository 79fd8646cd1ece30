//! Generation request — everything one assembly call reads and mutates.
//!
//! A request is built per root item, handed to the assembler by `&mut`, and
//! discarded afterwards. The conflict set and spawn chances grow and change
//! during the call; nothing in here is shared between calls.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// One node of an assembled tree. The root has no parent or slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledItem {
    pub id: String,
    pub tpl: String,
    pub parent_id: Option<String>,
    pub slot_id: Option<String>,
}

impl AssembledItem {
    pub fn root(id: &str, tpl: &str) -> Self {
        Self {
            id: id.to_string(),
            tpl: tpl.to_string(),
            parent_id: None,
            slot_id: None,
        }
    }

    pub fn child(id: String, tpl: &str, parent_id: &str, slot_id: &str) -> Self {
        Self {
            id,
            tpl: tpl.to_string(),
            parent_id: Some(parent_id.to_string()),
            slot_id: Some(slot_id.to_string()),
        }
    }
}

/// parent template → slot → candidate ids. Slot order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModPool {
    entries: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl ModPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, parent: &str, slot: &str, ids: &[&str]) -> Self {
        self.set(parent, slot, ids.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Declared pools taken straight from slot filters, for every template
    /// reachable from `root_tpl`. Unknown ids are dropped; slots without a
    /// filter list are left out.
    pub fn from_catalog(catalog: &Catalog, root_tpl: &str) -> Self {
        let mut pool = Self::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([root_tpl.to_string()]);
        while let Some(tpl) = queue.pop_front() {
            if !seen.insert(tpl.clone()) {
                continue;
            }
            let Some(template) = catalog.get(&tpl) else {
                continue;
            };
            for slot in template.slots.iter().filter(|s| s.filter.is_some()) {
                let ids: Vec<String> = slot
                    .allowed()
                    .iter()
                    .filter(|id| catalog.contains(id))
                    .cloned()
                    .collect();
                queue.extend(ids.iter().cloned());
                pool.set(&tpl, &slot.name, ids);
            }
        }
        pool
    }

    pub fn set(&mut self, parent: &str, slot: &str, ids: Vec<String>) {
        self.entries
            .entry(parent.to_string())
            .or_default()
            .insert(slot.to_string(), ids);
    }

    pub fn contains_parent(&self, parent: &str) -> bool {
        self.entries.contains_key(parent)
    }

    pub fn slots_for(&self, parent: &str) -> Option<&IndexMap<String, Vec<String>>> {
        self.entries.get(parent)
    }

    pub fn pool(&self, parent: &str, slot: &str) -> Option<&[String]> {
        self.entries
            .get(parent)
            .and_then(|slots| slots.get(slot))
            .map(Vec::as_slice)
    }
}

/// Slot name → spawn chance in percent. Missing slots have no chance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnChances {
    chances: HashMap<String, f64>,
}

impl SpawnChances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: &str, percent: f64) -> Self {
        self.set(slot, percent);
        self
    }

    pub fn get(&self, slot: &str) -> f64 {
        self.chances.get(slot).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, slot: &str, percent: f64) {
        self.chances.insert(slot.to_string(), percent);
    }

    pub fn set_all(&mut self, slots: &[&str], percent: f64) {
        for slot in slots {
            self.set(slot, percent);
        }
    }
}

/// Template ids forbidden for the rest of one assembly call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictSet {
    ids: HashSet<String>,
}

impl ConflictSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tpl: &str) -> bool {
        self.ids.contains(tpl)
    }

    pub fn extend<'a>(&mut self, ids: impl IntoIterator<Item = &'a String>) {
        self.ids.extend(ids.into_iter().cloned());
    }

    pub fn insert(&mut self, tpl: &str) {
        self.ids.insert(tpl.to_string());
    }
}

/// Who the loadout is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotContext {
    pub role: String,
    pub level: u32,
}

impl BotContext {
    pub fn new(role: &str, level: u32) -> Self {
        Self {
            role: role.to_string(),
            level,
        }
    }
}

/// What has been attached so far, used to bias later slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyState {
    pub has_optic: bool,
    pub has_front_iron_sight: bool,
    pub has_rear_iron_sight: bool,
    pub scope_count: u32,
    pub light_laser_count: u32,
}

/// Input and in-progress output of one assembly call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Flat tree, root first. New nodes are appended.
    pub items: Vec<AssembledItem>,
    pub root_id: String,
    pub mod_pool: ModPool,
    pub spawn_chances: SpawnChances,
    pub conflicts: ConflictSet,
    pub bot: BotContext,
    /// Cartridge to load into chambers and cartridge slots.
    pub ammo_tpl: Option<String>,
    pub state: AssemblyState,
}

impl GenerationRequest {
    pub fn new(
        root: AssembledItem,
        mod_pool: ModPool,
        spawn_chances: SpawnChances,
        bot: BotContext,
    ) -> Self {
        Self {
            root_id: root.id.clone(),
            items: vec![root],
            mod_pool,
            spawn_chances,
            conflicts: ConflictSet::new(),
            bot,
            ammo_tpl: None,
            state: AssemblyState::default(),
        }
    }

    pub fn with_ammo(mut self, tpl: &str) -> Self {
        self.ammo_tpl = Some(tpl.to_string());
        self
    }

    pub fn root(&self) -> Option<&AssembledItem> {
        self.items.iter().find(|i| i.id == self.root_id)
    }

    pub fn root_tpl(&self) -> Option<&str> {
        self.root().map(|r| r.tpl.as_str())
    }

    /// Template ids of every node currently in the tree, root included.
    pub fn attached_tpls(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.tpl.as_str())
    }

    pub fn has_slot_filled(&self, slot: &str) -> bool {
        self.items.iter().any(|i| i.slot_id.as_deref() == Some(slot))
    }

    pub fn children_of<'a>(&'a self, parent_id: &'a str) -> impl Iterator<Item = &'a AssembledItem> {
        self.items
            .iter()
            .filter(move |i| i.parent_id.as_deref() == Some(parent_id))
    }
}
