//! Assembly configuration — per-role tuning and global content tables.
//!
//! Everything here is data: which slots a role randomises, what it may not
//! carry, which sights suit which weapon class, how armor tiers are weighted
//! by level. Missing fields fall back to `Default`, so a config file only
//! needs to name what it changes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Inclusive bot level range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange {
    pub min: u32,
    pub max: u32,
}

impl LevelRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, level: u32) -> bool {
        level >= self.min && level <= self.max
    }
}

/// Slots whose pools are hydrated dynamically for bots in a level range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomisationBracket {
    pub level_range: LevelRange,
    #[serde(default)]
    pub randomised_slots: Vec<String>,
}

/// Items a role may not carry within a level range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlacklistBracket {
    pub level_range: LevelRange,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Armor class weights per plate slot for one level bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateWeighting {
    pub level_range: LevelRange,
    /// plate slot → armor class → weight. Ordered so seeded draws repeat.
    #[serde(default)]
    pub values: HashMap<String, BTreeMap<u8, f64>>,
}

/// Per-weapon caps on attachment families. `None` is unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModLimits {
    #[serde(default)]
    pub scope_limit: Option<u32>,
    #[serde(default)]
    pub light_laser_limit: Option<u32>,
}

/// Tuning for one bot role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleSettings {
    pub randomisation: Vec<RandomisationBracket>,
    pub blacklist: Vec<BlacklistBracket>,
    /// weapon base class → sight base classes it may use.
    pub weapon_sight_whitelist: HashMap<String, Vec<String>>,
    /// Slots treated as required even when the template says optional.
    pub slots_to_make_required: Vec<String>,
    pub force_stock: bool,
    pub min_magazine_size: Option<u32>,
    pub filter_plates_by_level: bool,
    pub armor_plate_weighting: Vec<PlateWeighting>,
    pub mod_limits: ModLimits,
}

impl RoleSettings {
    pub fn is_randomisable(&self, slot: &str, level: u32) -> bool {
        self.randomisation
            .iter()
            .filter(|b| b.level_range.contains(level))
            .any(|b| b.randomised_slots.iter().any(|s| s == slot))
    }

    pub fn blacklist_for(&self, level: u32) -> Vec<String> {
        self.blacklist
            .iter()
            .filter(|b| b.level_range.contains(level))
            .flat_map(|b| b.items.iter().cloned())
            .collect()
    }

    pub fn forces_required(&self, slot: &str) -> bool {
        self.slots_to_make_required.iter().any(|s| s == slot)
    }

    /// First weighting bracket covering `level`.
    pub fn plate_weighting_for(&self, level: u32) -> Option<&PlateWeighting> {
        self.armor_plate_weighting
            .iter()
            .find(|w| w.level_range.contains(level))
    }
}

/// Symmetric table of template pairs that may never share a tree.
///
/// Catalog conflict data misses some real combinations; this patches them
/// without touching the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct IncompatibilityTable {
    pairs: HashMap<String, HashSet<String>>,
}

impl IncompatibilityTable {
    pub fn insert(&mut self, a: &str, b: &str) {
        self.pairs
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.pairs
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    pub fn is_incompatible(&self, a: &str, b: &str) -> bool {
        self.pairs.get(a).is_some_and(|set| set.contains(b))
    }
}

impl From<Vec<(String, String)>> for IncompatibilityTable {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut table = Self::default();
        for (a, b) in &pairs {
            table.insert(a, b);
        }
        table
    }
}

impl From<IncompatibilityTable> for Vec<(String, String)> {
    fn from(table: IncompatibilityTable) -> Self {
        let mut out = Vec::new();
        for (a, set) in &table.pairs {
            for b in set {
                if a < b {
                    out.push((a.clone(), b.clone()));
                }
            }
        }
        out.sort();
        out
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Full assembly configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub roles: HashMap<String, RoleSettings>,
    /// Used for roles without their own entry.
    pub default_role: RoleSettings,
    pub low_profile_gas_blocks: Vec<String>,
    /// Gas blocks that carry a front sight post.
    pub integrated_front_sight_gas_blocks: Vec<String>,
    pub incompatible_pairs: IncompatibilityTable,
    /// Maximum attachment depth below the root.
    pub max_depth: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            roles: HashMap::new(),
            default_role: RoleSettings::default(),
            low_profile_gas_blocks: Vec::new(),
            integrated_front_sight_gas_blocks: Vec::new(),
            incompatible_pairs: IncompatibilityTable::default(),
            max_depth: 16,
        }
    }
}

impl AssemblyConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn role(&self, role: &str) -> &RoleSettings {
        self.roles.get(role).unwrap_or(&self.default_role)
    }

    pub fn is_low_profile_gas_block(&self, tpl: &str) -> bool {
        self.low_profile_gas_blocks.iter().any(|t| t == tpl)
    }

    pub fn has_integrated_front_sight(&self, tpl: &str) -> bool {
        self.integrated_front_sight_gas_blocks.iter().any(|t| t == tpl)
    }
}
