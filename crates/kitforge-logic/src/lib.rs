//! Pure equipment assembly logic for KitForge.
//!
//! Builds weapon and armor attachment trees by walking a compatibility
//! catalog: each slot of a root item is considered in turn, a spawn roll
//! decides whether it gets something, a candidate pool is resolved and
//! narrowed, and a compatible template is drawn without replacement. The
//! engine does no I/O; callers hand in the catalog, configuration, presets
//! and a seeded RNG, and get back a flat item list plus a report.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`assembly`] | Depth-first driver: slot loop, attach, descent, cycle/depth guards |
//! | [`catalog`] | Item templates, slot filters, base class lookup, JSON content packs |
//! | [`config`] | Per-role settings, level brackets, never-compatible pairs |
//! | [`constants`] | Slot names, base class ids, slot groups |
//! | [`draw`] | Exhaustible random draw without replacement |
//! | [`ordering`] | Slot ordering heuristic (mounts and scopes first) |
//! | [`persistence`] | Versioned bincode loadout snapshots |
//! | [`pool`] | Candidate pool resolution and weapon-only narrowing |
//! | [`presets`] | Default presets used for required-slot fallbacks |
//! | [`report`] | Per-slot outcomes, non-fatal issues, fatal errors |
//! | [`request`] | Generation request: tree, mod pool, chances, conflicts |
//! | [`selector`] | Conflict-aware candidate selection with retry budget |
//! | [`services`] | Hydrator, preset and id-source seams |
//! | [`spawn`] | Spawn decision per slot |
//! | [`special`] | Plates, co-dependent slots, cylinder magazines, mod limits |
//! | [`validate`] | Structural checks on an assembled tree |

pub mod assembly;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod draw;
pub mod ordering;
pub mod persistence;
pub mod pool;
pub mod presets;
pub mod report;
pub mod request;
pub mod selector;
pub mod services;
pub mod spawn;
pub mod special;
pub mod validate;

pub use assembly::{assemble_equipment, assemble_weapon, TreeKind};
pub use catalog::{Catalog, CatalogError, ContentPack, ItemTemplate, SlotDef};
pub use config::{AssemblyConfig, ConfigError, RoleSettings};
pub use presets::{Preset, PresetBook, PresetSource};
pub use report::{AssemblyError, AssemblyIssue, AssemblyReport, SlotOutcome};
pub use request::{
    AssembledItem, BotContext, ConflictSet, GenerationRequest, ModPool, SpawnChances,
};
pub use services::{AssemblyServices, CatalogHydrator, IdSource, PoolHydrator, SequentialIds};
