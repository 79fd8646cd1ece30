//! Candidate pool resolution — what may go into one slot.
//!
//! The base pool comes from one of three places (default preset, dynamic
//! hydration, or the declared mod pool). Weapon slots are then narrowed by
//! sight whitelist, gas block profile, magazine capacity and pinned ammo.
//! A narrowing that would leave nothing is thrown away: an unsuitable
//! candidate is better than an empty slot.

use crate::catalog::{Catalog, ItemTemplate, SlotDef};
use crate::constants::{self, base_classes, slots};
use crate::request::GenerationRequest;
use crate::services::AssemblyServices;
use crate::spawn::SpawnDecision;

/// The slot being filled and how it should be treated.
#[derive(Debug, Clone, Copy)]
pub struct SlotTarget<'a> {
    pub parent: &'a ItemTemplate,
    pub slot: &'a SlotDef,
    /// Pool is hydrated dynamically for this bot.
    pub randomisable: bool,
    /// Part of a weapon tree (enables weapon-only narrowing).
    pub weapon: bool,
}

impl SlotTarget<'_> {
    pub fn name(&self) -> &str {
        &self.slot.name
    }
}

/// Resolve the candidate list for a slot given its spawn decision.
pub fn resolve_pool(
    services: &AssemblyServices,
    request: &GenerationRequest,
    target: SlotTarget,
    decision: SpawnDecision,
) -> Vec<String> {
    let base = match decision {
        SpawnDecision::Skip => return Vec::new(),
        SpawnDecision::DefaultMod => default_mod_pool(services, request, target),
        SpawnDecision::Spawn if target.randomisable => randomised_pool(services, request, target),
        SpawnDecision::Spawn => declared_pool(request, target),
    };

    if !target.weapon || base.is_empty() {
        return base;
    }
    narrow_weapon_pool(services, request, target, base)
}

fn declared_pool(request: &GenerationRequest, target: SlotTarget) -> Vec<String> {
    request
        .mod_pool
        .pool(&target.parent.id, target.name())
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

/// Pool for a required slot whose roll failed.
///
/// Prefers the root's default preset so the weapon ends up in a known-good
/// shape, then whatever the mod pool declares, then the raw slot filter.
fn default_mod_pool(
    services: &AssemblyServices,
    request: &GenerationRequest,
    target: SlotTarget,
) -> Vec<String> {
    let preset_tpl = request
        .root_tpl()
        .and_then(|root| services.presets.default_preset(root))
        .and_then(|preset| preset.item_for_slot(&target.parent.id, target.name()));

    if let Some(tpl) = preset_tpl {
        // Has its own pool entry, so the rest of the pipeline can expand it.
        if request.mod_pool.contains_parent(tpl) {
            return vec![tpl.to_string()];
        }
        let childless = services.catalog.get(tpl).is_some_and(|t| !t.has_slots());
        if childless && target.slot.allows(tpl) && !request.conflicts.contains(tpl) {
            return vec![tpl.to_string()];
        }
    }

    let existing = declared_pool(request, target);
    if !existing.is_empty() {
        return existing;
    }

    target
        .slot
        .allowed()
        .iter()
        .filter(|id| !request.conflicts.contains(id))
        .cloned()
        .collect()
}

/// Dynamic pool minus the role's blacklist.
fn randomised_pool(
    services: &AssemblyServices,
    request: &GenerationRequest,
    target: SlotTarget,
) -> Vec<String> {
    let dynamic = services
        .hydrator
        .dynamic_pool(&target.parent.id, target.name());
    let blacklist = services
        .hydrator
        .blacklist(&request.bot.role, request.bot.level);
    let filtered: Vec<String> = dynamic
        .iter()
        .filter(|id| !blacklist.contains(id))
        .cloned()
        .collect();
    if !filtered.is_empty() {
        return filtered;
    }

    let declared = declared_pool(request, target);
    if !declared.is_empty() {
        log::debug!(
            "Blacklist emptied dynamic pool for {}/{}, using declared pool",
            target.parent.id,
            target.name()
        );
        return declared;
    }
    dynamic
}

fn narrow_weapon_pool(
    services: &AssemblyServices,
    request: &GenerationRequest,
    target: SlotTarget,
    pool: Vec<String>,
) -> Vec<String> {
    let slot = target.name();
    let catalog = services.catalog;

    if constants::is_cartridge_slot(slot) {
        if let Some(ammo) = request.ammo_tpl.as_deref() {
            let pinned = if target.slot.allows(ammo) || pool.iter().any(|t| t == ammo) {
                vec![ammo.to_string()]
            } else {
                Vec::new()
            };
            return keep_non_empty(pool, pinned, "ammo", slot);
        }
        return pool;
    }

    if constants::is_scope_slot(slot) {
        let weapon_class = request.root_tpl().and_then(|r| catalog.parent_class(r));
        let whitelist = services.hydrator.sight_whitelist(&request.bot.role);
        if let Some(allowed) = weapon_class.and_then(|c| whitelist.get(c)) {
            let narrowed = filter_sights_by_whitelist(catalog, &pool, allowed);
            return keep_non_empty(pool, narrowed, "sight whitelist", slot);
        }
        return pool;
    }

    if slot == slots::GAS_BLOCK {
        let narrowed = filter_gas_blocks(services, request, &pool);
        return keep_non_empty(pool, narrowed, "gas block profile", slot);
    }

    if slot == slots::MAGAZINE {
        if let Some(min) = services.config.role(&request.bot.role).min_magazine_size {
            let narrowed = filter_magazines_by_capacity(catalog, &pool, min);
            return keep_non_empty(pool, narrowed, "magazine capacity", slot);
        }
    }

    pool
}

/// Use `narrowed` unless it is empty, in which case keep `original`.
pub fn keep_non_empty(
    original: Vec<String>,
    narrowed: Vec<String>,
    filter: &str,
    slot: &str,
) -> Vec<String> {
    if narrowed.is_empty() && !original.is_empty() {
        log::debug!(
            "{} filter would empty {} ({} candidates), keeping unfiltered pool",
            filter,
            slot,
            original.len()
        );
        original
    } else {
        narrowed
    }
}

/// Keep sights of an allowed class, and mounts that can carry one.
pub fn filter_sights_by_whitelist(
    catalog: &Catalog,
    pool: &[String],
    allowed_classes: &[String],
) -> Vec<String> {
    let allowed: Vec<&str> = allowed_classes.iter().map(String::as_str).collect();
    pool.iter()
        .filter(|tpl| {
            if catalog.is_of_any_base_class(tpl, &allowed) {
                return true;
            }
            if !catalog.is_of_base_class(tpl, base_classes::MOUNT) {
                return false;
            }
            catalog.get(tpl).is_some_and(|mount| {
                mount
                    .slots
                    .iter()
                    .filter(|s| constants::SCOPE_CAPABLE_SLOTS.contains(&s.name.as_str()))
                    .flat_map(|s| s.allowed())
                    .any(|child| catalog.is_of_any_base_class(child, &allowed))
            })
        })
        .cloned()
        .collect()
}

/// Low profile blocks under an optic, tall blocks behind a rear iron sight.
pub fn filter_gas_blocks(
    services: &AssemblyServices,
    request: &GenerationRequest,
    pool: &[String],
) -> Vec<String> {
    let config = services.config;
    if pool.len() > 1 && request.state.has_optic {
        pool.iter()
            .filter(|t| config.is_low_profile_gas_block(t))
            .cloned()
            .collect()
    } else if pool.len() > 1 && request.state.has_rear_iron_sight {
        pool.iter()
            .filter(|t| !config.is_low_profile_gas_block(t))
            .cloned()
            .collect()
    } else {
        pool.to_vec()
    }
}

pub fn filter_magazines_by_capacity(catalog: &Catalog, pool: &[String], min: u32) -> Vec<String> {
    pool.iter()
        .filter(|tpl| {
            catalog
                .get(tpl)
                .and_then(|t| t.max_ammo_capacity)
                .is_some_and(|cap| cap >= min)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sight_catalog() -> Catalog {
        Catalog::from_templates(vec![
            ItemTemplate::new("collimator", "sight"),
            ItemTemplate::new("optic_scope", "sight"),
            ItemTemplate::new("mount", "item"),
            ItemTemplate::new("red_dot", "collimator"),
            ItemTemplate::new("x8", "optic_scope"),
            ItemTemplate::new("ring_mount", "mount").with_slot("mod_scope", false, &["red_dot"]),
            ItemTemplate::new("rail_mount", "mount").with_slot("mod_scope", false, &["x8"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_whitelist_keeps_forwarding_mounts() {
        let catalog = sight_catalog();
        let pool = ids(&["red_dot", "x8", "ring_mount", "rail_mount"]);
        let narrowed = filter_sights_by_whitelist(&catalog, &pool, &ids(&["collimator"]));
        assert_eq!(narrowed, ids(&["red_dot", "ring_mount"]));
    }

    #[test]
    fn test_keep_non_empty_discards_empty_narrowing() {
        let original = ids(&["a", "b"]);
        assert_eq!(keep_non_empty(original.clone(), vec![], "test", "slot"), original);
        assert_eq!(keep_non_empty(original, ids(&["b"]), "test", "slot"), ids(&["b"]));
    }

    #[test]
    fn test_magazine_capacity_filter() {
        let catalog = Catalog::from_templates(vec![
            ItemTemplate::new("mag10", "magazine").with_capacity(10),
            ItemTemplate::new("mag30", "magazine").with_capacity(30),
            ItemTemplate::new("mag_unknown", "magazine"),
        ])
        .unwrap();
        let pool = ids(&["mag10", "mag30", "mag_unknown"]);
        assert_eq!(filter_magazines_by_capacity(&catalog, &pool, 20), ids(&["mag30"]));
        assert!(filter_magazines_by_capacity(&catalog, &pool, 60).is_empty());
    }
}
