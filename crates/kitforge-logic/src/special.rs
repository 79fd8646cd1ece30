//! Special-case rules: armor tiers, co-dependent slots, cylinder magazines,
//! mod limits.
//!
//! Most of these run right after an item is attached and change what later
//! slots see (spawn chances, pools, tracking state). Slot order therefore
//! decides which rules are visible to which slots.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::catalog::{Catalog, ItemTemplate, SlotDef};
use crate::config::{AssemblyConfig, ModLimits};
use crate::constants::{self, base_classes, slots};
use crate::draw::ExhaustibleDraw;
use crate::pool::{keep_non_empty, SlotTarget};
use crate::report::AssemblyIssue;
use crate::request::{AssemblyState, GenerationRequest};
use crate::selector;
use crate::services::AssemblyServices;

// ── Armor plates ───────────────────────────────────────────────────────

/// Narrow a plate pool to one armor tier drawn from the level bracket.
///
/// With no weighting for this bot the pool is returned as is. If no plate
/// of the drawn tier exists, the slot's built-in plate and then the default
/// preset's plate are tried before giving up.
pub fn filter_plates(
    services: &AssemblyServices,
    request: &GenerationRequest,
    target: SlotTarget,
    pool: Vec<String>,
    rng: &mut impl Rng,
) -> Result<Vec<String>, AssemblyIssue> {
    let role = services.config.role(&request.bot.role);
    if !role.filter_plates_by_level {
        return Ok(pool);
    }
    let Some(weights) = role
        .plate_weighting_for(request.bot.level)
        .and_then(|w| w.values.get(target.name()))
    else {
        return Ok(pool);
    };

    let Some(tier) = draw_armor_tier(weights.iter().map(|(c, w)| (*c, *w)), rng) else {
        return Ok(pool);
    };

    let matching: Vec<String> = pool
        .iter()
        .filter(|tpl| {
            services
                .catalog
                .get(tpl)
                .is_some_and(|t| t.armor_class == Some(tier))
        })
        .cloned()
        .collect();
    if !matching.is_empty() {
        return Ok(matching);
    }

    log::debug!(
        "No tier {} plate for {}/{}, trying defaults",
        tier,
        target.parent.id,
        target.name()
    );
    let usable = |plate: &str| {
        services.catalog.contains(plate)
            && target.slot.allows(plate)
            && !request.conflicts.contains(plate)
    };
    if let Some(default) = target.slot.default_plate.as_deref().filter(|&p| usable(p)) {
        return Ok(vec![default.to_string()]);
    }
    let preset_plate = request
        .root_tpl()
        .and_then(|root| services.presets.default_preset(root))
        .and_then(|p| p.item_for_slot(&target.parent.id, target.name()))
        .filter(|&p| usable(p));
    if let Some(plate) = preset_plate {
        return Ok(vec![plate.to_string()]);
    }

    Err(AssemblyIssue::UnresolvablePlate {
        parent_tpl: target.parent.id.clone(),
        slot: target.name().to_string(),
    })
}

/// Weighted pick of an armor class. `None` when no weight is positive.
pub fn draw_armor_tier(
    weights: impl IntoIterator<Item = (u8, f64)>,
    rng: &mut impl Rng,
) -> Option<u8> {
    let (classes, values): (Vec<u8>, Vec<f64>) = weights.into_iter().unzip();
    let dist = WeightedIndex::new(&values).ok()?;
    Some(classes[dist.sample(rng)])
}

// ── Co-dependent slots ─────────────────────────────────────────────────

/// Adjust spawn chances and pools after `tpl` was attached to `target`.
pub fn apply_forcing(
    services: &AssemblyServices,
    request: &mut GenerationRequest,
    target: SlotTarget,
    tpl: &str,
) {
    let catalog = services.catalog;
    let Some(chosen) = catalog.get(tpl) else {
        return;
    };
    let slot = target.name();

    if mount_holds_scope(catalog, slot, tpl) {
        request
            .spawn_chances
            .set_all(constants::SCOPE_SLOTS, 100.0);
        // Mounts rarely come with pools of their own.
        if target.randomisable {
            for scope_slot in chosen.slots.iter().filter(|s| constants::is_scope_slot(&s.name)) {
                let pool = hydrated_pool(services, request, tpl, &scope_slot.name);
                request.mod_pool.set(tpl, &scope_slot.name, pool);
            }
        }
    }

    if constants::MUZZLE_SLOTS.contains(&slot)
        && catalog.is_of_base_class(tpl, base_classes::MUZZLE_ADAPTER)
    {
        request
            .spawn_chances
            .set_all(constants::MUZZLE_SLOTS, constants::MUZZLE_FORCE_CHANCE);
    }

    if is_front_or_rear_sight(services.config, slot, tpl) {
        request.spawn_chances.set_all(constants::SIGHT_SLOTS, 100.0);
    }

    // Launchers take the same rail as a sub-handguard.
    if slot == slots::HANDGUARD
        && chosen.slot(slots::HANDGUARD).is_some()
        && !request.has_slot_filled(slots::LAUNCHER)
    {
        request.spawn_chances.set(slots::HANDGUARD, 100.0);
    }

    if slot == slots::STOCK {
        let holds_stock = chosen
            .slots
            .iter()
            .any(|s| constants::STOCK_SLOTS.contains(&s.name.as_str()));
        if holds_stock || services.config.role(&request.bot.role).force_stock {
            request.spawn_chances.set_all(constants::STOCK_SLOTS, 100.0);
        }
    }
}

/// A mount placed where an optic could go.
pub fn mount_holds_scope(catalog: &Catalog, slot: &str, tpl: &str) -> bool {
    constants::SCOPE_CAPABLE_SLOTS.contains(&slot) && catalog.is_of_base_class(tpl, base_classes::MOUNT)
}

pub fn is_front_or_rear_sight(config: &AssemblyConfig, slot: &str, tpl: &str) -> bool {
    if slot == slots::GAS_BLOCK {
        return config.has_integrated_front_sight(tpl);
    }
    constants::SIGHT_SLOTS.contains(&slot)
}

/// Give an attached item pools for those of its slots that have none yet.
///
/// Pools already present (declared by the caller, or injected by mount
/// forcing) are left alone. Slots without a filter list stay unpooled.
pub fn hydrate_child_pools(
    services: &AssemblyServices,
    request: &mut GenerationRequest,
    child: &ItemTemplate,
) {
    for slot in child.slots.iter().filter(|s| s.filter.is_some()) {
        if request.mod_pool.pool(&child.id, &slot.name).is_some() {
            continue;
        }
        let pool = hydrated_pool(services, request, &child.id, &slot.name);
        request.mod_pool.set(&child.id, &slot.name, pool);
    }
}

fn hydrated_pool(
    services: &AssemblyServices,
    request: &GenerationRequest,
    parent_tpl: &str,
    slot: &str,
) -> Vec<String> {
    let dynamic = services.hydrator.dynamic_pool(parent_tpl, slot);
    let blacklist = services
        .hydrator
        .blacklist(&request.bot.role, request.bot.level);
    let filtered = dynamic
        .iter()
        .filter(|id| !blacklist.contains(id))
        .cloned()
        .collect();
    keep_non_empty(dynamic, filtered, "blacklist", slot)
}

// ── Tracking & limits ──────────────────────────────────────────────────

/// Record what an attachment contributes to later decisions.
pub fn track_attachment(
    catalog: &Catalog,
    config: &AssemblyConfig,
    state: &mut AssemblyState,
    slot: &str,
    tpl: &str,
) {
    if catalog.is_of_any_base_class(tpl, constants::OPTIC_CLASSES) {
        state.has_optic = true;
        state.scope_count += 1;
    }
    if slot == slots::SIGHT_FRONT || (slot == slots::GAS_BLOCK && config.has_integrated_front_sight(tpl)) {
        state.has_front_iron_sight = true;
    }
    if slot == slots::SIGHT_REAR {
        state.has_rear_iron_sight = true;
    }
    if catalog.is_of_any_base_class(tpl, constants::LIGHT_LASER_CLASSES) {
        state.light_laser_count += 1;
    }
}

/// Would attaching `tpl` push the weapon past its scope or light limits?
///
/// Once the scope limit is hit, mounts that can only hold optics are
/// refused as well since they would stay empty.
pub fn exceeds_mod_limits(
    catalog: &Catalog,
    limits: &ModLimits,
    state: &AssemblyState,
    tpl: &str,
) -> bool {
    if let Some(limit) = limits.scope_limit {
        if state.scope_count >= limit {
            if catalog.is_of_any_base_class(tpl, constants::OPTIC_CLASSES) {
                return true;
            }
            let scope_only_mount = catalog.is_of_base_class(tpl, base_classes::MOUNT)
                && catalog.get(tpl).is_some_and(|t| {
                    t.has_slots() && t.slots.iter().all(|s| constants::is_scope_slot(&s.name))
                });
            if scope_only_mount {
                return true;
            }
        }
    }
    if let Some(limit) = limits.light_laser_limit {
        if state.light_laser_count >= limit
            && catalog.is_of_any_base_class(tpl, constants::LIGHT_LASER_CLASSES)
        {
            return true;
        }
    }
    false
}

// ── Cylinder magazines ─────────────────────────────────────────────────

/// A cartridge choice shared by every chamber of a cylinder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CamoraFill {
    pub cartridge: String,
    pub slots: Vec<String>,
}

/// Pick one cartridge for all camora slots of a cylinder magazine.
///
/// The pool is the declared `cartridges` pool if present, else the union of
/// declared camora pools, else the union of the template's camora filters.
pub fn choose_camora_fill(
    services: &AssemblyServices,
    request: &GenerationRequest,
    magazine: &ItemTemplate,
    rng: &mut impl Rng,
) -> Result<CamoraFill, AssemblyIssue> {
    let unresolvable = || AssemblyIssue::UnresolvableCamora {
        magazine_tpl: magazine.id.clone(),
    };

    let camoras: Vec<&SlotDef> = magazine
        .slots
        .iter()
        .filter(|s| constants::is_camora_slot(&s.name))
        .collect();
    let Some(first) = camoras.first().copied() else {
        return Err(unresolvable());
    };
    // Every chamber takes the same round, so one check covers them all.
    let target = SlotTarget {
        parent: magazine,
        slot: first,
        randomisable: false,
        weapon: true,
    };

    let mut pool = camora_pool(request, magazine);
    if let Some(ammo) = request.ammo_tpl.as_deref() {
        let pinned = pool.iter().filter(|t| *t == ammo).cloned().collect();
        pool = keep_non_empty(pool, pinned, "ammo", slots::CAMORA_FIRST);
    }

    let mut draw = ExhaustibleDraw::new(pool);
    while let Some(tpl) = draw.draw(rng) {
        if selector::is_compatible(services, request, target, &tpl) {
            return Ok(CamoraFill {
                cartridge: tpl,
                slots: camoras.iter().map(|s| s.name.clone()).collect(),
            });
        }
    }
    Err(unresolvable())
}

fn camora_pool(request: &GenerationRequest, magazine: &ItemTemplate) -> Vec<String> {
    if let Some(cartridges) = request.mod_pool.pool(&magazine.id, slots::CARTRIDGES) {
        if !cartridges.is_empty() {
            return cartridges.to_vec();
        }
    }

    let mut merged: Vec<String> = Vec::new();
    if let Some(declared) = request.mod_pool.slots_for(&magazine.id) {
        for (_, ids) in declared.iter().filter(|(name, _)| constants::is_camora_slot(name)) {
            push_unique(&mut merged, ids);
        }
    }
    if merged.is_empty() {
        for slot in magazine.slots.iter().filter(|s| constants::is_camora_slot(&s.name)) {
            push_unique(&mut merged, slot.allowed());
        }
    }
    merged
}

fn push_unique(merged: &mut Vec<String>, ids: &[String]) {
    for id in ids {
        if !merged.contains(id) {
            merged.push(id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_armor_tier_follows_weights() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let tier = draw_armor_tier(vec![(4, 0.5), (5, 0.5), (6, 0.0)], &mut rng);
            assert!(matches!(tier, Some(4) | Some(5)));
        }
        assert_eq!(draw_armor_tier(vec![(4, 0.0)], &mut rng), None);
        assert_eq!(draw_armor_tier(Vec::new(), &mut rng), None);
    }

    #[test]
    fn test_scope_limit_blocks_optics_and_scope_mounts() {
        let catalog = Catalog::from_templates(vec![
            ItemTemplate::new("mount", "item"),
            ItemTemplate::new("collimator", "sight"),
            ItemTemplate::new("red_dot", "collimator"),
            ItemTemplate::new("scope_ring", "mount").with_slot("mod_scope", false, &["red_dot"]),
            ItemTemplate::new("rail", "mount")
                .with_slot("mod_scope", false, &["red_dot"])
                .with_slot("mod_tactical", false, &[]),
        ])
        .unwrap();
        let limits = ModLimits {
            scope_limit: Some(1),
            light_laser_limit: None,
        };
        let mut state = AssemblyState::default();
        assert!(!exceeds_mod_limits(&catalog, &limits, &state, "red_dot"));

        state.scope_count = 1;
        assert!(exceeds_mod_limits(&catalog, &limits, &state, "red_dot"));
        assert!(exceeds_mod_limits(&catalog, &limits, &state, "scope_ring"));
        assert!(!exceeds_mod_limits(&catalog, &limits, &state, "rail"));
    }

    #[test]
    fn test_gas_block_front_sight_counts_as_sight() {
        let mut config = AssemblyConfig::default();
        config.integrated_front_sight_gas_blocks.push("gb_post".to_string());
        assert!(is_front_or_rear_sight(&config, "mod_gas_block", "gb_post"));
        assert!(!is_front_or_rear_sight(&config, "mod_gas_block", "gb_low"));
        assert!(is_front_or_rear_sight(&config, "mod_sight_rear", "anything"));
    }
}
