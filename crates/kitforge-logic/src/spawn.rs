//! Spawn decisions — should a slot get an item at all?

use rand::Rng;

use crate::constants::is_ammo_slot;

/// Outcome of the spawn roll for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnDecision {
    /// Pick freely from the slot's pool.
    Spawn,
    /// Roll failed on a required slot; use the known-good default.
    DefaultMod,
    /// Leave the slot empty.
    Skip,
}

/// Decide a slot's fate from its spawn chance (percent) and requiredness.
///
/// Ammunition slots always spawn. A failed roll on a required slot falls back
/// to the default mod rather than leaving the slot empty.
pub fn decide(slot: &str, chance_percent: f64, required: bool, rng: &mut impl Rng) -> SpawnDecision {
    if is_ammo_slot(slot) {
        return SpawnDecision::Spawn;
    }

    if roll_chance(chance_percent, rng) {
        SpawnDecision::Spawn
    } else if required {
        SpawnDecision::DefaultMod
    } else {
        SpawnDecision::Skip
    }
}

/// Uniform roll in [0, 100) against a percent chance.
pub fn roll_chance(chance_percent: f64, rng: &mut impl Rng) -> bool {
    if chance_percent >= 100.0 {
        return true;
    }
    if chance_percent <= 0.0 {
        return false;
    }
    rng.gen_range(0.0..100.0) < chance_percent
}
