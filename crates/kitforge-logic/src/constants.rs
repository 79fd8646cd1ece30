//! Slot names and base class ids the assembly rules key off.
//!
//! These are plain `&str` constants with no catalog dependency. Content packs
//! must use the same names for the special-case handlers to fire.

pub mod slots {
    // Structural
    pub const HANDGUARD: &str = "mod_handguard";
    pub const BARREL: &str = "mod_barrel";
    pub const RECEIVER: &str = "mod_reciever";
    pub const PISTOL_GRIP: &str = "mod_pistol_grip";
    pub const GAS_BLOCK: &str = "mod_gas_block";
    pub const LAUNCHER: &str = "mod_launcher";
    // Mounts & optics
    pub const MOUNT: &str = "mod_mount";
    pub const MOUNT_000: &str = "mod_mount_000";
    pub const MOUNT_001: &str = "mod_mount_001";
    pub const MOUNT_002: &str = "mod_mount_002";
    pub const MOUNT_003: &str = "mod_mount_003";
    pub const MOUNT_004: &str = "mod_mount_004";
    pub const SCOPE: &str = "mod_scope";
    pub const SCOPE_000: &str = "mod_scope_000";
    pub const SCOPE_001: &str = "mod_scope_001";
    pub const SCOPE_002: &str = "mod_scope_002";
    pub const SCOPE_003: &str = "mod_scope_003";
    pub const SIGHT_FRONT: &str = "mod_sight_front";
    pub const SIGHT_REAR: &str = "mod_sight_rear";
    // Muzzle
    pub const MUZZLE: &str = "mod_muzzle";
    pub const MUZZLE_000: &str = "mod_muzzle_000";
    pub const MUZZLE_001: &str = "mod_muzzle_001";
    // Stock
    pub const STOCK: &str = "mod_stock";
    pub const STOCK_000: &str = "mod_stock_000";
    pub const STOCK_001: &str = "mod_stock_001";
    pub const STOCK_AKMS: &str = "mod_stock_akms";
    // Ammunition
    pub const MAGAZINE: &str = "mod_magazine";
    pub const CHAMBER: &str = "patron_in_weapon";
    pub const CHAMBER_000: &str = "patron_in_weapon_000";
    pub const CHAMBER_001: &str = "patron_in_weapon_001";
    pub const CARTRIDGES: &str = "cartridges";
    pub const CAMORA_PREFIX: &str = "camora";
    pub const CAMORA_FIRST: &str = "camora_000";
    // Armor plates
    pub const FRONT_PLATE: &str = "front_plate";
    pub const BACK_PLATE: &str = "back_plate";
    pub const SIDE_PLATE: &str = "side_plate";
    pub const LEFT_SIDE_PLATE: &str = "left_side_plate";
    pub const RIGHT_SIDE_PLATE: &str = "right_side_plate";
}

pub mod base_classes {
    pub const WEAPON: &str = "weapon";
    pub const MOUNT: &str = "mount";
    pub const SIGHT: &str = "sight";
    pub const IRON_SIGHT: &str = "iron_sight";
    pub const COLLIMATOR: &str = "collimator";
    pub const COMPACT_COLLIMATOR: &str = "compact_collimator";
    pub const ASSAULT_SCOPE: &str = "assault_scope";
    pub const OPTIC_SCOPE: &str = "optic_scope";
    pub const SPECIAL_SCOPE: &str = "special_scope";
    pub const MUZZLE_ADAPTER: &str = "muzzle_adapter";
    pub const MAGAZINE: &str = "magazine";
    pub const CYLINDER_MAGAZINE: &str = "cylinder_magazine";
    pub const AMMO: &str = "ammo";
    pub const ARMOR_PLATE: &str = "armor_plate";
    pub const FLASHLIGHT: &str = "flashlight";
    pub const LIGHT_LASER: &str = "light_laser";
    pub const TACTICAL_COMBO: &str = "tactical_combo";
}

/// Every slot that can hold an optic directly.
pub const SCOPE_SLOTS: &[&str] = &[
    slots::SCOPE,
    slots::SCOPE_000,
    slots::SCOPE_001,
    slots::SCOPE_002,
    slots::SCOPE_003,
];

/// Slots where a mount may be placed to carry an optic.
pub const SCOPE_CAPABLE_SLOTS: &[&str] = &[
    slots::SCOPE,
    slots::SCOPE_000,
    slots::SCOPE_001,
    slots::SCOPE_002,
    slots::SCOPE_003,
    slots::MOUNT,
    slots::MOUNT_000,
];

pub const MOUNT_SLOTS: &[&str] = &[
    slots::MOUNT,
    slots::MOUNT_000,
    slots::MOUNT_001,
    slots::MOUNT_002,
    slots::MOUNT_003,
    slots::MOUNT_004,
];

pub const MUZZLE_SLOTS: &[&str] = &[slots::MUZZLE, slots::MUZZLE_000, slots::MUZZLE_001];

pub const SIGHT_SLOTS: &[&str] = &[slots::SIGHT_FRONT, slots::SIGHT_REAR];

pub const STOCK_SLOTS: &[&str] = &[
    slots::STOCK,
    slots::STOCK_000,
    slots::STOCK_001,
    slots::STOCK_AKMS,
];

/// Slots that carry ammunition; these always spawn.
pub const AMMO_SLOTS: &[&str] = &[
    slots::MAGAZINE,
    slots::CHAMBER,
    slots::CHAMBER_000,
    slots::CHAMBER_001,
    slots::CARTRIDGES,
];

/// Removable armor plate slots, filtered by armor tier.
pub const PLATE_SLOTS: &[&str] = &[
    slots::FRONT_PLATE,
    slots::BACK_PLATE,
    slots::SIDE_PLATE,
    slots::LEFT_SIDE_PLATE,
    slots::RIGHT_SIDE_PLATE,
];

/// Base classes that count as an optic for gas block and mod limit decisions.
pub const OPTIC_CLASSES: &[&str] = &[
    base_classes::COLLIMATOR,
    base_classes::COMPACT_COLLIMATOR,
    base_classes::ASSAULT_SCOPE,
    base_classes::OPTIC_SCOPE,
    base_classes::SPECIAL_SCOPE,
];

pub const LIGHT_LASER_CLASSES: &[&str] = &[
    base_classes::FLASHLIGHT,
    base_classes::LIGHT_LASER,
    base_classes::TACTICAL_COMBO,
];

/// Percent chance used when a muzzle adapter asks for a device on top.
pub const MUZZLE_FORCE_CHANCE: f64 = 95.0;

/// Share of a pool that may be rejected before a selection gives up.
pub const MAX_BLOCKED_FRACTION: f64 = 0.75;

pub fn is_ammo_slot(slot: &str) -> bool {
    AMMO_SLOTS.contains(&slot)
}

pub fn is_plate_slot(slot: &str) -> bool {
    PLATE_SLOTS.contains(&slot)
}

pub fn is_scope_slot(slot: &str) -> bool {
    SCOPE_SLOTS.contains(&slot)
}

pub fn is_camora_slot(slot: &str) -> bool {
    slot.starts_with(slots::CAMORA_PREFIX)
}

/// Chamber and cartridge slots, pinned to the request's ammunition.
pub fn is_cartridge_slot(slot: &str) -> bool {
    slot == slots::CARTRIDGES || slot.starts_with(slots::CHAMBER)
}
