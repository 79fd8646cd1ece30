//! Slot processing order.
//!
//! Later slots read state set by earlier ones (a gas block choice depends on
//! whether an optic is already on), so load-bearing slots go first.

use crate::constants::slots;

const MOUNT_PRIORITY: &[&str] = &[
    slots::SCOPE,
    slots::SCOPE_000,
    slots::SCOPE_001,
    slots::SCOPE_002,
    slots::SCOPE_003,
    slots::MOUNT,
    slots::MOUNT_000,
    slots::MOUNT_001,
    slots::MOUNT_002,
    slots::MOUNT_003,
    slots::MOUNT_004,
];

const ITEM_PRIORITY: &[&str] = &[
    slots::HANDGUARD,
    slots::BARREL,
    slots::MOUNT_001,
    slots::RECEIVER,
    slots::PISTOL_GRIP,
    slots::GAS_BLOCK,
    slots::STOCK,
    slots::MOUNT,
    slots::SCOPE,
];

/// Reorder slot names: prioritised slots first, the rest in original order.
///
/// Never adds or drops a name.
pub fn sort_slots(slot_names: &[String], parent_is_mount: bool) -> Vec<String> {
    let priority = if parent_is_mount {
        MOUNT_PRIORITY
    } else {
        ITEM_PRIORITY
    };

    let mut sorted: Vec<String> = priority
        .iter()
        .filter(|p| slot_names.iter().any(|s| s == *p))
        .map(|p| p.to_string())
        .collect();
    sorted.extend(
        slot_names
            .iter()
            .filter(|s| !priority.contains(&s.as_str()))
            .cloned(),
    );
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_item_priority() {
        let input = names(&[
            "mod_scope",
            "mod_muzzle",
            "mod_stock",
            "mod_handguard",
            "mod_magazine",
            "mod_gas_block",
        ]);
        let sorted = sort_slots(&input, false);
        assert_eq!(
            sorted,
            names(&[
                "mod_handguard",
                "mod_gas_block",
                "mod_stock",
                "mod_scope",
                "mod_muzzle",
                "mod_magazine",
            ])
        );
    }

    #[test]
    fn test_mount_priority() {
        let input = names(&["mod_tactical", "mod_mount", "mod_scope_001", "mod_scope"]);
        let sorted = sort_slots(&input, true);
        assert_eq!(
            sorted,
            names(&["mod_scope", "mod_scope_001", "mod_mount", "mod_tactical"])
        );
    }

    #[test]
    fn test_sort_is_permutation() {
        let input = names(&["c", "mod_barrel", "a", "mod_reciever", "b"]);
        let mut sorted = sort_slots(&input, false);
        let mut original = input.clone();
        sorted.sort();
        original.sort();
        assert_eq!(sorted, original);
    }
}
