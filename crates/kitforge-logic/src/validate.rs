//! Structural checks for an assembled tree.
//!
//! Used by the simulation harness and tests to confirm that whatever the
//! assembler produced is still a well-formed attachment tree.

use std::collections::{HashMap, HashSet};

use crate::catalog::Catalog;
use crate::request::AssembledItem;

/// One structural defect found in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeIssue {
    /// Node names a parent that is not in the tree.
    Orphan { id: String, parent_id: String },
    /// Two children occupy the same slot of one parent.
    DuplicateSlot { parent_id: String, slot: String },
    /// Node sits in a slot its parent template does not declare.
    UnknownSlot { id: String, slot: String },
    /// Node's template is not allowed by the parent slot's filter.
    NotAllowed { id: String, tpl: String, slot: String },
    /// Required slot on a node was left empty.
    EmptyRequired { parent_id: String, slot: String },
    /// Node template is not in the catalog.
    UnknownTemplate { id: String, tpl: String },
    DuplicateId { id: String },
}

/// Check `items` against the catalog. An empty result means the tree is sound.
///
/// `check_required` also reports empty required slots, which a successful
/// assembly may still leave behind when nothing compatible existed.
pub fn validate_tree(catalog: &Catalog, items: &[AssembledItem], check_required: bool) -> Vec<TreeIssue> {
    let mut issues = Vec::new();
    let mut by_id: HashMap<&str, &AssembledItem> = HashMap::new();
    for item in items {
        if by_id.insert(&item.id, item).is_some() {
            issues.push(TreeIssue::DuplicateId { id: item.id.clone() });
        }
    }

    let mut occupied: HashSet<(&str, &str)> = HashSet::new();
    for item in items {
        if !catalog.contains(&item.tpl) {
            issues.push(TreeIssue::UnknownTemplate {
                id: item.id.clone(),
                tpl: item.tpl.clone(),
            });
        }

        let (Some(parent_id), Some(slot)) = (item.parent_id.as_deref(), item.slot_id.as_deref()) else {
            continue;
        };
        let Some(parent) = by_id.get(parent_id) else {
            issues.push(TreeIssue::Orphan {
                id: item.id.clone(),
                parent_id: parent_id.to_string(),
            });
            continue;
        };
        if !occupied.insert((parent_id, slot)) {
            issues.push(TreeIssue::DuplicateSlot {
                parent_id: parent_id.to_string(),
                slot: slot.to_string(),
            });
        }

        let Some(parent_template) = catalog.get(&parent.tpl) else {
            continue;
        };
        match parent_template.slot(slot) {
            None => issues.push(TreeIssue::UnknownSlot {
                id: item.id.clone(),
                slot: slot.to_string(),
            }),
            Some(def) if def.filter.is_some() && !def.allows(&item.tpl) => {
                issues.push(TreeIssue::NotAllowed {
                    id: item.id.clone(),
                    tpl: item.tpl.clone(),
                    slot: slot.to_string(),
                })
            }
            Some(_) => {}
        }
    }

    if check_required {
        for item in items {
            let Some(template) = catalog.get(&item.tpl) else {
                continue;
            };
            for slot in template.slots.iter().filter(|s| s.required) {
                if !occupied.contains(&(item.id.as_str(), slot.name.as_str())) {
                    issues.push(TreeIssue::EmptyRequired {
                        parent_id: item.id.clone(),
                        slot: slot.name.clone(),
                    });
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemTemplate;

    fn catalog() -> Catalog {
        Catalog::from_templates(vec![
            ItemTemplate::new("rifle", "weapon")
                .with_slot("mod_stock", true, &["s1"])
                .with_slot("mod_muzzle", false, &["m1"]),
            ItemTemplate::new("s1", "stock"),
            ItemTemplate::new("m1", "muzzle"),
        ])
        .unwrap()
    }

    #[test]
    fn test_sound_tree() {
        let items = vec![
            AssembledItem::root("w", "rifle"),
            AssembledItem::child("a".into(), "s1", "w", "mod_stock"),
        ];
        assert!(validate_tree(&catalog(), &items, true).is_empty());
    }

    #[test]
    fn test_structural_defects() {
        let items = vec![
            AssembledItem::root("w", "rifle"),
            AssembledItem::child("a".into(), "m1", "w", "mod_muzzle"),
            AssembledItem::child("b".into(), "m1", "w", "mod_muzzle"),
            AssembledItem::child("c".into(), "s1", "w", "mod_tactical"),
            AssembledItem::child("d".into(), "s1", "ghost", "mod_stock"),
        ];
        let issues = validate_tree(&catalog(), &items, true);
        assert!(issues.contains(&TreeIssue::DuplicateSlot {
            parent_id: "w".into(),
            slot: "mod_muzzle".into()
        }));
        assert!(issues.contains(&TreeIssue::UnknownSlot {
            id: "c".into(),
            slot: "mod_tactical".into()
        }));
        assert!(issues.contains(&TreeIssue::Orphan {
            id: "d".into(),
            parent_id: "ghost".into()
        }));
        assert!(issues.contains(&TreeIssue::EmptyRequired {
            parent_id: "w".into(),
            slot: "mod_stock".into()
        }));
    }

    #[test]
    fn test_filter_violation() {
        let items = vec![
            AssembledItem::root("w", "rifle"),
            AssembledItem::child("a".into(), "m1", "w", "mod_stock"),
        ];
        let issues = validate_tree(&catalog(), &items, false);
        assert_eq!(
            issues,
            vec![TreeIssue::NotAllowed {
                id: "a".into(),
                tpl: "m1".into(),
                slot: "mod_stock".into()
            }]
        );
    }
}
