//! Assembly driver — walks the slot tree of a root item and fills it.
//!
//! The walk is depth-first: every child is fully expanded before its next
//! sibling is considered, so forcing rules applied by a child (a scope mount
//! raising scope chances, say) are visible to the siblings that follow. An
//! explicit frame stack replaces recursion; each frame remembers the slots
//! still to process on one item. Template ids on the stack form the active
//! path, which guards against cyclic catalogs.

use rand::Rng;

use crate::catalog::ItemTemplate;
use crate::constants::{self, base_classes};
use crate::ordering::sort_slots;
use crate::pool::{resolve_pool, SlotTarget};
use crate::report::{AssemblyError, AssemblyIssue, AssemblyReport, SlotOutcome};
use crate::request::{AssembledItem, GenerationRequest};
use crate::selector::{self, NotFoundReason, SelectionResult};
use crate::services::AssemblyServices;
use crate::spawn::{self, SpawnDecision};
use crate::special;

/// Which rule set applies to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    /// Weapon narrowing, tracking, mod limits and forcing all apply.
    Weapon,
    /// Armor, rigs, helmets. Plate handling only.
    Equipment,
}

impl TreeKind {
    fn is_weapon(self) -> bool {
        self == TreeKind::Weapon
    }
}

/// Fill every slot of a weapon rooted at `request.root_id`.
pub fn assemble_weapon(
    services: &AssemblyServices,
    request: &mut GenerationRequest,
    rng: &mut impl Rng,
) -> Result<AssemblyReport, AssemblyError> {
    assemble(services, request, TreeKind::Weapon, rng)
}

/// Fill every slot of a piece of equipment rooted at `request.root_id`.
pub fn assemble_equipment(
    services: &AssemblyServices,
    request: &mut GenerationRequest,
    rng: &mut impl Rng,
) -> Result<AssemblyReport, AssemblyError> {
    assemble(services, request, TreeKind::Equipment, rng)
}

/// One item whose slots are being worked through.
struct Frame {
    item_id: String,
    tpl: String,
    /// Remaining slots, next one last.
    pending: Vec<String>,
    depth: usize,
}

impl Frame {
    fn new(
        services: &AssemblyServices,
        request: &GenerationRequest,
        item_id: String,
        template: &ItemTemplate,
        depth: usize,
    ) -> Self {
        let mut pending = scheduled_slots(services, request, template);
        pending.reverse();
        Self {
            item_id,
            tpl: template.id.clone(),
            pending,
            depth,
        }
    }
}

/// Drive the walk. Issues never abort it; only a bad root does.
pub fn assemble(
    services: &AssemblyServices,
    request: &mut GenerationRequest,
    kind: TreeKind,
    rng: &mut impl Rng,
) -> Result<AssemblyReport, AssemblyError> {
    let root = request
        .root()
        .cloned()
        .ok_or_else(|| AssemblyError::MissingRoot(request.root_id.clone()))?;
    let root_template = services
        .catalog
        .get(&root.tpl)
        .ok_or_else(|| AssemblyError::UnknownRootTemplate(root.tpl.clone()))?;

    request.conflicts.extend(&root_template.conflicting_items);

    let mut report = AssemblyReport::default();
    let max_depth = services.config.max_depth;
    let mut stack = vec![Frame::new(services, request, root.id, root_template, 0)];

    while let Some(frame) = stack.last_mut() {
        let Some(slot) = frame.pending.pop() else {
            stack.pop();
            continue;
        };
        let parent_id = frame.item_id.clone();
        let parent_tpl = frame.tpl.clone();
        let depth = frame.depth;

        let Some((child_id, child_tpl)) =
            fill_slot(services, request, kind, &parent_id, &parent_tpl, &slot, &mut report, rng)
        else {
            continue;
        };

        if stack.iter().any(|f| f.tpl == child_tpl) {
            report.issue(AssemblyIssue::CycleDetected { tpl: child_tpl });
            continue;
        }
        if depth + 1 > max_depth {
            report.issue(AssemblyIssue::DepthLimit {
                tpl: child_tpl,
                limit: max_depth,
            });
            continue;
        }
        if let Some(template) = services.catalog.get(&child_tpl) {
            stack.push(Frame::new(services, request, child_id, template, depth + 1));
        }
    }

    log::debug!(
        "Assembled {} ({:?}): {} attached, {} issues",
        root.tpl,
        kind,
        report.attached,
        report.issues.len()
    );
    Ok(report)
}

/// Slots to visit on `template`, in processing order.
///
/// Declared pool slots come first in declared order, followed by required
/// template slots that the pool does not mention.
pub fn scheduled_slots(
    services: &AssemblyServices,
    request: &GenerationRequest,
    template: &ItemTemplate,
) -> Vec<String> {
    let mut names: Vec<String> = request
        .mod_pool
        .slots_for(&template.id)
        .map(|slots| slots.keys().cloned().collect())
        .unwrap_or_default();
    for slot in template.slots.iter().filter(|s| s.required) {
        if !names.contains(&slot.name) {
            names.push(slot.name.clone());
        }
    }
    let is_mount = services
        .catalog
        .is_of_base_class(&template.id, base_classes::MOUNT);
    sort_slots(&names, is_mount)
}

/// Process one slot. Returns the attached child when it should be descended.
#[allow(clippy::too_many_arguments)]
fn fill_slot(
    services: &AssemblyServices,
    request: &mut GenerationRequest,
    kind: TreeKind,
    parent_id: &str,
    parent_tpl: &str,
    slot_name: &str,
    report: &mut AssemblyReport,
    rng: &mut impl Rng,
) -> Option<(String, String)> {
    let parent = services.catalog.get(parent_tpl)?;
    let Some(slot) = parent.slot(slot_name) else {
        report.issue(AssemblyIssue::MissingSlotTemplate {
            parent_tpl: parent_tpl.to_string(),
            slot: slot_name.to_string(),
        });
        report.record(parent_id, slot_name, SlotOutcome::Skipped);
        return None;
    };

    // Pre-filled by the caller.
    if request
        .children_of(parent_id)
        .any(|c| c.slot_id.as_deref() == Some(slot_name))
    {
        return None;
    }

    let role = services.config.role(&request.bot.role);
    let required = slot.required || role.forces_required(slot_name);
    if slot.filter.is_none() {
        report.issue(AssemblyIssue::MalformedCatalogEntry {
            parent_tpl: parent_tpl.to_string(),
            slot: slot_name.to_string(),
        });
        let outcome = if required {
            SlotOutcome::FailedRequired
        } else {
            SlotOutcome::Empty(NotFoundReason::NoCandidates)
        };
        report.record(parent_id, slot_name, outcome);
        return None;
    }

    let target = SlotTarget {
        parent,
        slot,
        randomisable: role.is_randomisable(slot_name, request.bot.level),
        weapon: kind.is_weapon(),
    };

    let chance = request.spawn_chances.get(slot_name);
    let decision = spawn::decide(slot_name, chance, required, rng);
    if decision == SpawnDecision::Skip {
        report.record(parent_id, slot_name, SlotOutcome::Skipped);
        return None;
    }

    let mut pool = resolve_pool(services, request, target, decision);
    if constants::is_plate_slot(slot_name) {
        match special::filter_plates(services, request, target, pool, rng) {
            Ok(plates) => pool = plates,
            Err(issue) => {
                report.issue(issue);
                let outcome = if required {
                    SlotOutcome::FailedRequired
                } else {
                    SlotOutcome::Empty(NotFoundReason::NoCandidates)
                };
                report.record(parent_id, slot_name, outcome);
                return None;
            }
        }
    }

    match selector::select(services, request, target, &pool, required, rng) {
        SelectionResult::Found(tpl) => attach(services, request, target, parent_id, tpl, report, rng),
        SelectionResult::NotFound(reason) => {
            let parent_tpl = parent_tpl.to_string();
            let slot = slot_name.to_string();
            if required {
                report.issue(AssemblyIssue::RequiredSlotUnfillable { parent_tpl, slot });
                report.record(parent_id, slot_name, SlotOutcome::FailedRequired);
            } else {
                let issue = match reason {
                    NotFoundReason::AllConflicting => {
                        AssemblyIssue::AllConflicting { parent_tpl, slot }
                    }
                    _ => AssemblyIssue::NoCandidates { parent_tpl, slot },
                };
                report.issue(issue);
                report.record(parent_id, slot_name, SlotOutcome::Empty(reason));
            }
            None
        }
    }
}

/// Append `tpl` under `parent_id` and run the post-attach rules.
fn attach(
    services: &AssemblyServices,
    request: &mut GenerationRequest,
    target: SlotTarget,
    parent_id: &str,
    tpl: String,
    report: &mut AssemblyReport,
    rng: &mut impl Rng,
) -> Option<(String, String)> {
    let catalog = services.catalog;
    let slot_name = target.name();
    let id = services.ids.next_id();
    request
        .items
        .push(AssembledItem::child(id.clone(), &tpl, parent_id, slot_name));
    report.attached += 1;

    let chosen = catalog.get(&tpl)?;
    request.conflicts.extend(&chosen.conflicting_items);
    if target.weapon {
        special::track_attachment(catalog, services.config, &mut request.state, slot_name, &tpl);
        special::apply_forcing(services, request, target, &tpl);
    }

    if catalog.is_of_base_class(&tpl, base_classes::CYLINDER_MAGAZINE) {
        let outcome = match special::choose_camora_fill(services, request, chosen, rng) {
            Ok(fill) => {
                for camora in &fill.slots {
                    request.items.push(AssembledItem::child(
                        services.ids.next_id(),
                        &fill.cartridge,
                        &id,
                        camora,
                    ));
                    report.attached += 1;
                }
                if let Some(cartridge) = catalog.get(&fill.cartridge) {
                    request.conflicts.extend(&cartridge.conflicting_items);
                }
                SlotOutcome::AttachedWithChildren(tpl)
            }
            Err(issue) => {
                report.issue(issue);
                SlotOutcome::AttachedLeaf(tpl)
            }
        };
        report.record(parent_id, slot_name, outcome);
        return None;
    }

    if !chosen.has_slots() {
        report.record(parent_id, slot_name, SlotOutcome::AttachedLeaf(tpl));
        return None;
    }

    if target.randomisable {
        special::hydrate_child_pools(services, request, chosen);
    }
    report.record(parent_id, slot_name, SlotOutcome::AttachedWithChildren(tpl.clone()));
    Some((id, tpl))
}
