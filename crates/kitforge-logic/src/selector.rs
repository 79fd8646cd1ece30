//! Candidate selection — random draw without replacement, conflict aware.

use rand::Rng;

use crate::constants::MAX_BLOCKED_FRACTION;
use crate::draw::ExhaustibleDraw;
use crate::pool::SlotTarget;
use crate::request::GenerationRequest;
use crate::services::AssemblyServices;
use crate::special;

/// Why no candidate was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The pool was empty.
    NoCandidates,
    /// Every draw within the retry budget was blocked.
    AllConflicting,
    /// A required slot failed even against its full filter.
    RequiredButMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionResult {
    Found(String),
    NotFound(NotFoundReason),
}

/// Pick a template for `target` from `pool`.
///
/// Required slots that come up empty get a second pass over the slot's full
/// filter, ignoring any narrowing that produced `pool`.
pub fn select(
    services: &AssemblyServices,
    request: &GenerationRequest,
    target: SlotTarget,
    pool: &[String],
    required: bool,
    rng: &mut impl Rng,
) -> SelectionResult {
    let first = draw_compatible(services, request, target, pool, rng);
    if !required || matches!(first, SelectionResult::Found(_)) {
        return first;
    }

    log::debug!(
        "Required slot {}/{} found nothing in its pool ({:?}), retrying full filter",
        target.parent.id,
        target.name(),
        first
    );
    match draw_compatible(services, request, target, target.slot.allowed(), rng) {
        found @ SelectionResult::Found(_) => found,
        SelectionResult::NotFound(_) => SelectionResult::NotFound(NotFoundReason::RequiredButMissing),
    }
}

/// Draw until something fits or the retry budget runs out.
fn draw_compatible(
    services: &AssemblyServices,
    request: &GenerationRequest,
    target: SlotTarget,
    pool: &[String],
    rng: &mut impl Rng,
) -> SelectionResult {
    if pool.is_empty() {
        return SelectionResult::NotFound(NotFoundReason::NoCandidates);
    }

    let max_blocked = (pool.len() as f64 * MAX_BLOCKED_FRACTION).round() as usize;
    let mut blocked = 0;
    let mut draw = ExhaustibleDraw::from(pool);
    while let Some(tpl) = draw.draw(rng) {
        if is_compatible(services, request, target, &tpl) {
            return SelectionResult::Found(tpl);
        }
        blocked += 1;
        if blocked > max_blocked {
            break;
        }
    }
    SelectionResult::NotFound(NotFoundReason::AllConflicting)
}

/// Can `tpl` join the tree as it stands?
pub fn is_compatible(
    services: &AssemblyServices,
    request: &GenerationRequest,
    target: SlotTarget,
    tpl: &str,
) -> bool {
    if request.conflicts.contains(tpl) {
        return false;
    }
    let Some(candidate) = services.catalog.get(tpl) else {
        log::debug!("Candidate {} is not in the catalog", tpl);
        return false;
    };

    let pairs = &services.config.incompatible_pairs;
    for attached in request.attached_tpls() {
        if candidate.conflicting_items.iter().any(|c| c == attached) {
            return false;
        }
        if services
            .catalog
            .get(attached)
            .is_some_and(|t| t.conflicting_items.iter().any(|c| c == tpl))
        {
            return false;
        }
        if pairs.is_incompatible(tpl, attached) {
            return false;
        }
    }

    if target.weapon {
        let limits = &services.config.role(&request.bot.role).mod_limits;
        if special::exceeds_mod_limits(services.catalog, limits, &request.state, tpl) {
            return false;
        }
    }
    true
}
