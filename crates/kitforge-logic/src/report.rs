//! Assembly outcomes — per-slot results, non-fatal issues, fatal errors.

use crate::selector::NotFoundReason;

/// A recoverable problem hit while filling one slot.
///
/// None of these stop the assembly; the slot is left empty and the issue is
/// logged and recorded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyIssue {
    #[error("Slot {slot} does not exist on template {parent_tpl}")]
    MissingSlotTemplate { parent_tpl: String, slot: String },

    #[error("No candidates for optional slot {slot} on {parent_tpl}")]
    NoCandidates { parent_tpl: String, slot: String },

    #[error("Required slot {slot} on {parent_tpl} could not be filled")]
    RequiredSlotUnfillable { parent_tpl: String, slot: String },

    #[error("Every candidate for slot {slot} on {parent_tpl} conflicts with the tree")]
    AllConflicting { parent_tpl: String, slot: String },

    #[error("Slot {slot} on {parent_tpl} has no filter list")]
    MalformedCatalogEntry { parent_tpl: String, slot: String },

    #[error("No armor plate resolved for slot {slot} on {parent_tpl}")]
    UnresolvablePlate { parent_tpl: String, slot: String },

    #[error("No compatible cartridge for cylinder magazine {magazine_tpl}")]
    UnresolvableCamora { magazine_tpl: String },

    #[error("Template {tpl} is already on the active path, not descending")]
    CycleDetected { tpl: String },

    #[error("Depth limit {limit} reached at template {tpl}")]
    DepthLimit { tpl: String, limit: usize },
}

impl AssemblyIssue {
    /// Issues worth a warning rather than a debug line.
    pub fn is_warning(&self) -> bool {
        !matches!(
            self,
            AssemblyIssue::NoCandidates { .. } | AssemblyIssue::AllConflicting { .. }
        )
    }

    pub(crate) fn log(&self) {
        match self {
            AssemblyIssue::MissingSlotTemplate { .. }
            | AssemblyIssue::MalformedCatalogEntry { .. } => log::error!("{}", self),
            AssemblyIssue::NoCandidates { .. } | AssemblyIssue::AllConflicting { .. } => {
                log::debug!("{}", self)
            }
            _ => log::warn!("{}", self),
        }
    }
}

/// Terminal state of one scheduled slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    Skipped,
    AttachedLeaf(String),
    AttachedWithChildren(String),
    /// Optional slot left empty.
    Empty(NotFoundReason),
    FailedRequired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub parent_id: String,
    pub slot: String,
    pub outcome: SlotOutcome,
}

/// Everything that happened during one assembly call.
#[derive(Debug, Clone, Default)]
pub struct AssemblyReport {
    pub slots: Vec<SlotRecord>,
    pub issues: Vec<AssemblyIssue>,
    /// Nodes appended to the request, camora rounds included.
    pub attached: usize,
}

impl AssemblyReport {
    pub(crate) fn record(&mut self, parent_id: &str, slot: &str, outcome: SlotOutcome) {
        self.slots.push(SlotRecord {
            parent_id: parent_id.to_string(),
            slot: slot.to_string(),
            outcome,
        });
    }

    pub(crate) fn issue(&mut self, issue: AssemblyIssue) {
        issue.log();
        self.issues.push(issue);
    }

    pub fn warnings(&self) -> impl Iterator<Item = &AssemblyIssue> {
        self.issues.iter().filter(|i| i.is_warning())
    }

    pub fn failed_required(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.outcome == SlotOutcome::FailedRequired)
            .count()
    }
}

/// Caller misuse that prevents assembly from starting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("Request has no root item with id {0}")]
    MissingRoot(String),

    #[error("Root template {0} is not in the catalog")]
    UnknownRootTemplate(String),
}
