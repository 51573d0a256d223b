//! The compliance-rule battery.
//!
//! Every check is a pure function of the extracted [`FieldContext`] (plus,
//! for photograph checks, oracle answers) producing a [`RuleOutcome`]: the
//! reportable result and any explicit context reclassifications for the
//! orchestrator to apply. Checks never abort the batch; anything fallible
//! inside a check degrades to a finding on that check alone.

pub(crate) mod elevation;
pub(crate) mod fields;
pub(crate) mod photo;

#[cfg(test)]
mod tests;

use crate::extraction::ContextUpdate;
use crate::oracle::OracleError;
use serde::Serialize;

/// Verdict tier for a single check. Ordering is severity: later variants are
/// worse, and a report's overall status is the worst tier present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Pass,
    Warning,
    Fail,
    Error,
}

impl RuleStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Warning => "Warning",
            Self::Fail => "Fail",
            Self::Error => "Error",
        }
    }
}

/// Identity of each slot in the fixed battery. The report carries exactly one
/// entry per variant, in [`RuleCheck::ordered`] order, on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCheck {
    AddressMatch,
    DiagramNumber,
    CrawlspaceDetails,
    CbrsOpa,
    ConstructionStatus,
    Certifier,
    SectionC,
    SectionE,
    SectionH,
    MachineryLogic,
    Vents,
    PhotographRequirement,
    BuildingEligibility,
    Occupancy,
    OverWater,
    FoundationVisibility,
    FoundationType,
    FloorCount,
    Dormers,
    ConstructionType,
    Additions,
    DiagramFive,
    DiagramSix,
    MachineryPhoto,
    FirmReconciliation,
    FormValidity,
}

impl RuleCheck {
    pub const fn ordered() -> [Self; 26] {
        [
            Self::AddressMatch,
            Self::DiagramNumber,
            Self::CrawlspaceDetails,
            Self::CbrsOpa,
            Self::ConstructionStatus,
            Self::Certifier,
            Self::SectionC,
            Self::SectionE,
            Self::SectionH,
            Self::MachineryLogic,
            Self::Vents,
            Self::PhotographRequirement,
            Self::BuildingEligibility,
            Self::Occupancy,
            Self::OverWater,
            Self::FoundationVisibility,
            Self::FoundationType,
            Self::FloorCount,
            Self::Dormers,
            Self::ConstructionType,
            Self::Additions,
            Self::DiagramFive,
            Self::DiagramSix,
            Self::MachineryPhoto,
            Self::FirmReconciliation,
            Self::FormValidity,
        ]
    }

    /// Stable identifier used as the key in serialized reports.
    pub const fn key(self) -> &'static str {
        match self {
            Self::AddressMatch => "rule_1",
            Self::DiagramNumber => "rule_2",
            Self::CrawlspaceDetails => "rule_3",
            Self::CbrsOpa => "rule_4",
            Self::ConstructionStatus => "rule_5",
            Self::Certifier => "rule_6",
            Self::SectionC => "rule_7",
            Self::SectionE => "rule_8",
            Self::SectionH => "rule_9",
            Self::MachineryLogic => "rule_10",
            Self::Vents => "rule_11",
            Self::PhotographRequirement => "rule_12",
            Self::BuildingEligibility => "rule_13",
            Self::Occupancy => "rule_14",
            Self::OverWater => "rule_15",
            Self::FoundationVisibility => "rule_16",
            Self::FoundationType => "rule_17",
            Self::FloorCount => "rule_18",
            Self::Dormers => "rule_19",
            Self::ConstructionType => "rule_20",
            Self::Additions => "rule_21",
            Self::DiagramFive => "rule_22",
            Self::DiagramSix => "rule_23",
            Self::MachineryPhoto => "rule_24",
            Self::FirmReconciliation => "additional_checks",
            Self::FormValidity => "form_validation",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AddressMatch => "Rule 1 - Address Verification",
            Self::DiagramNumber => "Rule 2 - Diagram Number Verification",
            Self::CrawlspaceDetails => "Rule 3 - Crawlspace Details Verification",
            Self::CbrsOpa => "Rule 4 - CBRS/OPA Details Verification",
            Self::ConstructionStatus => "Rule 5 - Construction Status Verification",
            Self::Certifier => "Rule 6 - Certifier Verification",
            Self::SectionC => "Rule 7 - Section C Measurements Verification",
            Self::SectionE => "Rule 8 - Section E Measurements Verification",
            Self::SectionH => "Rule 9 - Section H Measurements Verification",
            Self::MachineryLogic => "Rule 10 - Machinery Logic Verification",
            Self::Vents => "Rule 11 - Vents Details Verification",
            Self::PhotographRequirement => "Rule 12 - Photograph Requirement",
            Self::BuildingEligibility => "Rule 13 - Building Eligibility",
            Self::Occupancy => "Rule 14 - Occupancy Verification",
            Self::OverWater => "Rule 15 - Over Water Verification",
            Self::FoundationVisibility => "Rule 16 - Foundation Eligibility",
            Self::FoundationType => "Rule 17 - Foundation Type Verification",
            Self::FloorCount => "Rule 18 - Number of Floors Verification",
            Self::Dormers => "Rule 19 - Dormers Verification",
            Self::ConstructionType => "Rule 20 - Construction Type Verification",
            Self::Additions => "Rule 21 - Additions Verification",
            Self::DiagramFive => "Rule 22 - Diagram 5 Verification",
            Self::DiagramSix => "Rule 23 - Diagram 6 Verification",
            Self::MachineryPhoto => "Rule 24 - Machinery Verification",
            Self::FirmReconciliation => "FIRM Reconciliation",
            Self::FormValidity => "Form Validation",
        }
    }

    /// Checks that consult photographs and run only when images are present.
    pub const fn needs_photographs(self) -> bool {
        matches!(
            self,
            Self::PhotographRequirement
                | Self::BuildingEligibility
                | Self::Occupancy
                | Self::OverWater
                | Self::FoundationVisibility
                | Self::FoundationType
                | Self::FloorCount
                | Self::Dormers
                | Self::ConstructionType
                | Self::Additions
                | Self::DiagramFive
                | Self::DiagramSix
                | Self::MachineryPhoto
        )
    }
}

/// One reportable verdict: the check, its tier, and ordered human-readable
/// findings. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    #[serde(rename = "id")]
    pub check: RuleCheck,
    pub rule: &'static str,
    pub status: RuleStatus,
    pub details: Vec<String>,
}

impl RuleResult {
    pub fn error(check: RuleCheck, message: impl std::fmt::Display) -> Self {
        Self {
            check,
            rule: check.label(),
            status: RuleStatus::Error,
            details: vec![format!("Error: {message}")],
        }
    }

    pub fn skipped(check: RuleCheck, reason: &str) -> Self {
        Self {
            check,
            rule: check.label(),
            status: RuleStatus::Warning,
            details: vec![reason.to_string()],
        }
    }
}

/// What a check hands back to the orchestrator: its result plus any explicit
/// context reclassifications later checks must observe.
#[derive(Debug)]
pub struct RuleOutcome {
    pub result: RuleResult,
    pub updates: Vec<ContextUpdate>,
}

impl RuleOutcome {
    pub fn without_updates(result: RuleResult) -> Self {
        Self {
            result,
            updates: Vec::new(),
        }
    }
}

/// Failure inside a check body, caught at the rule boundary by the
/// orchestrator and reported as an Error-status entry for that check alone.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Finding accumulator shared by the rule bodies: collects ordered details
/// and escalates the status monotonically (a pass note never downgrades a
/// recorded failure).
pub(crate) struct RuleLog {
    check: RuleCheck,
    status: RuleStatus,
    details: Vec<String>,
}

impl RuleLog {
    pub(crate) fn new(check: RuleCheck) -> Self {
        Self {
            check,
            status: RuleStatus::Pass,
            details: Vec::new(),
        }
    }

    pub(crate) fn note(&mut self, message: impl Into<String>) {
        self.details.push(message.into());
    }

    pub(crate) fn pass(&mut self, message: impl Into<String>) {
        self.details.push(message.into());
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.details.push(message.into());
        self.status = self.status.max(RuleStatus::Warning);
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.details.push(message.into());
        self.status = self.status.max(RuleStatus::Fail);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub(crate) fn finish(self) -> RuleResult {
        RuleResult {
            check: self.check,
            rule: self.check.label(),
            status: self.status,
            details: self.details,
        }
    }

    pub(crate) fn finish_with(self, updates: Vec<ContextUpdate>) -> RuleOutcome {
        RuleOutcome {
            result: self.finish(),
            updates,
        }
    }
}
