//! The reconciliation report handed back to underwriting.

use crate::rules::{RuleCheck, RuleResult, RuleStatus};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Aggregate counts plus the worst status present across the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub errors: usize,
    pub images_processed: usize,
    pub overall_status: RuleStatus,
}

/// Ordered rule results with their summary. One entry per rule slot on every
/// run, failures included, so a caller can always render a complete
/// checklist.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub results: Vec<RuleResult>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn from_results(results: Vec<RuleResult>, images_processed: usize) -> Self {
        let count = |status: RuleStatus| results.iter().filter(|r| r.status == status).count();
        let overall_status = results
            .iter()
            .map(|r| r.status)
            .max()
            .unwrap_or(RuleStatus::Pass);

        let summary = ReportSummary {
            total: results.len(),
            passed: count(RuleStatus::Pass),
            failed: count(RuleStatus::Fail),
            warnings: count(RuleStatus::Warning),
            errors: count(RuleStatus::Error),
            images_processed,
            overall_status,
        };

        Self { results, summary }
    }

    pub fn result_for(&self, check: RuleCheck) -> Option<&RuleResult> {
        self.results.iter().find(|r| r.check == check)
    }

    /// Serialize as an ordered mapping of rule identifier to result, with a
    /// trailing summary block. This is the shape external consumers read.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for result in &self.results {
            map.insert(
                result.check.key().to_string(),
                json!({
                    "rule": result.rule,
                    "status": result.status,
                    "details": result.details,
                }),
            );
        }
        map.insert(
            "summary".to_string(),
            serde_json::to_value(self.summary).expect("summary serializes"),
        );
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(check: RuleCheck, status: RuleStatus) -> RuleResult {
        RuleResult {
            check,
            rule: check.label(),
            status,
            details: vec!["finding".to_string()],
        }
    }

    #[test]
    fn summary_counts_and_overall_status() {
        let report = Report::from_results(
            vec![
                result(RuleCheck::AddressMatch, RuleStatus::Pass),
                result(RuleCheck::DiagramNumber, RuleStatus::Warning),
                result(RuleCheck::SectionC, RuleStatus::Fail),
                result(RuleCheck::OverWater, RuleStatus::Error),
            ],
            2,
        );

        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.images_processed, 2);
        assert_eq!(report.summary.overall_status, RuleStatus::Error);
    }

    #[test]
    fn worst_status_precedence() {
        let warning_only = Report::from_results(
            vec![
                result(RuleCheck::AddressMatch, RuleStatus::Pass),
                result(RuleCheck::DiagramNumber, RuleStatus::Warning),
            ],
            0,
        );
        assert_eq!(warning_only.summary.overall_status, RuleStatus::Warning);

        let all_pass = Report::from_results(
            vec![result(RuleCheck::AddressMatch, RuleStatus::Pass)],
            0,
        );
        assert_eq!(all_pass.summary.overall_status, RuleStatus::Pass);
    }

    #[test]
    fn json_keeps_rule_order_and_summary() {
        let report = Report::from_results(
            vec![
                result(RuleCheck::AddressMatch, RuleStatus::Pass),
                result(RuleCheck::FormValidity, RuleStatus::Warning),
            ],
            0,
        );
        let value = report.to_json();
        let map = value.as_object().expect("object");
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["rule_1", "form_validation", "summary"]);
        assert_eq!(map["rule_1"]["status"], "pass");
    }
}
