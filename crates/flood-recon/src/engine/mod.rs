//! The orchestrator: runs the fixed rule battery with per-rule fault
//! isolation and explicit, serialized context mutation.
//!
//! Field-comparison and elevation checks run synchronously in document
//! order. Photograph checks run only when image references and an oracle are
//! both present; their independent oracle questions are issued concurrently,
//! with the diagram-dependent checks held back until the Diagram 5 answer
//! has been applied to the context. A failure inside any check becomes an
//! Error-status entry for that check alone.

use crate::document::Document;
use crate::extraction::FieldContext;
use crate::oracle::{RetryPolicy, RetryingOracle, VisualOracle};
use crate::reference::ReferenceTables;
use crate::report::Report;
use crate::rules::{elevation, fields, photo};
use crate::rules::{RuleCheck, RuleError, RuleOutcome, RuleResult};
use tracing::{debug, warn};

/// Reconciles a certificate/application pair against the rule battery.
pub struct ReconciliationEngine {
    tables: ReferenceTables,
    retry: RetryPolicy,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(ReferenceTables::default(), RetryPolicy::default())
    }
}

impl ReconciliationEngine {
    pub fn new(tables: ReferenceTables, retry: RetryPolicy) -> Self {
        Self { tables, retry }
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    /// Run the full battery. The report carries one entry per rule slot
    /// regardless of input quality; only the caller can fail a run, and only
    /// by not having both documents to pass in.
    pub async fn run(
        &self,
        certificate: &Document,
        application: &Document,
        images: &[String],
        oracle: Option<&dyn VisualOracle>,
    ) -> Report {
        let mut ctx = FieldContext::extract(certificate, application);
        let mut results: Vec<RuleResult> = Vec::with_capacity(RuleCheck::ordered().len());

        let sync_battery: [fn(&FieldContext, &ReferenceTables) -> RuleOutcome; 11] = [
            fields::verify_address,
            |ctx, _| elevation::verify_diagram_number(ctx),
            elevation::verify_crawlspace,
            |ctx, _| fields::verify_cbrs_opa(ctx),
            |ctx, _| fields::verify_construction_status(ctx),
            |ctx, _| fields::verify_certifier(ctx),
            elevation::verify_section_c,
            elevation::verify_section_e,
            elevation::verify_section_h,
            elevation::verify_machinery_logic,
            elevation::verify_vents,
        ];
        for rule in sync_battery {
            let outcome = rule(&ctx, &self.tables);
            record(&mut results, &mut ctx, outcome);
        }

        let photos_ran = match oracle {
            Some(oracle) if !images.is_empty() => {
                self.run_photo_battery(&mut results, &mut ctx, images, oracle)
                    .await;
                true
            }
            _ => {
                let reason = if images.is_empty() {
                    "No images provided. Rule skipped."
                } else {
                    "No visual oracle configured. Rule skipped."
                };
                for check in RuleCheck::ordered() {
                    if check.needs_photographs() {
                        results.push(RuleResult::skipped(check, reason));
                    }
                }
                false
            }
        };

        let outcome = fields::verify_firm_reconciliation(&ctx, &self.tables);
        record(&mut results, &mut ctx, outcome);
        let outcome = fields::verify_form_validity(&ctx, &self.tables);
        record(&mut results, &mut ctx, outcome);

        let images_processed = if photos_ran { images.len() } else { 0 };
        Report::from_results(results, images_processed)
    }

    /// Photograph checks. The first wave is mutually independent and runs
    /// concurrently; the Diagram 5 determination may reassign the diagram
    /// number, so the foundation-type and Diagram 6 checks wait for it.
    async fn run_photo_battery(
        &self,
        results: &mut Vec<RuleResult>,
        ctx: &mut FieldContext,
        images: &[String],
        oracle: &dyn VisualOracle,
    ) {
        let outcome = photo::verify_photograph_requirement(ctx);
        record(results, ctx, outcome);

        let retrying = RetryingOracle::new(oracle, self.retry);

        let (r13, r14, r15, r16, r18, r19, r20, r21, r22, r24) = tokio::join!(
            photo::verify_building_eligibility(&retrying, images),
            photo::verify_occupancy(ctx, &retrying, images),
            photo::verify_over_water(&retrying, images),
            photo::verify_foundation_visibility(&retrying, images),
            photo::verify_floor_count(ctx, &retrying, images),
            photo::verify_dormers(&retrying, images),
            photo::verify_construction_type(ctx, &retrying, images),
            photo::verify_additions(&retrying, images),
            photo::verify_diagram_five(&retrying, images),
            photo::verify_machinery_photo(ctx, &retrying, images),
        );

        // Context writes stay serialized, in battery order, even though the
        // oracle calls above ran concurrently.
        let r13 = apply_updates(ctx, settle(RuleCheck::BuildingEligibility, r13));
        let r14 = apply_updates(ctx, settle(RuleCheck::Occupancy, r14));
        let r15 = apply_updates(ctx, settle(RuleCheck::OverWater, r15));
        let r16 = apply_updates(ctx, settle(RuleCheck::FoundationVisibility, r16));
        let r18 = apply_updates(ctx, settle(RuleCheck::FloorCount, r18));
        let r19 = apply_updates(ctx, settle(RuleCheck::Dormers, r19));
        let r20 = apply_updates(ctx, settle(RuleCheck::ConstructionType, r20));
        let r21 = apply_updates(ctx, settle(RuleCheck::Additions, r21));
        let r22 = apply_updates(ctx, settle(RuleCheck::DiagramFive, r22));
        let r24 = apply_updates(ctx, settle(RuleCheck::MachineryPhoto, r24));

        let (r17, r23) = tokio::join!(
            photo::verify_foundation_type(ctx, &retrying, images, &self.tables),
            photo::verify_diagram_six(ctx, &retrying, images),
        );
        let r17 = apply_updates(ctx, settle(RuleCheck::FoundationType, r17));
        let r23 = apply_updates(ctx, settle(RuleCheck::DiagramSix, r23));

        results.extend([r13, r14, r15, r16, r17, r18, r19, r20, r21, r22, r23, r24]);
    }
}

fn record(results: &mut Vec<RuleResult>, ctx: &mut FieldContext, outcome: RuleOutcome) {
    debug!(
        rule = outcome.result.check.key(),
        status = outcome.result.status.label(),
        "rule evaluated"
    );
    results.push(apply_updates(ctx, outcome));
}

fn apply_updates(ctx: &mut FieldContext, outcome: RuleOutcome) -> RuleResult {
    for update in outcome.updates {
        debug!(?update, "applying context update");
        ctx.apply(update);
    }
    outcome.result
}

/// Convert a check failure into an Error-status entry; the batch continues.
fn settle(check: RuleCheck, outcome: Result<RuleOutcome, RuleError>) -> RuleOutcome {
    match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(rule = check.key(), error = %err, "rule errored; continuing batch");
            RuleOutcome::without_updates(RuleResult::error(check, err))
        }
    }
}
