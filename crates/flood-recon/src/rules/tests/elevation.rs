use super::common::{passing_context, tables};
use crate::extraction::ContextUpdate;
use crate::rules::elevation::{
    verify_crawlspace, verify_diagram_number, verify_machinery_logic, verify_section_c,
    verify_section_e, verify_section_h, verify_vents,
};
use crate::rules::RuleStatus;

#[test]
fn matching_diagram_numbers_pass() {
    let ctx = passing_context();
    let outcome = verify_diagram_number(&ctx);
    assert_eq!(outcome.result.status, RuleStatus::Pass);
    assert!(outcome.updates.is_empty());
}

#[test]
fn diagram_eight_with_wide_floor_gap_reassigns_to_seven() {
    let mut ctx = passing_context();
    ctx.top_of_bottom_floor_application = 10.0;
    ctx.top_of_next_higher_floor_application = 3.0;
    let outcome = verify_diagram_number(&ctx);

    assert_eq!(
        outcome.updates,
        vec![ContextUpdate::DiagramNumber("7".to_string())]
    );
    assert!(outcome
        .result
        .details
        .iter()
        .any(|d| d.contains("Reassigning diagram number as 7")));
    // The certificate still says 8, so the post-reassignment comparison fails.
    assert_eq!(outcome.result.status, RuleStatus::Fail);
}

#[test]
fn diagram_nine_reassigns_to_two_when_bottom_floor_is_subgrade() {
    let mut ctx = passing_context();
    ctx.diagram_number_certificate = Some("2".to_string());
    ctx.diagram_number_application = Some("9".to_string());
    ctx.section_c_lag_application = 9.5;
    ctx.top_of_bottom_floor_application = 5.0;
    let outcome = verify_diagram_number(&ctx);

    assert_eq!(
        outcome.updates,
        vec![ContextUpdate::DiagramNumber("2".to_string())]
    );
    assert_eq!(outcome.result.status, RuleStatus::Pass);
}

#[test]
fn missing_certificate_diagram_warns() {
    let mut ctx = passing_context();
    ctx.diagram_number_certificate = None;
    let outcome = verify_diagram_number(&ctx);
    assert_eq!(outcome.result.status, RuleStatus::Warning);
}

#[test]
fn crawlspace_square_footage_must_match_enclosure_size() {
    let mut ctx = passing_context();
    ctx.enclosure_size_application = 750.0;
    let outcome = verify_crawlspace(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Fail);

    ctx.enclosure_size_application = 800.0;
    let outcome = verify_crawlspace(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Pass);
}

#[test]
fn crawlspace_rule_skips_non_enclosure_diagrams() {
    let mut ctx = passing_context();
    ctx.diagram_number_certificate = Some("1".to_string());
    ctx.enclosure_size_application = 0.0;
    let outcome = verify_crawlspace(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Pass);
}

#[test]
fn section_c_passes_for_aligned_crawlspace_building() {
    let ctx = passing_context();
    let outcome = verify_section_c(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Pass, "{:?}", outcome.result.details);
}

#[test]
fn hag_below_lag_fails_section_c() {
    let mut ctx = passing_context();
    ctx.hag_certificate = 8.0;
    let outcome = verify_section_c(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Fail);
}

#[test]
fn section_c_flags_wide_lag_gap() {
    let mut ctx = passing_context();
    ctx.top_of_bottom_floor_certificate = 40.0;
    ctx.top_of_bottom_floor_application = 40.0;
    let outcome = verify_section_c(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Fail);
    assert!(outcome
        .result
        .details
        .iter()
        .any(|d| d.contains("20 foot difference between C2a and the LAG")));
}

#[test]
fn subgrade_diagram_requires_bottom_floor_below_lag() {
    let mut ctx = passing_context();
    ctx.diagram_number_certificate = Some("2".to_string());
    ctx.top_of_bottom_floor_certificate = 7.0;
    ctx.top_of_bottom_floor_application = 7.0;
    let outcome = verify_section_c(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Pass, "{:?}", outcome.result.details);

    ctx.top_of_bottom_floor_certificate = 11.0;
    ctx.top_of_bottom_floor_application = 11.0;
    let outcome = verify_section_c(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Fail);
}

#[test]
fn section_e_fails_when_not_used() {
    let ctx = passing_context();
    let outcome = verify_section_e(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Fail);
}

#[test]
fn section_e_checks_pass_for_e_based_application() {
    let mut ctx = passing_context();
    ctx.section_used = "Section E".to_string();
    ctx.e1a = 2.0;
    ctx.e1b = 2.0;
    ctx.e2 = 4.0;
    ctx.lag_certificate = 1.5;
    ctx.top_of_bottom_floor_application = 2.0;
    let outcome = verify_section_e(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Pass, "{:?}", outcome.result.details);
}

#[test]
fn section_e_requires_e2_for_crawlspace_diagrams() {
    let mut ctx = passing_context();
    ctx.section_used = "Section E".to_string();
    ctx.e1a = 2.0;
    ctx.e1b = 2.0;
    ctx.e2 = 0.0;
    ctx.lag_certificate = 1.5;
    ctx.top_of_bottom_floor_application = 2.0;
    let outcome = verify_section_e(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Fail);
    assert!(outcome
        .result
        .details
        .iter()
        .any(|d| d.contains("E2 elevation is not present")));
}

#[test]
fn section_h_skips_when_not_used() {
    let ctx = passing_context();
    let outcome = verify_section_h(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Pass);
    assert!(outcome
        .result
        .details
        .iter()
        .any(|d| d.contains("not used")));
}

#[test]
fn section_h_enclosure_checks_run_for_h_based_application() {
    let mut ctx = passing_context();
    ctx.section_used = "H".to_string();
    ctx.h1a = 10.5;
    ctx.h1b = 0.0;
    let outcome = verify_section_h(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Fail);
    assert!(outcome
        .result
        .details
        .iter()
        .any(|d| d.contains("H1b is missing")));
}

#[test]
fn machinery_passes_for_supported_discount() {
    let ctx = passing_context();
    let outcome = verify_machinery_logic(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Pass, "{:?}", outcome.result.details);
}

#[test]
fn machinery_below_next_higher_floor_fails() {
    let mut ctx = passing_context();
    ctx.machinery_elevation_certificate = 11.0;
    let outcome = verify_machinery_logic(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Fail);
}

#[test]
fn absent_machinery_answer_is_not_treated_as_no() {
    let mut ctx = passing_context();
    ctx.machinery_flag = None;
    let absent = verify_machinery_logic(&ctx, &tables());
    assert_eq!(absent.result.status, RuleStatus::Warning);

    ctx.machinery_flag = Some("no".to_string());
    let explicit_no = verify_machinery_logic(&ctx, &tables());
    assert_eq!(explicit_no.result.status, RuleStatus::Pass);
}

#[test]
fn low_flood_risk_zones_skip_bfe_logic() {
    let mut ctx = passing_context();
    ctx.flood_zone_application = "x".to_string();
    ctx.bfe_application = None;
    let outcome = verify_machinery_logic(&ctx, &tables());
    assert!(outcome
        .result
        .details
        .iter()
        .any(|d| d.contains("BFE logic is not applicable")));
}

#[test]
fn sfha_without_bfe_warns() {
    let mut ctx = passing_context();
    ctx.bfe_application = None;
    let outcome = verify_machinery_logic(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Warning, "{:?}", outcome.result.details);
}

#[test]
fn vent_totals_must_match_for_enclosure_diagrams() {
    let mut ctx = passing_context();
    ctx.openings_count_application = 2.0;
    let outcome = verify_vents(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Fail);

    ctx.openings_count_application = 4.0;
    let outcome = verify_vents(&ctx, &tables());
    assert_eq!(outcome.result.status, RuleStatus::Pass);
}
