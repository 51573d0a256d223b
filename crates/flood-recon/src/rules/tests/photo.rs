use super::common::{fast_retry, images, passing_context, tables, ScriptedOracle, UnreachableOracle};
use crate::extraction::ContextUpdate;
use crate::oracle::RetryingOracle;
use crate::rules::photo::{
    verify_building_eligibility, verify_construction_type, verify_diagram_five,
    verify_diagram_six, verify_floor_count, verify_foundation_type, verify_machinery_photo,
    verify_over_water, verify_photograph_requirement,
};
use crate::rules::{RuleError, RuleStatus};

#[test]
fn photographs_waived_for_course_of_construction() {
    let mut ctx = passing_context();
    ctx.construction_status_application = "yes".to_string();
    let outcome = verify_photograph_requirement(&ctx);
    assert_eq!(outcome.result.status, RuleStatus::Pass);
    assert!(outcome
        .result
        .details
        .iter()
        .any(|d| d.contains("not required")));
}

#[tokio::test]
async fn eligible_building_passes() {
    let oracle = ScriptedOracle::affirmative();
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_building_eligibility(&retrying, &images())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Pass);
}

#[tokio::test]
async fn building_over_water_fails() {
    let oracle = ScriptedOracle::answering(vec![("over water", "True")]);
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_over_water(&retrying, &images())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Fail);
}

#[tokio::test]
async fn unexpected_answer_degrades_to_warning_not_fail() {
    let oracle = ScriptedOracle::answering(vec![("over water", "hard to say")]);
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_over_water(&retrying, &images())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Warning);
}

#[tokio::test]
async fn transport_exhaustion_surfaces_as_rule_error() {
    let oracle = UnreachableOracle;
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let err = verify_over_water(&retrying, &images())
        .await
        .expect_err("oracle unreachable");
    assert!(matches!(err, RuleError::Oracle(_)));
}

#[tokio::test]
async fn foundation_type_compares_mapping_against_oracle() {
    let ctx = passing_context();
    let oracle = ScriptedOracle::answering(vec![("foundation type", "Crawlspace")]);
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_foundation_type(&ctx, &retrying, &images(), &tables())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Pass, "{:?}", outcome.result.details);

    let oracle = ScriptedOracle::answering(vec![("foundation type", "Basement")]);
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_foundation_type(&ctx, &retrying, &images(), &tables())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Fail);
}

#[tokio::test]
async fn floor_count_mismatch_fails() {
    let mut ctx = passing_context();
    ctx.floors_application = "2".to_string();
    let oracle = ScriptedOracle::answering(vec![("Count the number of floors", "3")]);
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_floor_count(&ctx, &retrying, &images())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Fail);
}

#[tokio::test]
async fn frame_building_with_masonry_walls_fails() {
    let mut ctx = passing_context();
    ctx.construction_type_application = "frame".to_string();
    let oracle = ScriptedOracle::answering(vec![("brick or masonry", "True")]);
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_construction_type(&ctx, &retrying, &images())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Fail);
}

#[tokio::test]
async fn confirmed_diagram_five_reassigns_context() {
    let oracle = ScriptedOracle::answering(vec![("Diagram 5", "True")]);
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_diagram_five(&retrying, &images())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Pass);
    assert_eq!(
        outcome.updates,
        vec![ContextUpdate::DiagramNumber("5".to_string())]
    );
}

#[tokio::test]
async fn diagram_six_check_reads_reassigned_diagram() {
    let mut ctx = passing_context();
    ctx.apply(ContextUpdate::DiagramNumber("5".to_string()));

    let oracle = ScriptedOracle::answering(vec![("elevator shaft", "True")]);
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_diagram_six(&ctx, &retrying, &images())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Fail);
    assert_eq!(
        outcome.updates,
        vec![ContextUpdate::DiagramNumber("6".to_string())]
    );
}

#[tokio::test]
async fn diagram_six_check_skips_other_diagrams() {
    let ctx = passing_context();
    let oracle = ScriptedOracle::affirmative();
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_diagram_six(&ctx, &retrying, &images())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Pass);
    assert!(outcome.updates.is_empty());
}

#[tokio::test]
async fn unanswered_appliance_question_warns() {
    let mut ctx = passing_context();
    ctx.appliances_elevated = None;
    let oracle = ScriptedOracle::affirmative();
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_machinery_photo(&ctx, &retrying, &images())
        .await
        .expect("oracle reachable");
    assert_eq!(outcome.result.status, RuleStatus::Warning);
}

#[tokio::test]
async fn elevated_appliances_check_photographs_by_foundation() {
    let mut ctx = passing_context();
    ctx.appliances_elevated = Some("yes".to_string());
    ctx.foundation_type_application = "Crawlspace".to_string();
    let oracle = ScriptedOracle::answering(vec![("floor above the crawlspace", "True")]);
    let retrying = RetryingOracle::new(&oracle, fast_retry());
    let outcome = verify_machinery_photo(&ctx, &retrying, &images())
        .await
        .expect("oracle reachable");
    // The "appliances elevated" note itself is a Warning-tier flag.
    assert_eq!(outcome.result.status, RuleStatus::Warning);
    assert!(outcome
        .result
        .details
        .iter()
        .any(|d| d.contains("elevated according to the rule")));
}
