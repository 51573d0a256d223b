//! Shared fixtures for the rule-family tests.

use crate::extraction::FieldContext;
use crate::oracle::{OracleError, RetryPolicy, VisualOracle};
use crate::reference::ReferenceTables;
use async_trait::async_trait;
use std::time::Duration;

pub(super) fn tables() -> ReferenceTables {
    ReferenceTables::default()
}

pub(super) fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        initial_backoff: Duration::from_millis(1),
    }
}

/// A context describing a clean diagram-8 crawlspace building that passes
/// the battery; tests override the fields under trial.
pub(super) fn passing_context() -> FieldContext {
    FieldContext {
        address_certificate: "123 Main Street Cedar Rapids IA 52401".to_string(),
        address_application: "123 Main St Cedar Rapids IA 52401".to_string(),
        street_number_certificate: 123.0,
        street_number_application: 123.0,

        diagram_number_certificate: Some("8".to_string()),
        diagram_number_application: Some("8".to_string()),

        top_of_bottom_floor_certificate: 10.5,
        top_of_bottom_floor_application: 10.5,
        top_of_next_higher_floor_certificate: 14.0,
        top_of_next_higher_floor_application: 14.0,
        lag_certificate: 9.5,
        lag_application: 9.5,
        hag_certificate: 10.0,
        section_c_lag_application: 9.5,
        machinery_elevation_certificate: 14.5,

        e1a: 10.5,
        e1b: 10.5,
        e2: 14.0,
        e4_platform: 18.5,

        h1a: 10.5,
        h1b: 14.0,
        h2_flag: Some("yes".to_string()),

        crawlspace_square_footage: 600.0,
        garage_square_footage: 200.0,
        enclosure_size_application: 800.0,
        openings_count_certificate: 4.0,
        openings_area_certificate: 400.0,
        openings_count_application: 4.0,
        openings_area_application: 400.0,

        cbrs_certificate: "no".to_string(),
        opa_certificate: "no".to_string(),
        cbrs_opa_application: "no".to_string(),
        construction_status_certificate: "Finished Construction".to_string(),
        construction_status_application: "no".to_string(),
        certifier_name: "J. Smith, PE".to_string(),
        certifier_license: "12345".to_string(),
        section_used: "Section C".to_string(),
        machinery_flag: Some("yes".to_string()),
        appliances_elevated: Some("no".to_string()),
        occupancy_certificate: "Residential".to_string(),
        occupancy_application: "Residential".to_string(),
        floors_application: "2".to_string(),
        construction_type_application: "frame".to_string(),
        foundation_type_application: "Crawlspace".to_string(),
        bfe_application: Some(12.0),

        flood_zone_certificate: "ae".to_string(),
        flood_zone_application: "ae".to_string(),
        suffix_certificate: "c".to_string(),
        suffix_application: "c".to_string(),
        firm_date_certificate: "06012019".to_string(),
        firm_date_application: "06012019".to_string(),

        expiration_date: "06/30/2026".to_string(),
        survey_date: "06/15/2024".to_string(),
    }
}

/// Oracle stub answering by question-substring match; unmatched questions
/// get the fallback. Pattern matching keeps concurrent calls deterministic.
pub(super) struct ScriptedOracle {
    pub(super) answers: Vec<(&'static str, &'static str)>,
    pub(super) fallback: &'static str,
}

impl ScriptedOracle {
    pub(super) fn affirmative() -> Self {
        Self {
            answers: Vec::new(),
            fallback: "True",
        }
    }

    pub(super) fn answering(answers: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            answers,
            fallback: "False",
        }
    }
}

#[async_trait]
impl VisualOracle for ScriptedOracle {
    async fn ask(&self, _images: &[String], questions: &[String]) -> Result<String, OracleError> {
        let question = questions.join(" ");
        for (pattern, answer) in &self.answers {
            if question.contains(pattern) {
                return Ok(answer.to_string());
            }
        }
        Ok(self.fallback.to_string())
    }
}

/// Oracle stub that always fails with a transport error.
pub(super) struct UnreachableOracle;

#[async_trait]
impl VisualOracle for UnreachableOracle {
    async fn ask(&self, _images: &[String], _questions: &[String]) -> Result<String, OracleError> {
        Err(OracleError::Transport("connection refused".to_string()))
    }
}

pub(super) fn images() -> Vec<String> {
    vec!["photos/front.png".to_string(), "photos/back.png".to_string()]
}
