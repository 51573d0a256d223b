//! Photograph-derived checks.
//!
//! Each check phrases one or more natural-language questions, submits them
//! with the image references to the visual oracle, and classifies the
//! free-text answer. A non-boolean answer degrades the check to a Warning;
//! transport failure after retries surfaces as a `RuleError` that the
//! orchestrator isolates to the asking check.

use super::{RuleCheck, RuleError, RuleLog, RuleOutcome};
use crate::extraction::{ContextUpdate, FieldContext};
use crate::normalize::first_decimal;
use crate::oracle::{classify_answer, OracleAnswer, RetryingOracle};
use crate::reference::ReferenceTables;

const BUILDING_ELIGIBILITY_QUESTION: &str =
    "The building in the image(s) is affixed to a permanent site, and has two or more outside \
     rigid walls with a fully secured roof? Answer True or False.";

const MULTI_UNIT_QUESTION: &str =
    "The building in the image(s) has multi-unit structures? Answer True or False.";

const OVER_WATER_QUESTION: &str =
    "Some part of the building or the entire building in the image(s) is over water? \
     Answer True or False.";

const FOUNDATION_VISIBILITY_QUESTION: &str =
    "Do the image(s) show the front and back of the building, including the foundation system, \
     with the number of floors clearly visible? Answer True or False.";

const FOUNDATION_TYPE_QUESTION: &str =
    "Deeply analyze the given image(s) and name the foundation type of the building. Select \
     exactly one option: Slab on Grade; Basement; Basement with Exterior Egress; Elevated \
     Without Enclosure on Posts; Elevated With Enclosure on Posts; Elevated With Enclosure \
     Not On Posts; Crawlspace.";

const FLOOR_COUNT_QUESTION: &str =
    "Count the number of floors in the building visible in the image(s). Do not count mid-level \
     entries, enclosures, basements, or crawlspaces as a floor. Respond with only a single \
     integer, with no extra text. If you are unsure, make your best estimate.";

const DORMERS_QUESTION: &str =
    "Does the building in the image(s) have dormers or indicate the presence of an additional \
     floor? Answer True or False.";

const MASONRY_QUESTION: &str =
    "Does the building in the image(s) have brick or masonry walls? Answer True or False.";

const ADDITIONS_QUESTION: &str =
    "Is there any evidence that another building is attached to the building in the image(s) by \
     means of a roof, elevated walkway, rigid exterior wall, or stairway? Answer True or False.";

const DIAGRAM_FIVE_QUESTION: &str =
    "If a building has an elevated floor and the space underneath is open with lattice or slats \
     rather than solid walls, the open area does not count as an enclosed space and the building \
     is classified as a Diagram 5 structure. Is the building in the image(s) a Diagram 5 \
     structure? Answer True or False.";

const ELEVATOR_SHAFT_QUESTION: &str =
    "Analyze the given image(s) deeply: is there any evidence of an enclosed elevator shaft? \
     Answer True or False.";

const UNEXPECTED_RESPONSE: &str =
    "The visual oracle provided an unexpected response. Underwriting review required.";

/// Rule 12: whether photographs are required at all. Pure context check; no
/// oracle involvement.
pub(crate) fn verify_photograph_requirement(ctx: &FieldContext) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::PhotographRequirement);
    if ctx
        .construction_status_application
        .trim()
        .eq_ignore_ascii_case("yes")
    {
        log.note("Building is under construction. Photographs are not required.");
    } else {
        log.note("Building is not under construction. Photographs are required.");
    }
    log.finish_with(Vec::new())
}

/// Rule 13: NFIP building eligibility from the photographs.
pub(crate) async fn verify_building_eligibility(
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let answer = ask(oracle, images, BUILDING_ELIGIBILITY_QUESTION).await?;
    let mut log = RuleLog::new(RuleCheck::BuildingEligibility);
    match answer {
        OracleAnswer::Affirmative => log.pass(
            "The building is affixed to a permanent site, has two or more outside rigid walls, \
             and a fully secured roof.",
        ),
        OracleAnswer::Negative => log.fail(
            "The building is not affixed to a permanent site, does not have two or more outside \
             rigid walls, or does not have a fully secured roof. Underwriting review required.",
        ),
        OracleAnswer::Unexpected(_) => log.warn(UNEXPECTED_RESPONSE),
    }
    Ok(log.finish_with(Vec::new()))
}

/// Rule 14: occupancy type agreement, plus a multi-unit confirmation from
/// the photographs for residential-style occupancies.
pub(crate) async fn verify_occupancy(
    ctx: &FieldContext,
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let mut log = RuleLog::new(RuleCheck::Occupancy);

    if ctx.occupancy_application == ctx.occupancy_certificate {
        log.pass("Occupancy type matches on certificate and application.");
    } else {
        log.fail("Please review. Occupancy type does not match on certificate and application.");
    }

    let application = ctx.occupancy_application.trim().to_lowercase();
    let certificate = ctx.occupancy_certificate.trim().to_lowercase();
    let multi_unit_style = application == "residential"
        || matches!(
            certificate.as_str(),
            "non-residential"
                | "other residential"
                | "residential condominium building"
                | "two-four family"
        );

    if multi_unit_style {
        match ask(oracle, images, MULTI_UNIT_QUESTION).await? {
            OracleAnswer::Affirmative => log.pass(
                "The occupancy is residential-style and the photographs show a multi-unit structure.",
            ),
            OracleAnswer::Negative => log.fail(
                "The occupancy is residential-style but the photographs do not show a multi-unit \
                 structure. Underwriting review required.",
            ),
            OracleAnswer::Unexpected(_) => log.warn(UNEXPECTED_RESPONSE),
        }
    } else {
        log.warn(
            "The occupancy type is not residential, non-residential, other residential, \
             residential condominium building, or two-four family. Underwriting review required.",
        );
    }

    Ok(log.finish_with(Vec::new()))
}

/// Rule 15: no part of the building may sit over water.
pub(crate) async fn verify_over_water(
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let answer = ask(oracle, images, OVER_WATER_QUESTION).await?;
    let mut log = RuleLog::new(RuleCheck::OverWater);
    match answer {
        OracleAnswer::Affirmative => {
            log.fail("The building is over water. Underwriting review required.")
        }
        OracleAnswer::Negative => log.pass("The building is not over water."),
        OracleAnswer::Unexpected(_) => log.warn(UNEXPECTED_RESPONSE),
    }
    Ok(log.finish_with(Vec::new()))
}

/// Rule 16: the photographs must show enough of the building to verify the
/// foundation and floor count.
pub(crate) async fn verify_foundation_visibility(
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let answer = ask(oracle, images, FOUNDATION_VISIBILITY_QUESTION).await?;
    let mut log = RuleLog::new(RuleCheck::FoundationVisibility);
    match answer {
        OracleAnswer::Affirmative => log.pass(
            "The photographs show the front and back of the building, including the foundation \
             system, with the number of floors clearly visible.",
        ),
        OracleAnswer::Negative => log.fail(
            "The photographs do not show the front and back of the building, or the foundation \
             system or number of floors are not clearly visible. Underwriting review required.",
        ),
        OracleAnswer::Unexpected(_) => log.warn(UNEXPECTED_RESPONSE),
    }
    Ok(log.finish_with(Vec::new()))
}

/// Rule 17: the foundation type implied by the application's diagram number
/// (after any reassignment) against what the oracle sees.
pub(crate) async fn verify_foundation_type(
    ctx: &FieldContext,
    oracle: &RetryingOracle<'_>,
    images: &[String],
    tables: &ReferenceTables,
) -> Result<RuleOutcome, RuleError> {
    let mut log = RuleLog::new(RuleCheck::FoundationType);

    let diagram = ctx.diagram_number_application.as_deref().unwrap_or_default();
    let Some(expected) = tables.foundation_for_diagram(diagram) else {
        log.warn(format!(
            "The application diagram number '{diagram}' does not imply a foundation type. \
             Underwriting review required."
        ));
        return Ok(log.finish_with(Vec::new()));
    };

    let seen = oracle
        .ask(images, &[FOUNDATION_TYPE_QUESTION.to_string()])
        .await?;

    log.note(format!("Foundation type implied by the application: {expected}"));
    log.note(format!("Foundation type in the photographs: {}", seen.trim()));

    if expected.trim().to_lowercase() == seen.trim().to_lowercase() {
        log.pass("The foundation type in the application matches the photographs.");
    } else {
        log.fail(
            "The foundation type in the application does not match the photographs. \
             Underwriting review required.",
        );
    }

    Ok(log.finish_with(Vec::new()))
}

/// Rule 18: floor count in the application against the photographs.
pub(crate) async fn verify_floor_count(
    ctx: &FieldContext,
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let mut log = RuleLog::new(RuleCheck::FloorCount);
    log.note(format!(
        "Number of floors in the application: {}",
        ctx.floors_application
    ));

    let answer = oracle
        .ask(images, &[FLOOR_COUNT_QUESTION.to_string()])
        .await?;

    match (first_decimal(&ctx.floors_application), first_decimal(&answer)) {
        (Some(reported), Some(seen)) => {
            log.note(format!("Number of floors in the photographs: {seen}"));
            if reported == seen {
                log.pass("The number of floors in the application matches the photographs.");
            } else {
                log.fail(
                    "The number of floors in the application does not match the photographs. \
                     Underwriting review required.",
                );
            }
        }
        _ => {
            log.warn(
                "Unable to compare the number of floors because one of the values is not \
                 numeric. Underwriting review required.",
            );
        }
    }

    Ok(log.finish_with(Vec::new()))
}

/// Rule 19: dormers or evidence of an undisclosed additional floor.
pub(crate) async fn verify_dormers(
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let answer = ask(oracle, images, DORMERS_QUESTION).await?;
    let mut log = RuleLog::new(RuleCheck::Dormers);
    match answer {
        OracleAnswer::Affirmative => log.fail(
            "The building has dormers or indicates the presence of an additional floor. \
             Underwriting review required.",
        ),
        OracleAnswer::Negative => {
            log.pass("The building does not have dormers or indicate an additional floor.")
        }
        OracleAnswer::Unexpected(_) => log.warn(UNEXPECTED_RESPONSE),
    }
    Ok(log.finish_with(Vec::new()))
}

/// Rule 20: declared construction type against the walls in the photographs.
pub(crate) async fn verify_construction_type(
    ctx: &FieldContext,
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let mut log = RuleLog::new(RuleCheck::ConstructionType);

    match ctx.construction_type_application.as_str() {
        "other" | "others" => {
            log.pass("Construction type is marked as 'Other' in the application.");
        }
        declared @ ("frame" | "masonry") => {
            let masonry_walls = ask(oracle, images, MASONRY_QUESTION).await?;
            match (declared, masonry_walls) {
                ("frame", OracleAnswer::Affirmative) => log.fail(
                    "Construction type is marked as 'Frame', but the building has brick or \
                     masonry walls. Underwriting review required.",
                ),
                ("frame", OracleAnswer::Negative) => log.pass(
                    "Construction type is marked as 'Frame', and the building does not have \
                     brick or masonry walls.",
                ),
                ("masonry", OracleAnswer::Affirmative) => log.pass(
                    "Construction type is marked as 'Masonry', and the building has brick or \
                     masonry walls.",
                ),
                ("masonry", OracleAnswer::Negative) => log.fail(
                    "Construction type is marked as 'Masonry', but the building does not have \
                     brick or masonry walls. Underwriting review required.",
                ),
                _ => log.warn(UNEXPECTED_RESPONSE),
            }
        }
        other => {
            log.warn(format!(
                "Unexpected construction type: '{other}'. Underwriting review required."
            ));
        }
    }

    Ok(log.finish_with(Vec::new()))
}

/// Rule 21: attached additions (walkways, shared roofs, stairways).
pub(crate) async fn verify_additions(
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let answer = ask(oracle, images, ADDITIONS_QUESTION).await?;
    let mut log = RuleLog::new(RuleCheck::Additions);
    match answer {
        OracleAnswer::Affirmative => log.fail(
            "An extra structure is attached to the building. Underwriting review required.",
        ),
        OracleAnswer::Negative => log.pass("The building does not have any extra unit attached."),
        OracleAnswer::Unexpected(_) => log.warn(UNEXPECTED_RESPONSE),
    }
    Ok(log.finish_with(Vec::new()))
}

/// Rule 22: Diagram 5 determination from the photographs. A confirmed
/// Diagram 5 structure reassigns the application's diagram number in the
/// context; the Diagram 6 check depends on that answer.
pub(crate) async fn verify_diagram_five(
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let answer = ask(oracle, images, DIAGRAM_FIVE_QUESTION).await?;
    let mut log = RuleLog::new(RuleCheck::DiagramFive);
    let mut updates = Vec::new();
    match answer {
        OracleAnswer::Affirmative => {
            log.pass(
                "The photographs show a Diagram 5 structure. Assigning diagram number as 5.",
            );
            updates.push(ContextUpdate::DiagramNumber("5".to_string()));
        }
        OracleAnswer::Negative => {
            log.fail("The photographs do not show a Diagram 5 structure.");
        }
        OracleAnswer::Unexpected(_) => log.warn(UNEXPECTED_RESPONSE),
    }
    Ok(log.finish_with(updates))
}

/// Rule 23: a Diagram 5 building with an enclosed elevator shaft is really
/// Diagram 6. Reads the diagram number after the Diagram 5 determination.
pub(crate) async fn verify_diagram_six(
    ctx: &FieldContext,
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let mut log = RuleLog::new(RuleCheck::DiagramSix);
    let mut updates = Vec::new();

    if ctx.diagram_number_application.as_deref().map(str::trim) == Some("5") {
        match ask(oracle, images, ELEVATOR_SHAFT_QUESTION).await? {
            OracleAnswer::Affirmative => {
                log.fail(
                    "The diagram number is 5, but the building has an enclosed elevator shaft. \
                     Assigning diagram number as 6.",
                );
                updates.push(ContextUpdate::DiagramNumber("6".to_string()));
            }
            OracleAnswer::Negative => {
                log.pass(
                    "The diagram number is 5, and the building does not have an enclosed \
                     elevator shaft.",
                );
            }
            OracleAnswer::Unexpected(_) => log.warn(UNEXPECTED_RESPONSE),
        }
    } else {
        log.pass("Diagram number is not 5; the rule does not apply.");
    }

    Ok(log.finish_with(updates))
}

/// Rule 24: appliance and machinery elevation verified against the
/// photographs, with the question chosen by the application's foundation
/// type. An unanswered appliance question is a Warning, not a "no".
pub(crate) async fn verify_machinery_photo(
    ctx: &FieldContext,
    oracle: &RetryingOracle<'_>,
    images: &[String],
) -> Result<RuleOutcome, RuleError> {
    let mut log = RuleLog::new(RuleCheck::MachineryPhoto);

    match ctx.appliances_elevated.as_deref().map(str::trim) {
        Some(flag) if flag.eq_ignore_ascii_case("no") => {
            log.pass("No appliances are elevated above the first floor.");
        }
        Some(flag) if flag.eq_ignore_ascii_case("yes") => {
            log.warn("Appliances are elevated above the first floor.");

            match machinery_question(&ctx.foundation_type_application) {
                Some(question) => match ask(oracle, images, question).await? {
                    OracleAnswer::Affirmative => {
                        log.pass("Machinery is elevated according to the rule.")
                    }
                    OracleAnswer::Negative => log.fail(
                        "Machinery is not elevated according to the rule. Underwriting review \
                         required.",
                    ),
                    OracleAnswer::Unexpected(_) => log.warn(UNEXPECTED_RESPONSE),
                },
                None => {
                    log.warn(format!(
                        "Foundation type '{}' on the application does not map to a machinery \
                         elevation check. Underwriting review required.",
                        ctx.foundation_type_application
                    ));
                }
            }
        }
        Some(flag) if !flag.is_empty() => {
            log.warn(format!(
                "Appliance elevation answer '{flag}' on the application is not yes/no. \
                 Underwriting review required."
            ));
        }
        _ => {
            log.warn(
                "The appliance elevation question is not answered on the application. \
                 Underwriting review required.",
            );
        }
    }

    Ok(log.finish_with(Vec::new()))
}

/// Machinery-elevation question matched to the foundation family. The
/// elevation the adjuster needs to see differs by where the lowest usable
/// floor sits.
fn machinery_question(foundation_type: &str) -> Option<&'static str> {
    let foundation = foundation_type.trim().to_lowercase();
    if foundation.is_empty() {
        return None;
    }
    if foundation.contains("slab") {
        Some(
            "Return True if the image(s) show exterior machinery and equipment such as an AC \
             condenser, elevator, or generator elevated at least to attic height for a single \
             floor building, or to within a foot of the second or higher floor for a taller \
             building. Otherwise return False.",
        )
    } else if foundation.contains("basement") {
        Some(
            "Return True if the building in the image(s) shows exterior machinery or equipment \
             elevated to at least within a foot of the height of the floor above the basement \
             or higher. Otherwise return False.",
        )
    } else if foundation.contains("without enclosure") {
        Some(
            "Return True if the building in the image(s) shows exterior machinery elevated to \
             at least within a foot of the height of the lowest elevated floor or higher. \
             Otherwise return False.",
        )
    } else if foundation.contains("with enclosure") {
        Some(
            "Return True if the building in the image(s) shows exterior machinery such as an AC \
             condenser, elevator, or generator elevated to at least within a foot of the height \
             of the lowest elevated floor or higher. Otherwise return False.",
        )
    } else if foundation.contains("crawlspace") {
        Some(
            "Return True if the building in the image(s) shows exterior machinery such as an AC \
             condenser, elevator, or generator elevated to at least within a foot of the height \
             of the floor above the crawlspace or higher. Otherwise return False.",
        )
    } else {
        None
    }
}

async fn ask(
    oracle: &RetryingOracle<'_>,
    images: &[String],
    question: &str,
) -> Result<OracleAnswer, RuleError> {
    let answer = oracle.ask(images, &[question.to_string()]).await?;
    Ok(classify_answer(&answer))
}
