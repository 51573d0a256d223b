//! Elevation-logic checks: diagram-number-dependent decision tables over the
//! certificate's Section C/E/H measurements.
//!
//! The tolerances (2 ft, 5 ft, 6 ft, 8 ft, 20 ft) encode FEMA's engineering
//! guidance per foundation class. Diagram-group membership comes from the
//! reference tables; the diagram number itself is read from the context so a
//! reassignment made by an earlier check is what later checks observe.

use super::{RuleCheck, RuleLog, RuleOutcome};
use crate::extraction::{ContextUpdate, FieldContext};
use crate::reference::{DiagramGroups, ReferenceTables};

fn certificate_diagram(ctx: &FieldContext) -> String {
    ctx.diagram_number_certificate
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Rule 2: diagram numbers on both documents, with gap-driven
/// reclassification of the application's diagram. A reassignment is handed
/// back as a context update so every later consumer sees the new value.
pub(crate) fn verify_diagram_number(ctx: &FieldContext) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::DiagramNumber);
    let mut updates = Vec::new();

    log.note(format!(
        "Certificate diagram number: {}",
        ctx.diagram_number_certificate.as_deref().unwrap_or("(missing)")
    ));
    log.note(format!(
        "Application diagram number: {}",
        ctx.diagram_number_application.as_deref().unwrap_or("(missing)")
    ));

    let mut application = ctx.diagram_number_application.clone();
    let bottom = ctx.top_of_bottom_floor_application;
    let next_higher = ctx.top_of_next_higher_floor_application;

    if application.as_deref() == Some("8")
        && (bottom - next_higher).abs() > 5.0
    {
        log.note(
            "Diagram number on the application is 8, but there is more than a 5 foot difference \
             between the top of bottom floor and the top of next higher floor. Reassigning diagram number as 7.",
        );
        application = Some("7".to_string());
        updates.push(ContextUpdate::DiagramNumber("7".to_string()));
    }

    if ctx.diagram_number_application.as_deref() == Some("9") {
        if ctx.section_c_lag_application - bottom > 2.0 {
            log.note(
                "Diagram number on the application is 9, but the top of bottom floor is more than \
                 2 feet below the LAG. Reassigning diagram number as 2.",
            );
            application = Some("2".to_string());
        }
        if bottom - next_higher > 5.0 {
            log.note(
                "Diagram number on the application is 9, but there is more than a 5 foot difference \
                 between the top of bottom floor and the top of next higher floor. Reassigning diagram number as 2.",
            );
            application = Some("2".to_string());
        }
        if application.as_deref() == Some("2") {
            updates.push(ContextUpdate::DiagramNumber("2".to_string()));
        }
    }

    match (&ctx.diagram_number_certificate, &application) {
        (Some(certificate), Some(application)) => {
            let matched = certificate
                .trim()
                .to_lowercase()
                .chars()
                .next()
                .zip(application.trim().to_lowercase().chars().next())
                .map(|(a, b)| a == b)
                .unwrap_or(false);
            if matched {
                log.pass("Diagram numbers match.");
            } else {
                log.fail(
                    "The diagram numbers on the certificate and application do not match. \
                     Underwriting review required.",
                );
            }
        }
        _ => {
            log.warn("The diagram number is missing on the certificate or application. Underwriting review required.");
        }
    }

    log.finish_with(updates)
}

/// Rule 3: crawlspace + garage square footage against the application's
/// enclosure size, for diagrams implying an enclosure.
pub(crate) fn verify_crawlspace(ctx: &FieldContext, tables: &ReferenceTables) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::CrawlspaceDetails);
    let groups = &tables.diagram_groups;
    let diagram = certificate_diagram(ctx);

    if DiagramGroups::contains(&groups.crawlspace, &diagram) {
        let total = ctx.total_enclosure_square_footage();
        if total == ctx.enclosure_size_application {
            log.pass(format!(
                "Diagram number implies an enclosure, and crawlspace plus garage square footage \
                 {total} is aligned with the total enclosure size {} in the application.",
                ctx.enclosure_size_application
            ));
        } else {
            log.fail(
                "The square footage of the enclosure(s) on the certificate doesn't match the \
                 application. Underwriting review required.",
            );
        }
    } else {
        log.pass("Diagram number does not imply an enclosure, so no comparison is required.");
    }

    log.finish_with(Vec::new())
}

/// Rule 7: Section C measurements — source agreement plus the per-diagram
/// elevation decision table.
pub(crate) fn verify_section_c(ctx: &FieldContext, tables: &ReferenceTables) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::SectionC);
    let groups = &tables.diagram_groups;
    let diagram = certificate_diagram(ctx);

    let lag = ctx.lag_certificate;
    let bottom = ctx.top_of_bottom_floor_certificate;
    let next_higher = ctx.top_of_next_higher_floor_certificate;

    if ctx.hag_certificate < lag {
        log.fail(
            "The certificate elevation of the HAG is lower than the LAG. Underwriting review required.",
        );
    } else {
        log.pass("The certificate elevation of the HAG is higher than the LAG.");
    }

    if ctx.uses_section('c') {
        if bottom == ctx.top_of_bottom_floor_application {
            log.pass("Top of bottom floor matches on certificate and application.");
        } else {
            log.fail("Please review. Top of bottom floor does not match on certificate and application.");
        }

        if ctx.top_of_next_higher_floor_application == next_higher {
            log.pass("Top of next higher floor matches on certificate and application.");
        } else {
            log.fail("Please review. Top of next higher floor does not match on certificate and application.");
        }

        if ctx.lag_application == lag {
            log.pass("Lowest adjacent grade (LAG) matches on certificate and application.");
        } else {
            log.fail("Please review. Lowest adjacent grade (LAG) does not match on certificate and application.");
        }

        if DiagramGroups::contains(&groups.slab, &diagram) {
            if bottom < lag + 2.0 {
                log.pass("Elevation logic matched. The top of bottom floor is within 2 feet of the LAG.");
            } else {
                log.fail("Please review foundation system as the top of bottom floor is not within 2 feet of the LAG.");
            }

            if bottom >= lag {
                log.pass("Elevation logic matched. Top of bottom floor is greater than the LAG.");
            } else {
                log.fail("Please review the foundation system as the top of bottom floor is less than the LAG.");
            }
        } else if diagram == groups.stem_wall {
            if lag <= bottom && bottom < lag + 6.0 {
                log.pass("Elevation logic matched. The top of bottom floor is within 6 feet of the LAG.");
            } else {
                log.fail("Please review stem-wall foundation system as the top of bottom floor is not within 6 feet of the LAG.");
            }
        } else if DiagramGroups::contains(&groups.subgrade, &diagram) {
            if bottom < lag {
                log.pass("Elevation logic matched. The top of bottom floor is below the LAG.");
            } else {
                log.fail("Please verify the building foundation as the top of bottom floor is not below the LAG.");
            }
        } else if diagram == groups.elevated_open {
            if lag <= bottom {
                log.pass("Elevation logic matched. The top of bottom floor elevation is above the LAG for this Diagram 5 building.");
            } else {
                log.fail("Please verify foundation system. The top of bottom floor elevation is below the LAG for this Diagram 5 building.");
            }

            if bottom <= lag + 20.0 {
                log.pass("Elevation logic matched. Top of bottom floor is within 20 feet of the LAG.");
            } else {
                log.fail("Please review elevations and photographs as there is more than a 20 foot difference between C2a and the LAG.");
            }
        }

        if DiagramGroups::contains(&groups.with_enclosure, &diagram) {
            if next_higher != 0.0 && next_higher > bottom {
                log.pass("Elevation logic matched. The C2b elevation is not lower than the C2a elevation.");
            } else {
                log.fail("Underwriting review required. The C2b elevation is lower than the C2a elevation.");
            }
        }

        if (lag - bottom).abs() > 20.0 {
            log.fail("There is more than a 20 foot difference between C2a and the LAG. Review of photographs required.");
        } else {
            log.pass("LAG and C2a difference is smaller than 20 feet. No underwriter review required.");
        }

        if (lag - next_higher).abs() > 20.0 {
            log.fail("Please review elevations and photographs as there is more than a 20 foot difference between the LAG and the next higher floor.");
        } else {
            log.pass("LAG and C2b difference is smaller than 20 feet. No underwriter review required.");
        }
    }

    log.finish_with(Vec::new())
}

/// Rule 8: Section E measurements for certificates surveyed without a full
/// Section C, with the same per-diagram decision table over E1a/E1b/E2.
pub(crate) fn verify_section_e(ctx: &FieldContext, tables: &ReferenceTables) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::SectionE);
    let groups = &tables.diagram_groups;
    let diagram = certificate_diagram(ctx);
    let lag = ctx.lag_certificate;

    if !ctx.uses_section('e') {
        log.fail("Section E measurements are not used in the application.");
        return log.finish_with(Vec::new());
    }
    log.pass("Section E measurements are used in the application.");

    if ctx.e1b.abs() == ctx.top_of_bottom_floor_application.abs() {
        log.pass("Certificate top of bottom floor matches the application.");
    } else {
        log.fail(
            "The top of bottom floor elevation in Section E of the certificate doesn't match the \
             application. Underwriting review required.",
        );
    }

    if DiagramGroups::contains(&groups.slab, &diagram) {
        if ctx.e1b < lag + 2.0 {
            log.pass("Elevation logic matched. The top of bottom floor is within 2 feet of the LAG.");
        } else {
            log.fail("Please review foundation system as the top of bottom floor is not within 2 feet of the LAG.");
        }

        if ctx.e1b >= lag {
            log.pass("Elevation logic matched. The top of bottom floor is greater than the LAG.");
        } else {
            log.fail("Please review foundation system as the top of bottom floor is less than the LAG.");
        }
    } else if diagram == groups.stem_wall {
        if ctx.e1b <= lag + 6.0 {
            log.pass("Elevation logic matched. The E1b elevation is within 6 feet of the LAG.");
        } else {
            log.fail("Please review. The E1b elevation is not within 6 feet of the LAG.");
        }

        if ctx.e1b >= lag {
            log.pass("Elevation logic matched. The E1b elevation is greater than the LAG.");
        } else {
            log.fail("Please review. The E1b elevation is lower than the LAG.");
        }
    } else if diagram == groups.elevated_open {
        if ctx.e1b <= lag + 20.0 {
            log.pass("Elevation logic matched. E1b is within 20 feet of the LAG.");
        } else {
            log.fail("Please review elevations and photographs as there is more than a 20 foot difference between the E1b elevation and the LAG.");
        }

        if ctx.e1b >= lag {
            log.pass("Elevation logic matched. The E1b elevation is greater than the LAG.");
        } else {
            log.fail("The top of bottom floor elevation is below the LAG for this Diagram 5 building. Please verify foundation system.");
        }
    } else if DiagramGroups::contains(&groups.subgrade, &diagram) {
        if ctx.e1b < lag {
            log.pass("Elevation logic matched. The top of bottom floor is below the LAG.");
        } else {
            log.fail("Please review the foundation system as the top of bottom floor is not below the LAG.");
        }
    }

    if DiagramGroups::contains(&groups.crawlspace, &diagram) {
        if ctx.e2 == 0.0 {
            log.fail("Please review the elevation certificate as the E2 elevation is not present.");
        }

        if ctx.e2 > ctx.e1a {
            log.pass("E2 is higher than E1a. Elevation logic matched.");
        } else {
            log.fail("Please review the elevation certificate as E2 is not higher than E1a.");
        }
    }

    if ctx.e1a > 20.0 || ctx.e1b > 20.0 || ctx.e2 > 20.0 {
        log.fail("Please review elevations and photographs as there is more than a 20 foot difference in Section E.");
    } else {
        log.pass("E1a, E1b, and E2 are smaller than 20 feet. No underwriter review required.");
    }

    log.finish_with(Vec::new())
}

/// Rule 9: Section H measurements for certificates surveyed under the
/// abbreviated form.
pub(crate) fn verify_section_h(ctx: &FieldContext, tables: &ReferenceTables) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::SectionH);
    let groups = &tables.diagram_groups;
    let diagram = certificate_diagram(ctx);
    let lag = ctx.lag_certificate;

    if !ctx.uses_section('h') {
        log.note("Section H measurements are not used in the application.");
        return log.finish_with(Vec::new());
    }
    log.pass("Section H measurements are used in the application.");

    if DiagramGroups::contains(&groups.slab, &diagram) {
        if ctx.h1a <= lag + 2.0 {
            log.pass("Elevation logic matched. The top of bottom floor is within 2 feet of the LAG.");
        } else {
            log.fail("Please review foundation system as the top of bottom floor is not within 2 feet of the LAG.");
        }

        if ctx.h1a >= lag {
            log.pass("Elevation logic matched. The top of bottom floor is greater than the LAG.");
        } else {
            log.fail("Please review foundation system as the top of bottom floor is less than the LAG.");
        }
    } else if diagram == groups.stem_wall {
        if lag <= ctx.h1a {
            log.pass("H1a: the elevation is above the LAG for this stem-wall building. Elevation logic matched.");
        } else {
            log.fail("Please review the foundation system as the top of bottom floor is below the LAG.");
        }

        if ctx.h1a < lag + 6.0 {
            log.pass("The top of bottom floor is within 6 feet of the LAG.");
        } else {
            log.fail("Please review the foundation system as the top of bottom floor is not within 6 feet of the LAG.");
        }
    } else if DiagramGroups::contains(&groups.subgrade, &diagram) {
        if lag > ctx.h1a {
            log.pass("Top of bottom floor is below the LAG. Elevation logic matched.");
        } else {
            log.fail("Please review foundation system as the top of bottom floor is at or above the LAG.");
        }
    } else if diagram == groups.elevated_open {
        if ctx.h1a <= lag + 20.0 {
            log.pass("There is not more than a 20 foot difference between H1a and the LAG. Elevation logic matched.");
        } else {
            log.fail("Please review elevations and photographs as there is more than a 20 foot difference between H1a and the LAG.");
        }

        if lag <= ctx.h1a {
            log.pass("H1a elevation is above the LAG. Elevation logic matched.");
        } else {
            log.fail("Please review. The H1a elevation is below the LAG.");
        }
    }

    if DiagramGroups::contains(&groups.with_enclosure, &diagram) {
        if ctx.h1b != 0.0 {
            log.pass("H1b is present on the certificate.");
        } else {
            log.fail("Underwriting review required as H1b is missing from the certificate.");
        }

        if ctx.h1b > ctx.h1a {
            log.pass("H1b is greater than H1a. Elevation logic matched.");
        } else {
            log.fail("Underwriting review required as H1b is not greater than H1a.");
        }

        if ctx.h1a > 20.0 || ctx.h1b > 20.0 {
            log.fail("Please review elevations and photographs as there is more than a 20 foot difference described in Section H.");
        } else {
            log.pass("H1a and H1b are smaller than 20 feet. No underwriter review required.");
        }
    }

    log.finish_with(Vec::new())
}

/// Rule 10: machinery and equipment elevation. An SFHA/BFE screen first,
/// then per-diagram checks of the machinery elevation, the 8 ft platform
/// allowance, and the certificate's H2 flag. The application's machinery
/// answer distinguishes "absent" from an explicit "no".
pub(crate) fn verify_machinery_logic(ctx: &FieldContext, tables: &ReferenceTables) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::MachineryLogic);
    let groups = &tables.diagram_groups;
    let diagram = certificate_diagram(ctx);
    let zone = ctx.flood_zone_application.to_uppercase();
    let machinery_elevation = ctx.machinery_elevation_certificate;

    if matches!(zone.as_str(), "X" | "B" | "C" | "A99") {
        log.pass("Flood zone is among X, B, C, A99. BFE logic is not applicable.");
    } else if tables.is_sfha(&zone) {
        match ctx.bfe_application {
            Some(bfe) => {
                if machinery_elevation >= bfe {
                    log.pass(format!(
                        "Machinery elevation {machinery_elevation} is at or above BFE {bfe}."
                    ));
                } else {
                    log.fail(format!(
                        "Machinery elevation {machinery_elevation} is below BFE {bfe}. Continue to the diagram checks."
                    ));
                }
            }
            None => {
                log.warn("Property is in an SFHA but no BFE is provided. Continue to the diagram checks.");
            }
        }
    } else {
        log.warn("Property is not in an SFHA or the flood zone is unrecognized. Continue to the diagram checks.");
    }

    match ctx.machinery_flag.as_deref().map(str::trim) {
        Some(flag) if flag.eq_ignore_ascii_case("yes") => {
            log.pass("Machinery or equipment above the first floor is claimed in the application.");

            if DiagramGroups::contains(&groups.machinery_slab, &diagram) {
                if ctx.top_of_next_higher_floor_certificate != 0.0 {
                    if machinery_elevation >= ctx.top_of_next_higher_floor_certificate {
                        log.pass("Elevation logic matched. The M&E elevation on the certificate supports the M&E mitigation discount.");
                    } else {
                        log.fail("The M&E elevation on the certificate does not appear to support the M&E mitigation discount. Underwriting review required.");
                    }
                } else if machinery_elevation >= ctx.top_of_bottom_floor_certificate + 8.0 {
                    log.pass("Elevation of machinery is at least 8 feet above the top of bottom floor. Elevation logic matched.");
                } else {
                    log.fail("Elevation of machinery is not 8 feet above the top of bottom floor. The M&E elevation on the certificate does not appear to support the M&E mitigation discount. Underwriting review required.");
                }

                if ctx.e4_platform >= ctx.e1b + 8.0 {
                    log.pass(format!(
                        "The top of the machinery platform ({}) is at least 8 feet above the top of bottom floor ({}). Elevation logic matched.",
                        ctx.e4_platform, ctx.e1b
                    ));
                } else {
                    log.fail("The M&E platform elevation on the certificate does not appear to support the M&E mitigation discount. Underwriting review required.");
                }

                match h2_answer(ctx) {
                    Some(true) => log.note("H2 is marked as 'Yes' on the certificate."),
                    Some(false) => log.fail("Section H2 of the certificate does not appear to support the M&E mitigation discount. Underwriting review required."),
                    None => log.note("H2 is not marked on the certificate."),
                }
            } else if DiagramGroups::contains(&groups.with_enclosure, &diagram) {
                if machinery_elevation >= ctx.top_of_next_higher_floor_certificate {
                    log.pass("The elevation of machinery is at or above the top of next higher floor. Elevation logic matched.");
                } else {
                    log.fail("The M&E elevation on the certificate does not appear to support the M&E mitigation discount. Underwriting review required.");
                }

                if ctx.e4_platform >= ctx.e2 {
                    log.pass("Top of the machinery platform is at or above E2. Elevation logic matched.");
                } else {
                    log.fail("The M&E platform elevation on the certificate does not appear to support the M&E mitigation discount. Underwriting review required.");
                }

                match h2_answer(ctx) {
                    Some(true) => log.note("H2 is marked as 'Yes' on the certificate."),
                    Some(false) => log.note("H2 is marked as 'No' on the certificate."),
                    None => log.note("H2 is not marked on the certificate."),
                }
            } else if diagram == groups.elevated_open {
                if machinery_elevation >= ctx.top_of_bottom_floor_certificate {
                    log.pass(format!(
                        "For Diagram 5 the machinery elevation ({machinery_elevation}) is at or above the top of bottom floor ({}). Elevation logic matched.",
                        ctx.top_of_bottom_floor_certificate
                    ));
                } else {
                    log.fail("The M&E elevation on the certificate does not appear to support the M&E mitigation discount. Underwriting review required.");
                }

                if ctx.e4_platform >= ctx.e1b {
                    log.pass("Top of the machinery platform is at or above E1b. Elevation logic matched.");
                } else {
                    log.fail("The M&E platform elevation on the certificate does not appear to support the M&E mitigation discount. Underwriting review required.");
                }

                match h2_answer(ctx) {
                    Some(true) => log.note("H2 is marked as 'Yes' on the certificate."),
                    Some(false) => log.fail("Section H2 of the certificate does not appear to support the M&E mitigation discount. Underwriting review required."),
                    None => log.note("H2 is not marked on the certificate."),
                }
            }
        }
        Some(_) => {
            log.note("Machinery or equipment above the first floor is not claimed in the application.");
        }
        None => {
            log.warn("The machinery and equipment question is not answered on the application.");
        }
    }

    log.finish_with(Vec::new())
}

fn h2_answer(ctx: &FieldContext) -> Option<bool> {
    let flag = ctx.h2_flag.as_deref()?.trim().to_lowercase();
    match flag.as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

/// Rule 11: flood-vent count and net area (A8 + A9 sections) against the
/// application, for diagrams implying an enclosure.
pub(crate) fn verify_vents(ctx: &FieldContext, tables: &ReferenceTables) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::Vents);
    let groups = &tables.diagram_groups;
    let diagram = certificate_diagram(ctx);

    if DiagramGroups::contains(&groups.crawlspace, &diagram) {
        log.note("Diagram number implies permanent flood openings.");

        if ctx.openings_count_certificate == ctx.openings_count_application {
            log.pass("Total number of vents on the certificate (Sections A8 + A9) matches the application.");
        } else {
            log.fail("Please review. Total number of vents on the certificate (Sections A8 + A9) does not match the application.");
        }

        if ctx.openings_area_certificate == ctx.openings_area_application {
            log.pass("Total area of vents on the certificate (Sections A8 + A9) matches the application.");
        } else {
            log.fail("Please review. Total area of vents on the certificate (Sections A8 + A9) does not match the application.");
        }
    } else {
        log.pass("Diagram number does not imply permanent flood openings, so no comparison is required.");
    }

    log.finish_with(Vec::new())
}
