//! Pure field-comparison checks: values already normalized by extraction,
//! compared and tiered with no I/O.

use super::{RuleCheck, RuleLog, RuleOutcome};
use crate::extraction::{ContextUpdate, FieldContext};
use crate::normalize::{address, address::AddressTier, dates, normalize};
use crate::reference::ReferenceTables;
use chrono::{Datelike, NaiveDate};

/// Rule 1: the certificate's composed address against the application's
/// property address, scored through the address canonicalizer.
pub(crate) fn verify_address(ctx: &FieldContext, tables: &ReferenceTables) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::AddressMatch);
    log.note(format!("Certificate address: {}", ctx.address_certificate));
    log.note(format!("Application address: {}", ctx.address_application));

    if ctx.street_number_certificate == ctx.street_number_application {
        log.note("Street number matches on certificate and application.");
    } else {
        log.note("Street number does not match on certificate and application.");
    }

    let comparison = address::compare(
        &ctx.address_certificate,
        &ctx.address_application,
        &tables.street_suffixes,
        &tables.state_abbreviations,
    );

    match comparison.tier {
        AddressTier::Matched => log.pass(format!(
            "Addresses match on certificate and application (similarity {:.0}).",
            comparison.score
        )),
        AddressTier::HighSimilarity => log.warn(format!(
            "Addresses have high similarity ({:.0}). Underwriting review required.",
            comparison.score
        )),
        AddressTier::NotMatched => log.fail(format!(
            "Property address on the certificate does not match the application (similarity {:.0}). Underwriting review required.",
            comparison.score
        )),
    }

    log.finish_with(Vec::new())
}

/// Rule 4: CBRS/OPA designations against the application's flag. A building
/// inside a protected area needs additional documentation regardless of the
/// match outcome.
pub(crate) fn verify_cbrs_opa(ctx: &FieldContext) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::CbrsOpa);
    let application = normalize(&ctx.cbrs_opa_application);
    let cbrs = normalize(&ctx.cbrs_certificate);
    let opa = normalize(&ctx.opa_certificate);

    if application != cbrs || application != opa {
        log.fail("CBRS/OPA details do not match.");
    } else {
        log.pass("CBRS/OPA details match the application.");
    }

    if cbrs == "yes" || opa == "yes" {
        log.note("Area is in CBRS/OPA; additional documentation required.");
    } else {
        log.note("Area is not in CBRS/OPA; additional documentation not required.");
    }

    log.finish_with(Vec::new())
}

/// Rule 5: certificate elevation source against the application's
/// course-of-construction answer.
pub(crate) fn verify_construction_status(ctx: &FieldContext) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::ConstructionStatus);
    let certificate = normalize(&ctx.construction_status_certificate);
    let application = normalize(&ctx.construction_status_application);

    if certificate == "finishedconstruction" && application == "yes" {
        log.fail("Construction status mismatched. Confirm the construction status of the building.");
    } else if certificate == "finishedconstruction" && application == "no" {
        log.pass("Construction status matches on certificate and application.");
    } else if certificate == "buildingunderconstruction" && application == "yes" {
        log.pass("Construction status matches on certificate and application.");
    }

    let drawings_or_in_progress = matches!(
        certificate.as_str(),
        "constructiondrawings" | "buildingunderconstruction" | "underconstruction"
    );
    if drawings_or_in_progress && application == "yes" {
        log.warn("A finished construction elevation certificate is required.");
    }

    if log.is_empty() {
        log.warn("Construction status is missing or unrecognized on one or both documents.");
    }

    log.finish_with(Vec::new())
}

/// Rule 6: Section C usage plus certifier name and license presence.
pub(crate) fn verify_certifier(ctx: &FieldContext) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::Certifier);

    let section_c_used = ctx.uses_section('c');
    if section_c_used {
        log.pass("Section C measurements are used in the application.");
    } else {
        log.fail("Section C measurements are not used in the application.");
    }

    if section_c_used {
        if ctx.certifier_name.is_empty() {
            log.fail("Please review. Certifier name is not present on the certificate.");
        } else {
            log.pass(format!(
                "Certifier name '{}' is present on the certificate.",
                ctx.certifier_name
            ));
        }

        if ctx.certifier_license.is_empty() {
            log.fail("Please review. Certifier's license number is not present on the certificate.");
        } else {
            log.pass(format!(
                "Certifier's license number '{}' is present on the certificate.",
                ctx.certifier_license
            ));
        }
    }

    log.finish_with(Vec::new())
}

/// FIRM reconciliation: zone, panel suffix, and index date across both
/// sources. Priority resolution activates only when the dates and suffixes
/// already agree; otherwise the later revision overwrites all three fields
/// for every later consumer.
pub(crate) fn verify_firm_reconciliation(
    ctx: &FieldContext,
    tables: &ReferenceTables,
) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::FirmReconciliation);
    let mut updates = Vec::new();

    if ctx.firm_date_application == ctx.firm_date_certificate {
        log.pass("FIRM index date matches on certificate and application.");

        if ctx.suffix_application == ctx.suffix_certificate {
            if ctx.flood_zone_application == ctx.flood_zone_certificate {
                log.pass("Flood zones and panel suffix match on certificate and application.");
            } else {
                log.warn("Panel suffix matched, but flood zones differ. Assigning the highest priority zone.");

                let application_rank = tables.zone_rank(&ctx.flood_zone_application);
                let certificate_rank = tables.zone_rank(&ctx.flood_zone_certificate);
                let (authoritative, source) = if application_rank < certificate_rank {
                    (ctx.flood_zone_application.clone(), "application")
                } else {
                    (ctx.flood_zone_certificate.clone(), "certificate")
                };
                log.note(format!(
                    "Zone '{}' from the {} has the higher priority and becomes authoritative.",
                    authoritative.to_uppercase(),
                    source
                ));
                updates.push(ContextUpdate::AuthoritativeZone(authoritative));
            }
        } else if ctx.flood_zone_application == ctx.flood_zone_certificate {
            log.warn("Flood zones matched but panel suffix does not. Underwriting review required.");
        } else {
            log.fail("Neither the flood zones nor the panel suffix match.");
        }
    } else {
        match dates::latest_of(&ctx.firm_date_application, &ctx.firm_date_certificate) {
            Ok(latest) => {
                let (zone, suffix, firm_date) = if latest == ctx.firm_date_application {
                    (
                        ctx.flood_zone_application.clone(),
                        ctx.suffix_application.clone(),
                        ctx.firm_date_application.clone(),
                    )
                } else {
                    (
                        ctx.flood_zone_certificate.clone(),
                        ctx.suffix_certificate.clone(),
                        ctx.firm_date_certificate.clone(),
                    )
                };
                log.warn(format!(
                    "FIRM index dates do not match; adopting the later revision dated {firm_date}."
                ));
                updates.push(ContextUpdate::FirmRevision {
                    zone,
                    suffix,
                    firm_date,
                });
            }
            Err(err) => {
                log.warn(format!(
                    "FIRM index dates do not match and could not be compared: {err}."
                ));
            }
        }
    }

    log.finish_with(updates)
}

/// Form validation: the certificate's printed expiration date and the survey
/// date must fall inside one of the published form-cycle window pairs, with
/// hard cutoffs for pre-2003 expirations and pre-October-2000 surveys.
pub(crate) fn verify_form_validity(ctx: &FieldContext, tables: &ReferenceTables) -> RuleOutcome {
    let mut log = RuleLog::new(RuleCheck::FormValidity);

    if ctx.expiration_date.trim().is_empty() {
        log.fail("Certificate expiration date could not be found.");
    }
    if ctx.survey_date.trim().is_empty() {
        log.fail("Survey date could not be found.");
    }
    if !log.is_empty() {
        return log.finish_with(Vec::new());
    }

    let expiration = dates::canonicalize(&ctx.expiration_date);
    let survey = dates::canonicalize(&ctx.survey_date);

    match (expiration, survey) {
        (Ok(expiration), Ok(survey)) => {
            let in_cycle = tables.validity_windows.iter().any(|window| {
                expiration >= window.expiration_start
                    && expiration <= window.expiration_end
                    && survey >= window.survey_start
                    && window.survey_end.map(|end| survey <= end).unwrap_or(true)
            });

            if in_cycle {
                log.pass("Certificate is signed within a valid form cycle.");
            } else {
                log.warn(
                    "The certificate appears to be signed on an invalid date. Underwriting \
                     review required.",
                );
            }

            if expiration.year() < 2003 {
                log.fail("Certificate expiration is earlier than 2003. Underwriting review required.");
            }

            let survey_cutoff =
                NaiveDate::from_ymd_opt(2000, 10, 1).expect("static reference date");
            if survey < survey_cutoff {
                log.fail("Survey date is earlier than 10/01/2000. Underwriting review required.");
            }
        }
        (expiration, survey) => {
            if let Err(err) = expiration {
                log.warn(format!("Could not parse the expiration date: {err}."));
            }
            if let Err(err) = survey {
                log.warn(format!("Could not parse the survey date: {err}."));
            }
        }
    }

    log.finish_with(Vec::new())
}
