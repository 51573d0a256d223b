//! Single-pass field extraction.
//!
//! Everything messy about the two input schemas is confined to this module:
//! one pass over both documents resolves every field any rule consumes,
//! applying the locator and normalizers once. Rules never touch the raw
//! documents. Numeric fields default to 0.0 and text fields to empty when
//! absent; fields where "absent" and "present but falsy" diverge are kept as
//! `Option` so rules can test presence and value separately.

use crate::document::{
    find_any, find_any_nth, find_by_variants, find_near, Document, DEFAULT_NEAR_DEPTH,
};
use crate::normalize::{clean_diagram_value, coerce_float, is_present, normalize, value_text};
use serde_json::Value;

/// Label aliases for the diagram-number field across form revisions.
const DIAGRAM_KEY_VARIANTS: &[&str] = &[
    "building_diagram_number",
    "BuildingDiagram",
    "bldg_diag_num",
    "buildingDiagramNo",
    "Diagram Number",
    "Building Diagram Number",
    "A7",
    "A7. Building Diagram Number",
    "A7 Building Diagram Number",
];

const CERTIFICATE_ADDRESS_KEYS: &[&str] = &[
    "Building Street Address (including Apt., Unit, Suite, and/or Bldg. No.) or P.O. Route and Box No.",
    "A2. Building Street Address (including Apt., Unit, Suite, and/or Bldg. No.) or P.O. Route and Box No.",
    "A2. Building Street Address",
    "Building Street Address",
    "A2",
];

const SQUARE_FOOTAGE_KEYS: &[&str] = &[
    "SquareFootage",
    "square footage of crawlspace or enclosure(s)",
    "a) Square footage of crawlspace or enclosure(s)",
    "A8. For a building with a crawlspace or enclosure(s): a) Square footage of crawlspace or enclosure(s)",
];

const MACHINERY_FLAG_KEYS: &[&str] = &[
    "Is all machinery and equipment servicing the building, located inside or outside the building, elevated above the first floor",
    "Machinery or Equipment Above",
    "the building, located inside or outside the building, elevated above the first floor",
    "building, elevated above the first floor",
    "Does the building contain machinery and equipment servicing the building?",
    "equipment servicing the building",
];

const OPENINGS_COUNT_KEYS: &[&str] = &[
    "Number of permanent flood openings in the crawlspace",
    "Number of permanent flood openings in the crawlspace or enclosures within 1.0 foot above adjacent grade",
    "No. of permanent openings (flood vents) within 1 ft. above adjacent grade",
];

/// Flat, typed view of both documents, produced once per reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct FieldContext {
    // Address.
    pub address_certificate: String,
    pub address_application: String,
    pub street_number_certificate: f64,
    pub street_number_application: f64,

    // Diagram classification. Mutable via [`ContextUpdate`] only.
    pub diagram_number_certificate: Option<String>,
    pub diagram_number_application: Option<String>,

    // Section C elevations.
    pub top_of_bottom_floor_certificate: f64,
    pub top_of_bottom_floor_application: f64,
    pub top_of_next_higher_floor_certificate: f64,
    pub top_of_next_higher_floor_application: f64,
    pub lag_certificate: f64,
    pub lag_application: f64,
    pub hag_certificate: f64,
    pub section_c_lag_application: f64,
    pub machinery_elevation_certificate: f64,

    // Section E elevations.
    pub e1a: f64,
    pub e1b: f64,
    pub e2: f64,
    pub e4_platform: f64,

    // Section H elevations.
    pub h1a: f64,
    pub h1b: f64,
    pub h2_flag: Option<String>,

    // Crawlspace, garage, vents.
    pub crawlspace_square_footage: f64,
    pub garage_square_footage: f64,
    pub enclosure_size_application: f64,
    pub openings_count_certificate: f64,
    pub openings_area_certificate: f64,
    pub openings_count_application: f64,
    pub openings_area_application: f64,

    // Flags and categorical fields.
    pub cbrs_certificate: String,
    pub opa_certificate: String,
    pub cbrs_opa_application: String,
    pub construction_status_certificate: String,
    pub construction_status_application: String,
    pub certifier_name: String,
    pub certifier_license: String,
    pub section_used: String,
    pub machinery_flag: Option<String>,
    pub appliances_elevated: Option<String>,
    pub occupancy_certificate: String,
    pub occupancy_application: String,
    pub floors_application: String,
    pub construction_type_application: String,
    pub foundation_type_application: String,
    pub bfe_application: Option<f64>,

    // FIRM assignment. Mutable via [`ContextUpdate`] only.
    pub flood_zone_certificate: String,
    pub flood_zone_application: String,
    pub suffix_certificate: String,
    pub suffix_application: String,
    pub firm_date_certificate: String,
    pub firm_date_application: String,

    // Form validity.
    pub expiration_date: String,
    pub survey_date: String,
}

impl FieldContext {
    /// Build the context from the raw certificate and application documents.
    pub fn extract(certificate: &Document, application: &Document) -> Self {
        let street_line = text(certificate, CERTIFICATE_ADDRESS_KEYS);
        let city = text(certificate, &["City"]);
        let state = text(certificate, &["State"]);
        let zipcode = text(certificate, &["ZIPCode", "ZIP Code"]);
        let address_certificate = [
            street_line.as_str(),
            city.as_str(),
            state.as_str(),
            zipcode.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

        let address_application = text(application, &["Property Address"]);

        let (crawlspace_square_footage, garage_square_footage) =
            enclosure_square_footage(certificate);

        let (openings_count_certificate, openings_area_certificate) = vent_totals(certificate);

        let floors = text(
            application,
            &[
                "Total # of floors in building",
                "total number of floors in building",
                "total no of floors in building",
            ],
        );

        Self {
            street_number_certificate: number(certificate, CERTIFICATE_ADDRESS_KEYS),
            street_number_application: number(application, &["Property Address"]),
            address_certificate,
            address_application,

            diagram_number_certificate: diagram_number(certificate),
            diagram_number_application: diagram_number(application),

            top_of_bottom_floor_certificate: number(certificate, &["Top of Bottom Floor"]),
            top_of_bottom_floor_application: number(application, &["Top of Bottom Floor"]),
            top_of_next_higher_floor_certificate: number(
                certificate,
                &["Top of Next Higher Floor"],
            ),
            top_of_next_higher_floor_application: number(
                application,
                &["Top of Next Higher Floor"],
            ),
            lag_certificate: number(
                certificate,
                &[
                    "Lowest Adjacent Grade (LAG) next to building",
                    "Lowest adjacent (finished) grade next to building (LAG)",
                    "Lowest Adjacent Grade",
                    "LAG",
                ],
            ),
            lag_application: number(
                application,
                &["Lowest Adjacent Grade (LAG)", "Lowest Adjacent Grade", "LAG"],
            ),
            hag_certificate: number(
                certificate,
                &[
                    "Highest Adjacent Grade",
                    "Highest Adjacent Grade (HAG)",
                    "HAG",
                    "Highest adjacent (finished) grade next to building (HAG)",
                ],
            ),
            section_c_lag_application: number(
                application,
                &["Lowest Adjacent Grade (LAG)", "Lowest Adjacent Grade", "LAG"],
            ),
            machinery_elevation_certificate: number(
                certificate,
                &[
                    "Lowest elevation of Machinery and Equipment (M&E) servicing the building (describe type of M&E and location in section D comments area)",
                    "Lowest elevation of machinery or equipment servicing the building",
                ],
            ),

            e1a: number(
                certificate,
                &[
                    "Top of Bottom Floor",
                    "Top of Bottom Floor (including basement, crawlspace, or enclosure) is",
                    "e1a",
                ],
            ),
            e1b: number_nth(
                certificate,
                &[
                    "Top of Bottom Floor",
                    "Top of Bottom Floor (including basement, crawlspace, or enclosure) is",
                    "e1b",
                ],
                1,
            ),
            e2: number(
                certificate,
                &[
                    "Top of Next Higher Floor",
                    "Top of Next Higher Floor (elevation C2.b in the diagrams) of the building is",
                    "e2",
                ],
            ),
            e4_platform: number(
                certificate,
                &[
                    "Top of platform of machinery and/or equipment servicing the building is",
                    "Top of platform of machinery and/or equipment",
                ],
            ),

            h1a: number(certificate, &["Top of Bottom Floor"]),
            h1b: number(certificate, &["Top of Next Higher Floor"]),
            h2_flag: opt_text(
                certificate,
                &[
                    "Machinery and Equipment (M&E) servicing the building",
                    "Machinery and Equipment servicing the building",
                    "Does the building contain machinery and equipment servicing the building?",
                ],
            ),

            crawlspace_square_footage,
            garage_square_footage,
            enclosure_size_application: number(application, &["Enclosure/Crawlspace Size"]),
            openings_count_certificate,
            openings_area_certificate,
            openings_count_application: number(application, &["Number of Openings"]),
            openings_area_application: number(
                application,
                &[
                    "Area of Permanent Openings (Sq. In.)",
                    "Area of Permanent Openings",
                ],
            ),

            cbrs_certificate: text(certificate, &["CBRS", "CBRSDesignation"]),
            opa_certificate: text(certificate, &["OPA", "OPADesignation"]),
            cbrs_opa_application: text(application, &["Building Located In CBRS/OPA"]),
            construction_status_certificate: text(
                certificate,
                &[
                    "Building elevations are based on",
                    "Building Elevations Source",
                ],
            ),
            construction_status_application: text(
                application,
                &["Building in Course of Construction"],
            ),
            certifier_name: text(
                certificate,
                &["Certifier's Name", "Certifier Name", "CertificateName"],
            ),
            certifier_license: text(certificate, &["License Number"]),
            section_used: text(application, &["Elevation Certificate Section Used"]),
            machinery_flag: opt_text(application, MACHINERY_FLAG_KEYS),
            appliances_elevated: opt_text(
                application,
                &[
                    "Are all appliances elevated above the first floor?",
                    "Appliances on First Floor",
                    "Are all appliances elevated above the first floor",
                ],
            ),
            occupancy_certificate: text(certificate, &["Building Occupancy"]),
            occupancy_application: text(application, &["Occupancy Type"]),
            floors_application: if floors.is_empty() {
                "0".to_string()
            } else {
                floors
            },
            construction_type_application: text(
                application,
                &["Building Construction Type", "Construction Type"],
            )
            .trim()
            .to_lowercase(),
            foundation_type_application: text(application, &["foundation"]),
            bfe_application: find_any(
                application,
                &[
                    "Current Base Flood Elevation(BFE)",
                    "Current Base Flood Elevation",
                    "BFE",
                ],
            )
            .map(coerce_float),

            flood_zone_certificate: normalize(&text(
                certificate,
                &["B8. Flood Zone(s)", "flood zone", "B8", "flood zones"],
            )),
            flood_zone_application: normalize(&text(
                application,
                &["Current Flood Zone", "Flood Zone"],
            )),
            suffix_certificate: normalize(&text(certificate, &["B5. Suffix", "suffix", "B5"])),
            suffix_application: normalize(&text(
                application,
                &["Map Panel Suffix", "suffix", "panel"],
            )),
            firm_date_certificate: normalize(&text(
                certificate,
                &[
                    "B6",
                    "B6 Firm index date",
                    "firm index date",
                    "firm",
                    "firm index",
                    "firm date",
                ],
            )),
            firm_date_application: normalize(&text(application, &["FIRM Date", "firm"])),

            expiration_date: text(certificate, &["Expiration Date", "Expire", "Expiration"]),
            survey_date: find_near(certificate, "Certifier's Name", "Date", DEFAULT_NEAR_DEPTH)
                .map(value_text)
                .unwrap_or_default(),
        }
    }

    /// Combined crawlspace + garage square footage on the certificate.
    pub fn total_enclosure_square_footage(&self) -> f64 {
        self.crawlspace_square_footage + self.garage_square_footage
    }

    /// Whether the application's "Elevation Certificate Section Used" field
    /// names the given section letter. The field arrives as anything from a
    /// bare "C" to "Elevation Certificate Section E Measurements", so the
    /// boilerplate words are stripped before looking for the letter.
    pub fn uses_section(&self, letter: char) -> bool {
        let mut cleaned = self.section_used.to_lowercase();
        for word in ["elevation certificate", "measurements", "section", "used"] {
            cleaned = cleaned.replace(word, " ");
        }
        cleaned.contains(letter.to_ascii_lowercase())
    }

    /// Apply an explicit reclassification decided by a rule. Mutation goes
    /// through here so later rules always observe the reassigned values.
    pub fn apply(&mut self, update: ContextUpdate) {
        match update {
            ContextUpdate::DiagramNumber(value) => {
                self.diagram_number_application = Some(value);
            }
            ContextUpdate::AuthoritativeZone(zone) => {
                self.flood_zone_certificate = zone.clone();
                self.flood_zone_application = zone;
            }
            ContextUpdate::FirmRevision {
                zone,
                suffix,
                firm_date,
            } => {
                self.flood_zone_certificate = zone.clone();
                self.flood_zone_application = zone;
                self.suffix_certificate = suffix.clone();
                self.suffix_application = suffix;
                self.firm_date_certificate = firm_date.clone();
                self.firm_date_application = firm_date;
            }
        }
    }
}

/// Reclassification of a context field, produced by a rule and applied by
/// the orchestrator between rule invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextUpdate {
    /// The application's diagram number was reassigned (gap conditions or a
    /// photograph determination).
    DiagramNumber(String),
    /// Flood-zone disagreement resolved by priority; both sources now carry
    /// the authoritative code.
    AuthoritativeZone(String),
    /// FIRM dates disagreed: the later revision's zone, panel suffix, and
    /// date replace all three fields on both sources.
    FirmRevision {
        zone: String,
        suffix: String,
        firm_date: String,
    },
}

fn text(doc: &Document, keys: &[&str]) -> String {
    find_any(doc, keys)
        .map(|v| value_text(v).trim().to_string())
        .unwrap_or_default()
}

fn opt_text(doc: &Document, keys: &[&str]) -> Option<String> {
    find_any(doc, keys).map(|v| value_text(v).trim().to_string())
}

fn number(doc: &Document, keys: &[&str]) -> f64 {
    find_any(doc, keys).map(coerce_float).unwrap_or(0.0)
}

fn number_nth(doc: &Document, keys: &[&str], index: usize) -> f64 {
    find_any_nth(doc, keys, index).map(coerce_float).unwrap_or(0.0)
}

fn diagram_number(doc: &Document) -> Option<String> {
    find_by_variants(doc, DIAGRAM_KEY_VARIANTS).and_then(|value| {
        let cleaned = match value {
            Value::String(s) => clean_diagram_value(s),
            other => value_text(other),
        };
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    })
}

/// Crawlspace and attached-garage square footage. The certificate nests
/// these under detail blocks whose shape varies: sometimes a bare number,
/// sometimes a mapping with its own square-footage field.
fn enclosure_square_footage(certificate: &Document) -> (f64, f64) {
    let crawlspace = find_any(
        certificate,
        &[
            "CrawlspaceDetails",
            "Crawlspace",
            "for a building with crawlspace or enclosure(s)",
        ],
    );
    let crawlspace_square_footage = match crawlspace {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(details) if is_present(details) => number(details, SQUARE_FOOTAGE_KEYS),
        _ => 0.0,
    };

    let garage = find_any(
        certificate,
        &["GarageDetails", "Garage", "for a building with attached garage"],
    );
    let garage_square_footage = match garage {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(details) if is_present(details) => number(details, SQUARE_FOOTAGE_KEYS),
        _ => 0.0,
    };

    (crawlspace_square_footage, garage_square_footage)
}

/// Total flood-opening count and net area across the A8 and A9 vent
/// sections. Each section reports engineered and non-engineered openings
/// separately on newer forms and a single count on older ones.
fn vent_totals(certificate: &Document) -> (f64, f64) {
    let section_count = |index: usize| -> f64 {
        let non_engineered = number_nth(
            certificate,
            &["Non-Engineered Flood Openings", "Non-Engineered"],
            index,
        );
        let engineered = number_nth(
            certificate,
            &[
                "Engineered Flood Openings",
                "d) Engineered flood openings?",
                "Has Engineered Openings:",
                "Engineered",
            ],
            index,
        );
        let split_total = non_engineered + engineered;
        if split_total != 0.0 {
            split_total
        } else {
            number_nth(certificate, OPENINGS_COUNT_KEYS, index)
        }
    };

    let a8_area = number(
        certificate,
        &[
            "c) Total net area of flood openings in A8.b",
            "Total net area of flood openings in A8.b",
            "Total area of all permanent openings (flood vents) in C3h",
            "Total net open area of non-engineered flood openings",
        ],
    );
    let a9_area = number_nth(
        certificate,
        &[
            "Total net open area of non-engineered flood openings in A9.c",
            "Total net area of flood openings in A9.b",
            "Total area of all permanent openings (flood vents) in C3h",
            "Total net open area of non-engineered flood openings",
        ],
        1,
    );

    let count = section_count(0) + section_count(1);
    let area = a8_area + a9_area;
    (count, area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn certificate() -> Document {
        json!({
            "Section A": {
                "A2. Building Street Address": "123 Main Street",
                "City": "Cedar Rapids",
                "State": "IA",
                "ZIPCode": "52401",
                "A7. Building Diagram Number": "Number 8",
                "CrawlspaceDetails": { "SquareFootage": "600 sq ft" },
                "GarageDetails": { "SquareFootage": 200 },
            },
            "Section B": {
                "B5. Suffix": "C",
                "B6 Firm index date": "06/01/2019",
                "B8. Flood Zone(s)": "AE",
            },
            "Section C": {
                "Top of Bottom Floor": "10.5 feet",
                "Top of Next Higher Floor": "18.0",
                "Lowest Adjacent Grade (LAG) next to building": 9.5,
                "Highest Adjacent Grade": 10.0,
            },
            "Section D": {
                "Certifier's Name": "J. Smith, PE",
                "License Number": "12345",
                "Date": "06/15/2019",
            },
        })
    }

    fn application() -> Document {
        json!({
            "Property Address": "123 Main St Cedar Rapids IA 52401",
            "Top of Bottom Floor": 10.5,
            "Top of Next Higher Floor": 18.0,
            "Lowest Adjacent Grade (LAG)": 9.5,
            "Building Diagram Number": "8",
            "Enclosure/Crawlspace Size": 800,
            "Current Flood Zone": "AE",
            "Map Panel Suffix": "C",
            "FIRM Date": "06/01/2019",
            "Building in Course of Construction": "no",
        })
    }

    #[test]
    fn extraction_resolves_and_defaults() {
        let ctx = FieldContext::extract(&certificate(), &application());

        assert_eq!(ctx.top_of_bottom_floor_certificate, 10.5);
        assert_eq!(ctx.diagram_number_certificate.as_deref(), Some("8"));
        assert_eq!(ctx.diagram_number_application.as_deref(), Some("8"));
        assert_eq!(ctx.total_enclosure_square_footage(), 800.0);
        assert_eq!(ctx.flood_zone_certificate, "ae");
        assert_eq!(ctx.survey_date, "06/15/2019");
        // Absent fields fall back to defaults rather than erroring.
        assert_eq!(ctx.e4_platform, 0.0);
        assert_eq!(ctx.machinery_flag, None);
        assert_eq!(ctx.bfe_application, None);
        assert_eq!(ctx.floors_application, "0");
    }

    #[test]
    fn updates_are_visible_after_apply() {
        let mut ctx = FieldContext::extract(&certificate(), &application());
        ctx.apply(ContextUpdate::DiagramNumber("7".to_string()));
        assert_eq!(ctx.diagram_number_application.as_deref(), Some("7"));

        ctx.apply(ContextUpdate::FirmRevision {
            zone: "ve".to_string(),
            suffix: "d".to_string(),
            firm_date: "01012021".to_string(),
        });
        assert_eq!(ctx.flood_zone_certificate, "ve");
        assert_eq!(ctx.suffix_application, "d");
        assert_eq!(ctx.firm_date_certificate, "01012021");
    }
}
