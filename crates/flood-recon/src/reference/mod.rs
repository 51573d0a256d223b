//! Versioned reference data consumed by the extraction layer and rules.
//!
//! FEMA revises its forms and zone catalogue far more often than the
//! comparison logic changes, so everything enumerable lives here as data:
//! abbreviation tables, the flood-zone priority order, SFHA membership, the
//! diagram groupings behind the elevation decision tables, the diagram to
//! foundation-type mapping, and the form validity windows. Compiled-in
//! defaults can be overridden from two-column CSV exports.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

/// Rank assigned to flood-zone codes outside the priority table. Every known
/// code ranks ahead of it.
pub const UNRANKED: usize = usize::MAX;

/// Diagram-number groupings referenced by the Section C/E/H decision tables.
/// Group membership decides which tolerance applies to a building's bottom
/// floor relative to its adjacent grade.
#[derive(Debug, Clone)]
pub struct DiagramGroups {
    /// Slab-style foundations: bottom floor within 2 ft of the LAG.
    pub slab: Vec<String>,
    /// Stem-wall foundation: bottom floor within 6 ft of the LAG.
    pub stem_wall: String,
    /// Subgrade foundations (basements): bottom floor below the LAG.
    pub subgrade: Vec<String>,
    /// Elevated without enclosure: bottom floor within 20 ft of the LAG.
    pub elevated_open: String,
    /// Diagrams whose next-higher-floor elevation must exceed the bottom floor.
    pub with_enclosure: Vec<String>,
    /// Diagrams that imply a crawlspace or enclosure (square footage and
    /// flood-vent reconciliation applies).
    pub crawlspace: Vec<String>,
    /// Diagrams where machinery must clear the next higher floor or sit on an
    /// 8 ft platform.
    pub machinery_slab: Vec<String>,
}

impl DiagramGroups {
    pub fn contains(group: &[String], diagram: &str) -> bool {
        let wanted = diagram.trim().to_lowercase();
        group.iter().any(|d| *d == wanted)
    }
}

/// One EC form cycle: the window the printed expiration date must fall in,
/// paired with the window the survey date must fall in. An open survey end
/// marks the cycle still in force.
#[derive(Debug, Clone, Copy)]
pub struct ValidityWindow {
    pub expiration_start: NaiveDate,
    pub expiration_end: NaiveDate,
    pub survey_start: NaiveDate,
    pub survey_end: Option<NaiveDate>,
}

/// The full static-reference bundle threaded through extraction and rules.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub street_suffixes: BTreeMap<String, String>,
    pub state_abbreviations: BTreeMap<String, String>,
    pub zone_priority: Vec<String>,
    pub sfha_zones: BTreeSet<String>,
    pub diagram_groups: DiagramGroups,
    pub foundation_by_diagram: Vec<(Vec<String>, String)>,
    pub validity_windows: Vec<ValidityWindow>,
}

impl ReferenceTables {
    /// Position of a flood-zone code in the priority order; [`UNRANKED`] when
    /// the code is not catalogued. Lower rank wins.
    pub fn zone_rank(&self, code: &str) -> usize {
        let wanted = code.trim().to_uppercase();
        self.zone_priority
            .iter()
            .position(|z| *z == wanted)
            .unwrap_or(UNRANKED)
    }

    /// Whether a zone code lies inside the Special Flood Hazard Area.
    pub fn is_sfha(&self, code: &str) -> bool {
        self.sfha_zones.contains(&code.trim().to_uppercase())
    }

    /// Foundation-type label implied by an application diagram number.
    pub fn foundation_for_diagram(&self, diagram: &str) -> Option<&str> {
        let wanted = diagram.trim().to_lowercase();
        self.foundation_by_diagram
            .iter()
            .find(|(diagrams, _)| diagrams.iter().any(|d| *d == wanted))
            .map(|(_, label)| label.as_str())
    }

    /// Replace an abbreviation table from a two-column CSV export
    /// (`full,abbreviation`, with a header row).
    pub fn load_abbreviations<R: Read>(reader: R) -> Result<BTreeMap<String, String>, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut table = BTreeMap::new();
        for record in csv_reader.records() {
            let row = record?;
            if let (Some(full), Some(short)) = (row.get(0), row.get(1)) {
                table.insert(full.to_string(), short.to_string());
            }
        }
        Ok(table)
    }

    /// Replace the flood-zone priority order from a single-column CSV export
    /// (highest priority first, with a header row).
    pub fn load_zone_priority<R: Read>(reader: R) -> Result<Vec<String>, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut zones = Vec::new();
        for record in csv_reader.records() {
            let row = record?;
            if let Some(zone) = row.get(0) {
                if !zone.is_empty() {
                    zones.push(zone.to_uppercase());
                }
            }
        }
        Ok(zones)
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self {
            street_suffixes: pairs(&[
                ("Street", "St."),
                ("Avenue", "Ave."),
                ("Boulevard", "Blvd."),
                ("Drive", "Dr."),
                ("Court", "Ct."),
                ("Road", "Rd."),
                ("Lane", "Ln."),
                ("Terrace", "Ter."),
                ("Place", "Pl."),
                ("Circle", "Cir."),
                ("Highway", "Hwy."),
                ("Parkway", "Pkwy."),
            ]),
            state_abbreviations: pairs(STATES),
            zone_priority: zone_priority(),
            sfha_zones: sfha_zones(),
            diagram_groups: DiagramGroups {
                slab: strings(&["1", "1a", "3", "6", "7", "8"]),
                stem_wall: "1b".to_string(),
                subgrade: strings(&["2", "2a", "2b", "4", "9"]),
                elevated_open: "5".to_string(),
                with_enclosure: strings(&["2", "2a", "2b", "4", "6", "7", "8", "9"]),
                crawlspace: strings(&["6", "7", "8", "9"]),
                machinery_slab: strings(&["1", "1a", "1b", "3"]),
            },
            foundation_by_diagram: vec![
                (strings(&["1", "1a", "1b", "3"]), "Slab on Grade".to_string()),
                (strings(&["2", "2a", "4"]), "Basement".to_string()),
                (
                    strings(&["2b"]),
                    "Basement with Exterior Egress".to_string(),
                ),
                (
                    strings(&["5"]),
                    "Elevated Without Enclosure on Posts".to_string(),
                ),
                (
                    strings(&["6"]),
                    "Elevated With Enclosure on Posts".to_string(),
                ),
                (
                    strings(&["7"]),
                    "Elevated With Enclosure Not On Posts".to_string(),
                ),
                (strings(&["8", "9"]), "Crawlspace".to_string()),
            ],
            validity_windows: validity_windows(),
        }
    }
}

/// Full state name to USPS abbreviation pairs feeding `state_abbreviations`.
const STATES: &[(&str, &str)] = &[
    ("Alabama", "AL"),
    ("Alaska", "AK"),
    ("Arizona", "AZ"),
    ("Arkansas", "AR"),
    ("California", "CA"),
    ("Colorado", "CO"),
    ("Connecticut", "CT"),
    ("Delaware", "DE"),
    ("Florida", "FL"),
    ("Georgia", "GA"),
    ("Hawaii", "HI"),
    ("Idaho", "ID"),
    ("Illinois", "IL"),
    ("Indiana", "IN"),
    ("Iowa", "IA"),
    ("Kansas", "KS"),
    ("Kentucky", "KY"),
    ("Louisiana", "LA"),
    ("Maine", "ME"),
    ("Maryland", "MD"),
    ("Massachusetts", "MA"),
    ("Michigan", "MI"),
    ("Minnesota", "MN"),
    ("Mississippi", "MS"),
    ("Missouri", "MO"),
    ("Montana", "MT"),
    ("Nebraska", "NE"),
    ("Nevada", "NV"),
    ("New Hampshire", "NH"),
    ("New Jersey", "NJ"),
    ("New Mexico", "NM"),
    ("New York", "NY"),
    ("North Carolina", "NC"),
    ("North Dakota", "ND"),
    ("Ohio", "OH"),
    ("Oklahoma", "OK"),
    ("Oregon", "OR"),
    ("Pennsylvania", "PA"),
    ("Rhode Island", "RI"),
    ("South Carolina", "SC"),
    ("South Dakota", "SD"),
    ("Tennessee", "TN"),
    ("Texas", "TX"),
    ("Utah", "UT"),
    ("Vermont", "VT"),
    ("Virginia", "VA"),
    ("Washington", "WA"),
    ("West Virginia", "WV"),
    ("Wisconsin", "WI"),
    ("Wyoming", "WY"),
];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn pairs(values: &[(&str, &str)]) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(full, short)| (full.to_string(), short.to_string()))
        .collect()
}

fn zone_priority() -> Vec<String> {
    let mut zones = vec!["V".to_string()];
    zones.push("VE".to_string());
    zones.extend((1..=30).map(|n| format!("V{n}")));
    zones.extend(["A", "AO", "AH", "AR", "AE"].map(str::to_string));
    zones.extend((1..=30).map(|n| format!("A{n}")));
    zones.extend(["A99", "D", "B", "C", "X"].map(str::to_string));
    zones
}

fn sfha_zones() -> BTreeSet<String> {
    let mut zones: BTreeSet<String> = ["A", "AE", "AH", "AO", "A99", "V", "VE"]
        .into_iter()
        .map(str::to_string)
        .collect();
    zones.extend((1..=30).map(|n| format!("A{n}")));
    zones.extend((1..=30).map(|n| format!("V{n}")));
    zones
}

fn window(
    expiration: (i32, u32, u32, i32, u32, u32),
    survey: (i32, u32, u32),
    survey_end: Option<(i32, u32, u32)>,
) -> ValidityWindow {
    let (es_y, es_m, es_d, ee_y, ee_m, ee_d) = expiration;
    let (ss_y, ss_m, ss_d) = survey;
    ValidityWindow {
        expiration_start: date(es_y, es_m, es_d),
        expiration_end: date(ee_y, ee_m, ee_d),
        survey_start: date(ss_y, ss_m, ss_d),
        survey_end: survey_end.map(|(y, m, d)| date(y, m, d)),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("static reference date")
}

fn validity_windows() -> Vec<ValidityWindow> {
    vec![
        window((1984, 6, 1, 1984, 6, 30), (1000, 9, 30), Some((2000, 9, 30))),
        window((1987, 2, 1, 1987, 2, 28), (1000, 9, 30), Some((2000, 9, 30))),
        window((1990, 6, 1, 1990, 6, 30), (1000, 9, 30), Some((2000, 9, 30))),
        window((1993, 5, 1, 1993, 5, 31), (1000, 9, 30), Some((2000, 9, 30))),
        window((1996, 5, 1, 1996, 5, 31), (1000, 9, 30), Some((2000, 9, 30))),
        window((1999, 7, 1, 1999, 7, 31), (1000, 9, 30), Some((2000, 9, 30))),
        window((2000, 7, 1, 2000, 7, 31), (1999, 8, 1), Some((2006, 12, 31))),
        window((2005, 12, 1, 2005, 12, 31), (2003, 1, 1), Some((2009, 12, 31))),
        window((2009, 2, 1, 2009, 2, 28), (2006, 2, 1), Some((2010, 3, 31))),
        window((2012, 3, 31, 2012, 4, 1), (2009, 4, 1), Some((2013, 7, 31))),
        window((2015, 7, 31, 2015, 8, 1), (2012, 8, 1), Some((2016, 12, 31))),
        window((2018, 11, 30, 2018, 12, 1), (2017, 1, 1), Some((2020, 2, 21))),
        window((2022, 11, 30, 2022, 12, 1), (2020, 2, 1), Some((2023, 6, 29))),
        window((2026, 6, 30, 2026, 7, 1), (2023, 6, 1), None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn unknown_zone_ranks_below_every_known_code() {
        let tables = ReferenceTables::default();
        assert_eq!(tables.zone_rank("ZZ"), UNRANKED);
        for zone in &tables.zone_priority {
            assert!(tables.zone_rank(zone) < UNRANKED);
        }
    }

    #[test]
    fn velocity_zones_outrank_a_zones() {
        let tables = ReferenceTables::default();
        assert!(tables.zone_rank("VE") < tables.zone_rank("AE"));
        assert!(tables.zone_rank("AE") < tables.zone_rank("X"));
    }

    #[test]
    fn sfha_membership() {
        let tables = ReferenceTables::default();
        assert!(tables.is_sfha("ae"));
        assert!(tables.is_sfha("V12"));
        assert!(!tables.is_sfha("X"));
        assert!(!tables.is_sfha("D"));
    }

    #[test]
    fn foundation_mapping_covers_all_diagram_classes() {
        let tables = ReferenceTables::default();
        assert_eq!(tables.foundation_for_diagram("1A"), Some("Slab on Grade"));
        assert_eq!(tables.foundation_for_diagram("2"), Some("Basement"));
        assert_eq!(tables.foundation_for_diagram("9"), Some("Crawlspace"));
        assert_eq!(tables.foundation_for_diagram("0"), None);
    }

    #[test]
    fn abbreviations_load_from_csv() {
        let csv = "full,abbreviation\nStreet,St.\nAvenue,Ave.\n";
        let table = ReferenceTables::load_abbreviations(Cursor::new(csv)).expect("parses");
        assert_eq!(table.get("Street").map(String::as_str), Some("St."));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn zone_priority_loads_from_csv() {
        let csv = "zone\nV\nVE\nA\n";
        let zones = ReferenceTables::load_zone_priority(Cursor::new(csv)).expect("parses");
        assert_eq!(zones, vec!["V", "VE", "A"]);
    }
}
