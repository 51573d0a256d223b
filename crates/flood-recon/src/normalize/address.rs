//! Address canonicalization and similarity scoring.
//!
//! The certificate spells a property address across five labelled boxes while
//! the application usually carries one free-text line, so comparison runs on
//! a canonical projection: spacing repaired, components tagged, suffixes and
//! state names abbreviated, separators stripped, then a normalized
//! edit-distance ratio over the residue.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static DIGIT_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)([A-Za-z])").expect("digit-letter pattern"));
static LETTER_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z])(\d)").expect("letter-digit pattern"));
static CITY_STATE_ZIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z]+)\s+([A-Z]{2})\s+(\d{5})$").expect("tail pattern"));

/// Match tier for a scored address pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressTier {
    Matched,
    HighSimilarity,
    NotMatched,
}

impl AddressTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Matched => "Matched",
            Self::HighSimilarity => "High similarity",
            Self::NotMatched => "Not matched",
        }
    }
}

/// Outcome of comparing two addresses: the similarity ratio (0-100) and the
/// tier it lands in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AddressComparison {
    pub score: f64,
    pub tier: AddressTier,
}

/// Compare two raw address strings. Ratio above 90 is a match, above 80
/// warrants review, anything lower is a mismatch.
pub fn compare(
    left: &str,
    right: &str,
    suffixes: &BTreeMap<String, String>,
    states: &BTreeMap<String, String>,
) -> AddressComparison {
    let a = canonical(left, suffixes, states);
    let b = canonical(right, suffixes, states);
    let score = ratio(&a, &b);

    let tier = if score > 90.0 {
        AddressTier::Matched
    } else if score > 80.0 {
        AddressTier::HighSimilarity
    } else {
        AddressTier::NotMatched
    };

    AddressComparison { score, tier }
}

/// Canonical separator-free projection of an address.
pub fn canonical(
    raw: &str,
    suffixes: &BTreeMap<String, String>,
    states: &BTreeMap<String, String>,
) -> String {
    let prepared = preprocess(raw);
    match tag_components(&prepared, suffixes, states) {
        Some(joined) => strip_separators(&joined),
        None => strip_separators(&prepared),
    }
}

/// Repair spacing lost to OCR: split digit/letter boundaries and turn
/// hyphens and commas into spaces.
fn preprocess(raw: &str) -> String {
    let spaced = DIGIT_LETTER.replace_all(raw, "$1 $2");
    let spaced = LETTER_DIGIT.replace_all(&spaced, "$1 $2");
    spaced.replace(['-', ','], " ").trim().to_string()
}

/// Tagging pass over a prepared address: leading house number, trailing
/// city/state/zip, street tokens in between. Returns `None` when the shape
/// is too unusual to tag, in which case the caller compares the raw residue.
fn tag_components(
    prepared: &str,
    suffixes: &BTreeMap<String, String>,
    states: &BTreeMap<String, String>,
) -> Option<String> {
    let captures = CITY_STATE_ZIP.captures(prepared)?;
    let tail_start = captures.get(0).expect("whole match").start();
    let (city, state, zip) = (
        captures.get(1).expect("city").as_str(),
        captures.get(2).expect("state").as_str(),
        captures.get(3).expect("zip").as_str(),
    );

    let head = prepared[..tail_start].trim();
    let mut tokens = head.split_whitespace().peekable();
    let number = match tokens.peek() {
        Some(token) if token.chars().all(|c| c.is_ascii_digit()) => {
            tokens.next().map(str::to_string)
        }
        _ => None,
    };

    let street = tokens
        .map(|word| suffixes.get(word).map(String::as_str).unwrap_or(word))
        .collect::<Vec<_>>()
        .join(" ");

    let state = states.get(state).map(String::as_str).unwrap_or(state);

    let mut parts = Vec::new();
    if let Some(number) = number {
        parts.push(number);
    }
    if !street.is_empty() {
        parts.push(street);
    }
    parts.push(city.to_string());
    parts.push(state.to_string());
    parts.push(zip.to_string());
    Some(parts.join(" "))
}

fn strip_separators(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '-')
        .collect::<String>()
        .to_lowercase()
}

/// Normalized Levenshtein ratio on a 0-100 scale.
fn ratio(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 100.0;
    }
    let distance = levenshtein(a, b);
    (1.0 - distance as f64 / longest as f64) * 100.0
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceTables;

    fn tables() -> ReferenceTables {
        ReferenceTables::default()
    }

    #[test]
    fn identical_addresses_always_match() {
        let tables = tables();
        for raw in [
            "123 Main Street Cedar Rapids IA 52401",
            "8-B Harbor Drive, Tampa FL 33602",
            "977 Seaway Ct",
        ] {
            let comparison = compare(
                raw,
                raw,
                &tables.street_suffixes,
                &tables.state_abbreviations,
            );
            assert_eq!(comparison.tier, AddressTier::Matched, "{raw}");
            assert_eq!(comparison.score, 100.0);
        }
    }

    #[test]
    fn suffix_and_state_abbreviations_align_sources() {
        let tables = tables();
        let comparison = compare(
            "123 Main Street Cedar Rapids IA 52401",
            "123 Main St. Cedar Rapids Iowa 52401",
            &tables.street_suffixes,
            &tables.state_abbreviations,
        );
        assert_eq!(comparison.tier, AddressTier::Matched);
    }

    #[test]
    fn unrelated_addresses_do_not_match() {
        let tables = tables();
        let comparison = compare(
            "123 Main Street Cedar Rapids IA 52401",
            "977 Seaway Court Galveston TX 77550",
            &tables.street_suffixes,
            &tables.state_abbreviations,
        );
        assert_eq!(comparison.tier, AddressTier::NotMatched);
    }

    #[test]
    fn preprocess_splits_ocr_runs() {
        assert_eq!(preprocess("123Main"), "123 Main");
        assert_eq!(preprocess("Main123"), "Main 123");
        assert_eq!(preprocess("12-B,Main"), "12 B Main");
    }
}
