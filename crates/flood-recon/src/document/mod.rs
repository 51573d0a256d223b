//! Schema-agnostic lookup over the two input documents.
//!
//! Neither the certificate nor the application has a stable schema: field
//! labels drift across decades of form revisions and across extraction runs.
//! The locator therefore matches keys by their normalized projection and
//! walks the document itself, never a schema. All lookups are pure and treat
//! absence as a miss, not an error.

use crate::normalize::{collapse_key, is_present, normalize};
use serde_json::Value;
use std::collections::VecDeque;

/// A JSON-compatible nested structure produced by the extraction pipeline.
pub type Document = Value;

/// Depth bound for [`find_near`] on malformed, deeply self-nested documents.
pub const DEFAULT_NEAR_DEPTH: usize = 8;

/// First value whose key normalizes to `key`, in breadth-first document
/// order: a mapping's own entries are examined before any nested values.
pub fn find<'a>(doc: &'a Document, key: &str) -> Option<&'a Value> {
    let wanted = normalize(key);
    let mut queue: VecDeque<&Value> = VecDeque::from([doc]);

    while let Some(current) = queue.pop_front() {
        match current {
            Value::Object(map) => {
                for (k, v) in map {
                    if normalize(k) == wanted {
                        return Some(v);
                    }
                    queue.push_back(v);
                }
            }
            Value::Array(items) => queue.extend(items),
            _ => {}
        }
    }

    None
}

/// First key in `keys` that resolves to a present value. Used where form
/// revisions renamed a field and any alias is acceptable.
pub fn find_any<'a>(doc: &'a Document, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| find(doc, key))
        .find(|value| is_present(value))
}

/// The occurrence at `index` (zero-based) of `key` in breadth-first document
/// order. Certificates repeat labels like "Top of Bottom Floor" once per
/// measurement section; index 1 selects the second section's value. When the
/// document holds fewer occurrences the last one found is returned, so a
/// single-section form still resolves.
pub fn find_nth<'a>(doc: &'a Document, key: &str, index: usize) -> Option<&'a Value> {
    let wanted = normalize(key);
    let mut queue: VecDeque<&Value> = VecDeque::from([doc]);
    let mut matches = Vec::new();

    while let Some(current) = queue.pop_front() {
        match current {
            Value::Object(map) => {
                for (k, v) in map {
                    if normalize(k) == wanted {
                        matches.push(v);
                    }
                    queue.push_back(v);
                }
            }
            Value::Array(items) => queue.extend(items),
            _ => {}
        }
    }

    matches.get(index).copied().or_else(|| matches.last().copied())
}

/// Occurrence-indexed variant of [`find_any`].
pub fn find_any_nth<'a>(doc: &'a Document, keys: &[&str], index: usize) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| find_nth(doc, key, index))
        .find(|value| is_present(value))
}

/// Value for `key` defined in the same mapping as `anchor` (both matched by
/// normalized-substring containment), e.g. the "Date" box co-located with
/// "Certifier's Name". Falls back to recursive descent bounded by
/// `max_depth`; only present values count as hits.
pub fn find_near<'a>(
    doc: &'a Document,
    anchor: &str,
    key: &str,
    max_depth: usize,
) -> Option<&'a Value> {
    fn search<'a>(
        value: &'a Value,
        anchor: &str,
        key: &str,
        depth: usize,
        max_depth: usize,
    ) -> Option<&'a Value> {
        if depth > max_depth {
            return None;
        }
        match value {
            Value::Object(map) => {
                if map.keys().any(|k| normalize(k).contains(anchor)) {
                    for (k, v) in map {
                        if normalize(k).contains(key) && is_present(v) {
                            return Some(v);
                        }
                    }
                }
                map.values()
                    .find_map(|v| search(v, anchor, key, depth + 1, max_depth))
            }
            Value::Array(items) => items
                .iter()
                .find_map(|v| search(v, anchor, key, depth + 1, max_depth)),
            _ => None,
        }
    }

    search(doc, &normalize(anchor), &normalize(key), 1, max_depth)
}

/// Depth-first lookup by key variants, for the diagram-number field whose
/// label changed with nearly every form revision. Variant equality uses the
/// whitespace-collapsed lowercase form so punctuation in labels survives.
pub fn find_by_variants<'a>(doc: &'a Document, variants: &[&str]) -> Option<&'a Value> {
    let wanted: Vec<String> = variants.iter().map(|v| collapse_key(v)).collect();

    fn search<'a>(value: &'a Value, wanted: &[String]) -> Option<&'a Value> {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    if wanted.iter().any(|w| *w == collapse_key(k)) {
                        return Some(v);
                    }
                    if let Some(hit) = search(v, wanted) {
                        return Some(hit);
                    }
                }
                None
            }
            Value::Array(items) => items.iter().find_map(|v| search(v, wanted)),
            _ => None,
        }
    }

    search(doc, &wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn certificate() -> Document {
        json!({
            "Section A": {
                "A2. Building Street Address": "123 Main St",
                "City": "Cedar Rapids",
            },
            "Section C": {
                "Top of Bottom Floor": "10.5 ft",
                "Measurements": [
                    { "Top of Next Higher Floor": 14.0 }
                ],
            },
            "Section E": {
                "Top of Bottom Floor": "3.2 ft",
            },
        })
    }

    #[test]
    fn find_matches_by_normalized_key() {
        let doc = certificate();
        assert_eq!(
            find(&doc, "top of bottom floor"),
            Some(&json!("10.5 ft"))
        );
        assert_eq!(find(&doc, "TOP-OF-BOTTOM-FLOOR"), Some(&json!("10.5 ft")));
        assert_eq!(find(&doc, "absent key"), None);
    }

    #[test]
    fn find_is_invariant_under_key_reordering() {
        let reordered = json!({
            "Section E": { "Top of Bottom Floor": "3.2 ft" },
            "Section C": { "Top of Bottom Floor": "10.5 ft" },
        });
        // Breadth-first order follows the document, so the first section
        // listed wins; both orderings resolve the key deterministically.
        assert_eq!(find(&reordered, "Top of Bottom Floor"), Some(&json!("3.2 ft")));
        let doc = certificate();
        assert_eq!(find(&doc, "Top of Bottom Floor"), Some(&json!("10.5 ft")));
    }

    #[test]
    fn find_nth_selects_second_sibling_occurrence() {
        let doc = certificate();
        assert_eq!(find_nth(&doc, "Top of Bottom Floor", 1), Some(&json!("3.2 ft")));
    }

    #[test]
    fn find_nth_falls_back_to_last_available() {
        let doc = json!({ "Section C": { "Top of Bottom Floor": 10.0 } });
        assert_eq!(find_nth(&doc, "Top of Bottom Floor", 1), Some(&json!(10.0)));
        assert_eq!(find_nth(&doc, "missing", 1), None);
    }

    #[test]
    fn find_near_resolves_colocated_field() {
        let doc = json!({
            "Section D": {
                "Certifier's Name": "J. Smith, PE",
                "License Number": "12345",
                "Date": "06/01/2019",
            },
            "Other": { "Date": "01/01/1990" },
        });
        assert_eq!(
            find_near(&doc, "Certifier's Name", "Date", DEFAULT_NEAR_DEPTH),
            Some(&json!("06/01/2019"))
        );
    }

    #[test]
    fn find_near_respects_depth_bound() {
        let mut doc = json!({ "Certifier's Name": "x", "Date": "y" });
        for _ in 0..10 {
            doc = json!({ "wrapper": doc });
        }
        assert_eq!(find_near(&doc, "Certifier's Name", "Date", 4), None);
    }

    #[test]
    fn variants_match_with_punctuation_preserved() {
        let doc = json!({
            "Section A": {
                "A7. Building Diagram Number": "Number 8",
            }
        });
        let hit = find_by_variants(
            &doc,
            &["Building Diagram Number", "A7. Building Diagram Number"],
        );
        assert_eq!(hit, Some(&json!("Number 8")));
    }
}
