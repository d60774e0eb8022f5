//! Property-based tests for change-set extraction

use super::{extract, FALLBACK_ACKNOWLEDGEMENT};
use crate::content::{ChangeSet, FieldValue, Fields};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;

// ============================================================================
// Strategies
// ============================================================================

/// Prose that never contains a brace
fn arb_prose() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?'\n\u{e9}\u{2713}-]{0,80}"
}

fn arb_fields() -> impl Strategy<Value = BTreeMap<String, String>> {
    proptest::collection::btree_map("[a-z_]{1,12}", "[a-zA-Z0-9 .,!?<>/\"]{0,30}", 1..5)
}

fn encode_single(fields: &BTreeMap<String, String>) -> String {
    json!({ "fields": fields }).to_string()
}

fn expected_single(fields: &BTreeMap<String, String>) -> ChangeSet {
    ChangeSet::Single {
        block_index: 0,
        fields: fields
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::text(v.clone())))
            .collect::<Fields>(),
    }
}

// ============================================================================
// Invariant 1: brace-free text is returned untouched
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_no_brace_is_conversational(text in "[^{]{0,200}") {
        let result = extract(&text);
        prop_assert_eq!(result.conversational, text);
        prop_assert!(result.changes.is_none());
    }
}

// ============================================================================
// Invariant 2: prefix + JSON + suffix splits cleanly
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_embedded_json_is_recovered(
        prefix in arb_prose(),
        suffix in arb_prose(),
        fields in arb_fields(),
    ) {
        let text = format!("{prefix}{}{suffix}", encode_single(&fields));
        let result = extract(&text);

        let joined = format!("{} {}", prefix.trim(), suffix.trim());
        let expected = match joined.trim() {
            "" => FALLBACK_ACKNOWLEDGEMENT.to_string(),
            s => s.to_string(),
        };
        prop_assert_eq!(result.conversational, expected);
        prop_assert_eq!(result.changes, Some(expected_single(&fields)));
    }
}

// ============================================================================
// Invariant 3: a truncated candidate is never partially consumed
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_truncated_json_is_ignored(
        prefix in arb_prose(),
        fields in arb_fields(),
        cut in 1usize..40,
    ) {
        let json = encode_single(&fields);
        // Keep at least the opening brace, always drop the closing one
        let keep = json.len().saturating_sub(cut).max(1);
        let truncated: String = json.chars().take(keep).collect();
        let text = format!("{prefix}{truncated}");

        let result = extract(&text);
        prop_assert_eq!(result.conversational, text);
        prop_assert!(result.changes.is_none());
    }
}
