//! Property-based tests for the diff engine

use super::{diff_text, DiffSpan, SpanKind};
use proptest::prelude::*;

/// Small alphabet so old and new share plenty of tokens
fn arb_overlapping_text() -> impl Strategy<Value = String> {
    "[ab c\n]{0,40}"
}

fn arb_any_text() -> impl Strategy<Value = String> {
    "\\PC{0,30}"
}

fn reconstruct(spans: &[DiffSpan], side: SpanKind) -> String {
    spans
        .iter()
        .filter(|s| s.kind == SpanKind::Equal || s.kind == side)
        .map(|s| s.text.as_str())
        .collect()
}

fn check_round_trip(old: &str, new: &str) -> Result<(), TestCaseError> {
    let spans: Vec<DiffSpan> = diff_text(old, new).collect();
    prop_assert_eq!(reconstruct(&spans, SpanKind::Delete), old);
    prop_assert_eq!(reconstruct(&spans, SpanKind::Insert), new);

    // Canonical shape: no empty spans and no two neighbours of the same kind
    prop_assert!(spans.iter().all(|s| !s.text.is_empty()));
    prop_assert!(spans.windows(2).all(|w| w[0].kind != w[1].kind));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn prop_round_trip_overlapping(old in arb_overlapping_text(), new in arb_overlapping_text()) {
        check_round_trip(&old, &new)?;
    }

    #[test]
    fn prop_round_trip_arbitrary(old in arb_any_text(), new in arb_any_text()) {
        check_round_trip(&old, &new)?;
    }

    #[test]
    fn prop_identical_text_has_no_edits(text in arb_any_text()) {
        let spans: Vec<DiffSpan> = diff_text(&text, &text).collect();
        prop_assert!(spans.iter().all(|s| s.kind == SpanKind::Equal));
    }

    #[test]
    fn prop_disjoint_text(old in "[a-m]{1,20}", new in "[n-z]{1,20}") {
        let spans: Vec<DiffSpan> = diff_text(&old, &new).collect();
        prop_assert_eq!(
            spans,
            vec![
                DiffSpan::new(SpanKind::Delete, old.clone()),
                DiffSpan::new(SpanKind::Insert, new.clone()),
            ]
        );
    }
}
