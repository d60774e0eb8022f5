//! Property-based tests for the patch engine

use super::apply_change_set;
use crate::content::{BlockChange, ChangeSet, FieldSnapshot, FieldValue, Fields};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_value() -> impl Strategy<Value = FieldValue> {
    let leaf = prop_oneof![
        4 => "[a-zA-Z0-9 .,<>/]{0,30}".prop_map(FieldValue::Text),
        1 => (0u64..1000).prop_map(|n| FieldValue::Number(n.into())),
    ];
    leaf.prop_recursive(2, 8, 3, |inner| {
        proptest::collection::btree_map("[0-2]", inner, 0..3).prop_map(FieldValue::Collection)
    })
}

/// Field names overlap between snapshots and edits, but edits may also
/// name fields no block has.
fn arb_fields(names: &'static str) -> impl Strategy<Value = Fields> {
    proptest::collection::btree_map(names, arb_value(), 0..5)
}

fn arb_snapshots() -> impl Strategy<Value = Vec<FieldSnapshot>> {
    proptest::collection::vec(arb_fields("[a-e]"), 1..4).prop_map(|blocks| {
        blocks
            .into_iter()
            .enumerate()
            .map(|(block_index, fields)| FieldSnapshot {
                block_index,
                layout: "section".to_string(),
                fields,
            })
            .collect()
    })
}

fn arb_change_set() -> impl Strategy<Value = ChangeSet> {
    prop_oneof![
        (0usize..5, arb_fields("[a-g]")).prop_map(|(block_index, fields)| ChangeSet::Single {
            block_index,
            fields,
        }),
        proptest::collection::vec((0usize..5, arb_fields("[a-g]")), 0..4).prop_map(|entries| {
            ChangeSet::Page {
                blocks: entries
                    .into_iter()
                    .map(|(index, fields)| BlockChange { index, fields })
                    .collect(),
            }
        }),
    ]
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_apply_is_idempotent(snapshots in arb_snapshots(), changes in arb_change_set()) {
        let once = apply_change_set(&snapshots, &changes);
        let twice = apply_change_set(&once.blocks, &changes);
        prop_assert_eq!(&twice.blocks, &once.blocks);
        prop_assert_eq!(twice.updated_count, once.updated_count);
    }

    #[test]
    fn prop_never_introduces_fields(snapshots in arb_snapshots(), changes in arb_change_set()) {
        let outcome = apply_change_set(&snapshots, &changes);
        prop_assert_eq!(outcome.blocks.len(), snapshots.len());
        for (before, after) in snapshots.iter().zip(&outcome.blocks) {
            prop_assert_eq!(before.block_index, after.block_index);
            prop_assert_eq!(&before.layout, &after.layout);
            prop_assert!(after.fields.keys().eq(before.fields.keys()));
        }
    }

    #[test]
    fn prop_count_matches_known_fields(snapshots in arb_snapshots(), changes in arb_change_set()) {
        let outcome = apply_change_set(&snapshots, &changes);
        let has = |index: usize, name: &str| {
            snapshots
                .iter()
                .any(|s| s.block_index == index && s.fields.contains_key(name))
        };
        let expected: usize = match &changes {
            ChangeSet::Single { block_index, fields } => {
                fields.keys().filter(|k| has(*block_index, k)).count()
            }
            ChangeSet::Page { blocks } => blocks
                .iter()
                .map(|b| b.fields.keys().filter(|k| has(b.index, k)).count())
                .sum(),
        };
        prop_assert_eq!(outcome.updated_count, expected);
    }
}
