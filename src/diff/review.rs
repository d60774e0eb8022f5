//! Change review: per-field diffs and change counts for a change-set

use super::{diff_field, render_inline_html, FieldDiff};
use crate::content::{ChangeSet, FieldSnapshot, Fields};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReview {
    pub name: String,
    pub diff: FieldDiff,
    /// `<ins>`/`<del>` markup for inline diffs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl FieldReview {
    fn new(name: &str, diff: FieldDiff) -> Self {
        let html = match &diff {
            FieldDiff::Inline { spans } => Some(render_inline_html(spans.iter().cloned())),
            FieldDiff::SideBySide { .. } => None,
        };
        Self {
            name: name.to_string(),
            diff,
            html,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockReview {
    pub index: usize,
    pub layout: String,
    pub fields: Vec<FieldReview>,
    pub change_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub blocks: Vec<BlockReview>,
    pub change_count: usize,
}

fn review_block(index: usize, snapshot: Option<&FieldSnapshot>, proposed: &Fields) -> BlockReview {
    let fields: Vec<FieldReview> = proposed
        .iter()
        .filter_map(|(name, new)| {
            let old = snapshot.and_then(|s| s.fields.get(name));
            diff_field(old, new).map(|diff| FieldReview::new(name, diff))
        })
        .collect();

    BlockReview {
        index,
        layout: snapshot.map_or_else(|| "unknown".to_string(), |s| s.layout.clone()),
        change_count: fields.len(),
        fields,
    }
}

/// Build the review shown before the user approves a change-set.
///
/// Unchanged fields are left out of both the listing and the counts. Page
/// entries whose block index is not in `snapshots` are skipped.
pub fn review_change_set(snapshots: &[FieldSnapshot], changes: &ChangeSet) -> Review {
    let find = |index: usize| snapshots.iter().find(|s| s.block_index == index);

    let blocks: Vec<BlockReview> = match changes {
        ChangeSet::Single {
            block_index,
            fields,
        } => vec![review_block(*block_index, find(*block_index), fields)],
        ChangeSet::Page { blocks } => blocks
            .iter()
            .filter_map(|change| {
                find(change.index).map(|snapshot| review_block(change.index, Some(snapshot), &change.fields))
            })
            .collect(),
    };

    Review {
        change_count: blocks.iter().map(|b| b.change_count).sum(),
        blocks,
    }
}
