//! Patch engine: merge an approved change-set into block snapshots
//!
//! Pure functions over snapshots. Only fields already present in the target
//! block are overwritten; unknown fields and unknown block indices are
//! skipped without error and only show up as a lower updated count. Values
//! are sanitized before they are merged.

#[cfg(test)]
mod proptests;

use crate::content::{sanitize_value, ChangeSet, FieldSnapshot, Fields};

/// Post-image of a patch
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub blocks: Vec<FieldSnapshot>,
    pub updated_count: usize,
}

/// Overwrite the fields of one block that `edits` names and the block already has
pub fn patch_block(snapshot: &FieldSnapshot, edits: &Fields) -> (FieldSnapshot, usize) {
    let mut patched = snapshot.clone();
    let mut updated = 0;

    for (name, value) in edits {
        let Some(slot) = patched.fields.get_mut(name) else {
            tracing::debug!(
                block_index = snapshot.block_index,
                field = %name,
                "Skipping field absent from block"
            );
            continue;
        };
        *slot = sanitize_value(value);
        updated += 1;
    }

    (patched, updated)
}

/// Apply a change-set to a set of block snapshots.
///
/// Page entries are processed in order; an entry naming the same block twice
/// sees the result of the earlier one.
pub fn apply_change_set(snapshots: &[FieldSnapshot], changes: &ChangeSet) -> PatchOutcome {
    let mut blocks = snapshots.to_vec();
    let mut updated_count = 0;

    let mut apply = |index: usize, edits: &Fields| {
        let Some(position) = blocks.iter().position(|b| b.block_index == index) else {
            tracing::debug!(block_index = index, "Skipping unknown block");
            return;
        };
        let (patched, updated) = patch_block(&blocks[position], edits);
        blocks[position] = patched;
        updated_count += updated;
    };

    match changes {
        ChangeSet::Single {
            block_index,
            fields,
        } => apply(*block_index, fields),
        ChangeSet::Page { blocks: entries } => {
            for entry in entries {
                apply(entry.index, &entry.fields);
            }
        }
    }

    PatchOutcome {
        blocks,
        updated_count,
    }
}
