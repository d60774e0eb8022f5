//! Change-set extraction from accumulated assistant text
//!
//! The model is asked to write a short conversational message followed by a
//! JSON object describing its edits. Nothing marks where the JSON starts, so
//! the first `{` is taken as the candidate start and braces are counted
//! until the depth returns to zero. Only that first balanced region is
//! considered; a later JSON-looking block stays in the conversational text.

#[cfg(test)]
mod proptests;

use crate::content::ChangeSet;

/// Shown in place of the conversational text when the reply was only JSON
pub const FALLBACK_ACKNOWLEDGEMENT: &str = "✓ Changes ready for review.";

/// Result of splitting one assistant turn
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub conversational: String,
    pub changes: Option<ChangeSet>,
}

impl Extraction {
    fn conversational_only(text: &str) -> Self {
        Self {
            conversational: text.to_string(),
            changes: None,
        }
    }
}

/// Split assistant text into its conversational part and an optional change-set.
///
/// Truncated, unparseable or unrecognized candidates are treated as "no
/// change-set" and the text is returned unmodified.
pub fn extract(text: &str) -> Extraction {
    let Some((start, end)) = first_balanced_region(text) else {
        return Extraction::conversational_only(text);
    };

    let candidate = &text[start..end];
    let Ok(value) = serde_json::from_str::<serde_json::Value>(candidate) else {
        tracing::debug!(len = candidate.len(), "Brace region is not valid JSON");
        return Extraction::conversational_only(text);
    };

    let Some(changes) = ChangeSet::from_value(&value) else {
        tracing::debug!("JSON region carries no fields/modules key");
        return Extraction::conversational_only(text);
    };

    let before = text[..start].trim();
    let after = text[end..].trim();
    let joined = format!("{before} {after}");
    let conversational = match joined.trim() {
        "" => FALLBACK_ACKNOWLEDGEMENT.to_string(),
        s => s.to_string(),
    };

    Extraction {
        conversational,
        changes: Some(changes),
    }
}

/// Byte range `[start, end)` of the first balanced brace region.
///
/// Braces are counted literally, including any inside JSON string values.
/// Returns `None` if there is no `{` or the depth never returns to zero.
fn first_balanced_region(text: &str) -> Option<(usize, usize)> {
    let start = text.find('{')?;
    let mut depth: usize = 0;

    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + offset + 1));
                }
            }
            _ => {}
        }
    }
    None
}
