//! Token-level diffs for reviewing proposed field edits
//!
//! Text is tokenized into words and whitespace runs and diffed with
//! `similar`. A semantic cleanup pass then folds short equalities that sit
//! between edits into the surrounding edit, so a reworded phrase shows up as
//! one deletion and one insertion rather than a checkerboard of fragments.
//!
//! Invariant: concatenating `Equal` + `Delete` spans reproduces the old text,
//! and `Equal` + `Insert` spans reproduces the new text.

mod review;

#[cfg(test)]
mod proptests;

pub use review::{review_change_set, Review};

use crate::content::FieldValue;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

/// Span classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Equal,
    Insert,
    Delete,
}

/// One run of equal, inserted or deleted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffSpan {
    pub kind: SpanKind,
    pub text: String,
}

impl DiffSpan {
    pub fn new(kind: SpanKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Single-pass sequence of spans, consumed once by a renderer
#[derive(Debug)]
pub struct DiffSpans {
    inner: std::vec::IntoIter<DiffSpan>,
}

impl Iterator for DiffSpans {
    type Item = DiffSpan;

    fn next(&mut self) -> Option<DiffSpan> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Diff two strings into readable spans
pub fn diff_text(old: &str, new: &str) -> DiffSpans {
    let diff = TextDiff::from_words(old, new);
    let raw = diff.iter_all_changes().map(|change| {
        let kind = match change.tag() {
            ChangeTag::Equal => SpanKind::Equal,
            ChangeTag::Delete => SpanKind::Delete,
            ChangeTag::Insert => SpanKind::Insert,
        };
        DiffSpan::new(kind, change.value())
    });

    let spans = cleanup_semantic(normalize(raw));
    DiffSpans {
        inner: spans.into_iter(),
    }
}

/// Rendering of one changed field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FieldDiff {
    /// Token diff of two text values
    Inline { spans: Vec<DiffSpan> },
    /// Plain before/after for numbers and nested structures
    SideBySide { before: String, after: String },
}

/// Compare a field's current value with its proposed value.
///
/// Returns `None` when nothing would change. A field missing from the
/// snapshot compares as empty text.
pub fn diff_field(old: Option<&FieldValue>, new: &FieldValue) -> Option<FieldDiff> {
    let empty = FieldValue::text("");
    let old = old.unwrap_or(&empty);
    if old == new {
        return None;
    }

    Some(match (old, new) {
        (FieldValue::Text(a), FieldValue::Text(b)) => FieldDiff::Inline {
            spans: diff_text(a, b).collect(),
        },
        _ => FieldDiff::SideBySide {
            before: old.to_plain_text(),
            after: new.to_plain_text(),
        },
    })
}

/// Render spans as escaped HTML with `<ins>`/`<del>` markers
pub fn render_inline_html(spans: impl IntoIterator<Item = DiffSpan>) -> String {
    let mut html = String::new();
    for span in spans {
        let escaped = escape_html(&span.text);
        match span.kind {
            SpanKind::Equal => html.push_str(&escaped),
            SpanKind::Insert => {
                html.push_str("<ins>");
                html.push_str(&escaped);
                html.push_str("</ins>");
            }
            SpanKind::Delete => {
                html.push_str("<del>");
                html.push_str(&escaped);
                html.push_str("</del>");
            }
        }
    }
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Canonical form: no empty spans, each edit run between equalities holds
/// at most one deletion followed by at most one insertion, and adjacent
/// equalities are merged.
fn normalize(spans: impl IntoIterator<Item = DiffSpan>) -> Vec<DiffSpan> {
    let mut out: Vec<DiffSpan> = Vec::new();
    let mut deleted = String::new();
    let mut inserted = String::new();

    let flush = |out: &mut Vec<DiffSpan>, deleted: &mut String, inserted: &mut String| {
        if !deleted.is_empty() {
            out.push(DiffSpan::new(SpanKind::Delete, std::mem::take(deleted)));
        }
        if !inserted.is_empty() {
            out.push(DiffSpan::new(SpanKind::Insert, std::mem::take(inserted)));
        }
    };

    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        match span.kind {
            SpanKind::Delete => deleted.push_str(&span.text),
            SpanKind::Insert => inserted.push_str(&span.text),
            SpanKind::Equal => {
                flush(&mut out, &mut deleted, &mut inserted);
                if let Some(last) = out.last_mut().filter(|l| l.kind == SpanKind::Equal) {
                    last.text.push_str(&span.text);
                } else {
                    out.push(span);
                }
            }
        }
    }
    flush(&mut out, &mut deleted, &mut inserted);
    out
}

/// Fold equalities that are no longer than the edits on both sides of them.
///
/// Each fold removes one equality, so the loop terminates.
fn cleanup_semantic(mut spans: Vec<DiffSpan>) -> Vec<DiffSpan> {
    while let Some(i) = find_foldable_equality(&spans) {
        let equal = spans.remove(i);
        spans.insert(i, DiffSpan::new(SpanKind::Insert, equal.text.clone()));
        spans.insert(i, DiffSpan::new(SpanKind::Delete, equal.text));
        spans = normalize(spans);
    }
    spans
}

fn find_foldable_equality(spans: &[DiffSpan]) -> Option<usize> {
    (1..spans.len().saturating_sub(1)).find(|&i| {
        if spans[i].kind != SpanKind::Equal {
            return false;
        }
        let len = spans[i].char_len();
        let before = edit_weight(spans[..i].iter().rev());
        let after = edit_weight(spans[i + 1..].iter());
        before > 0 && after > 0 && len <= before && len <= after
    })
}

/// Larger of the deleted and inserted lengths in the edit run next to an equality
fn edit_weight<'a>(run: impl Iterator<Item = &'a DiffSpan>) -> usize {
    let (mut deleted, mut inserted) = (0, 0);
    for span in run {
        match span.kind {
            SpanKind::Equal => break,
            SpanKind::Delete => deleted += span.char_len(),
            SpanKind::Insert => inserted += span.char_len(),
        }
    }
    deleted.max(inserted)
}
