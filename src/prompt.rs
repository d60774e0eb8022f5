//! System prompt construction for editing turns
//!
//! The prompt pins the output language when one is known, shows the model the
//! current text fields of the block or page being edited, and tells it the
//! exact JSON shape to append when it proposes edits.

use crate::content::{FieldSnapshot, Fields};
use serde::Deserialize;
use std::fmt::Write;

const PREAMBLE: &str = "You are an expert content editor for a website. \
You help users edit content in structured content blocks.\n\n";

const SINGLE_FORMAT: &str = r#"   {"fields": {"field_name": "new value", "another_field": "another value"}}
   Example:
   I've made the text more engaging and added a call-to-action.
   {"fields": {"heading": "New heading", "text": "New text"}}

"#;

const PAGE_FORMAT: &str = r#"   {"modules": [
     {"index": 0, "fields": {"field_name": "new value"}},
     {"index": 2, "fields": {"other_field": "another value"}}
   ]}
   Only include modules you want to change (use the Module # from context).
   Example:
   I've improved the headings across multiple sections.
   {"modules": [{"index": 0, "fields": {"heading": "New heading"}}, {"index": 2, "fields": {"heading": "Another heading"}}]}

"#;

/// Target language of the page being edited
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

/// What the turn is editing
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// One block; the snapshot is absent when the store has no such block
    Block {
        index: usize,
        layout: &'a str,
        snapshot: Option<&'a FieldSnapshot>,
    },
    /// Every block of the page
    Page(&'a [FieldSnapshot]),
    /// No content could be loaded
    Detached,
}

#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub language: Option<&'a Language>,
    pub scope: Scope<'a>,
}

fn pretty(fields: &Fields) -> String {
    serde_json::to_string_pretty(fields).unwrap_or_default()
}

pub fn build_system_prompt(context: &PromptContext<'_>) -> String {
    let mut prompt = String::from(PREAMBLE);
    let language = context
        .language
        .filter(|l| !l.code.trim().is_empty() && !l.name.trim().is_empty());

    if let Some(language) = language {
        let _ = writeln!(prompt, "LANGUAGE REQUIREMENT:");
        let _ = writeln!(
            prompt,
            "This page is in {} ({}).",
            language.name,
            language.code.to_uppercase()
        );
        let _ = writeln!(
            prompt,
            "You MUST respond and edit content ONLY in {}.",
            language.name
        );
        prompt.push_str("Do NOT translate or switch to any other language.\n");
        prompt.push_str("Maintain the exact same language as the current content.\n\n");
    }

    let page_mode = match context.scope {
        Scope::Block {
            index,
            layout,
            snapshot,
        } => {
            prompt.push_str("CURRENT CONTEXT:\n");
            let _ = writeln!(prompt, "Layout: {layout}");
            let _ = writeln!(prompt, "Block index: {index}");
            if let Some(snapshot) = snapshot {
                let _ = write!(prompt, "Current fields:\n{}\n\n", pretty(&snapshot.text_only().fields));
            }
            false
        }
        Scope::Page(blocks) if !blocks.is_empty() => {
            prompt.push_str("CURRENT CONTEXT:\n");
            let _ = write!(
                prompt,
                "FULL PAGE MODE - Editing entire page with {} modules\n\n",
                blocks.len()
            );
            for block in blocks {
                let fields = block.text_only().fields;
                if !fields.is_empty() {
                    let _ = writeln!(prompt, "Module #{} ({}):", block.block_index, block.layout);
                    let _ = write!(prompt, "{}\n\n", pretty(&fields));
                }
            }
            true
        }
        Scope::Page(_) | Scope::Detached => false,
    };

    prompt.push_str("INSTRUCTIONS:\n");
    prompt.push_str("1. When editing content, use this EXACT format:\n");
    prompt.push_str("   First, write a brief conversational message describing what you changed.\n");
    prompt.push_str("   Then, on a new line, provide the JSON changes:\n");
    prompt.push_str(if page_mode { PAGE_FORMAT } else { SINGLE_FORMAT });

    prompt.push_str("2. Only modify text fields. Preserve HTML tags if present.\n");
    prompt.push_str("3. For questions or confirmations (no edits), respond naturally without JSON.\n");
    prompt.push_str("4. Be helpful, concise, and professional.\n");

    if let Some(language) = language {
        let _ = writeln!(
            prompt,
            "5. CRITICAL: Keep all content in {} language!",
            language.name
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FieldValue;

    fn snapshot(index: usize, layout: &str, pairs: &[(&str, &str)]) -> FieldSnapshot {
        FieldSnapshot {
            block_index: index,
            layout: layout.to_string(),
            fields: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), FieldValue::text(*v)))
                .collect(),
        }
    }

    #[test]
    fn test_single_block_prompt() {
        let block = snapshot(2, "hero", &[("heading", "Welcome"), ("image", "")]);
        let prompt = build_system_prompt(&PromptContext {
            language: None,
            scope: Scope::Block {
                index: 2,
                layout: "hero",
                snapshot: Some(&block),
            },
        });

        assert!(prompt.contains("Layout: hero\nBlock index: 2\n"));
        assert!(prompt.contains("\"heading\": \"Welcome\""));
        assert!(!prompt.contains("\"image\""), "empty fields are not shown");
        assert!(prompt.contains(r#"{"fields": {"heading": "New heading", "text": "New text"}}"#));
        assert!(!prompt.contains("LANGUAGE"));
        assert!(!prompt.contains("5. CRITICAL"));
    }

    #[test]
    fn test_page_prompt_lists_non_empty_modules() {
        let blocks = [
            snapshot(0, "hero", &[("heading", "Welcome")]),
            snapshot(1, "spacer", &[("height", "")]),
            snapshot(2, "text", &[("body", "<p>Hi</p>")]),
        ];
        let prompt = build_system_prompt(&PromptContext {
            language: None,
            scope: Scope::Page(&blocks),
        });

        assert!(prompt.contains("FULL PAGE MODE - Editing entire page with 3 modules"));
        assert!(prompt.contains("Module #0 (hero):"));
        assert!(!prompt.contains("Module #1"));
        assert!(prompt.contains("Module #2 (text):"));
        assert!(prompt.contains(r#"{"modules": ["#));
    }

    #[test]
    fn test_language_pin() {
        let language = Language {
            code: "de".to_string(),
            name: "German".to_string(),
        };
        let prompt = build_system_prompt(&PromptContext {
            language: Some(&language),
            scope: Scope::Detached,
        });

        assert!(prompt.contains("This page is in German (DE)."));
        assert!(prompt.ends_with("5. CRITICAL: Keep all content in German language!\n"));
        assert!(!prompt.contains("CURRENT CONTEXT"));
        assert!(prompt.contains(r#"{"fields": {"field_name""#));
    }

    #[test]
    fn test_language_requires_code_and_name() {
        let language = Language {
            code: "fr".to_string(),
            name: String::new(),
        };
        let prompt = build_system_prompt(&PromptContext {
            language: Some(&language),
            scope: Scope::Page(&[]),
        });
        assert!(!prompt.contains("LANGUAGE REQUIREMENT"));
        assert!(!prompt.contains("FULL PAGE MODE"));
    }
}
