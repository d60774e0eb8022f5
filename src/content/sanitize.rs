//! HTML allow-list for model-written field values

use super::{FieldValue, Fields};
use ammonia::Builder;

/// Inline formatting the editor is allowed to keep
const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "br", "code", "del", "em", "i", "ins", "li", "ol", "p", "s", "span", "strong",
    "sub", "sup", "u", "ul",
];

const LINK_ATTRIBUTES: &[&str] = &["href", "title"];

const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Tags removed together with everything inside them
const STRIPPED_CONTENT_TAGS: &[&str] = &["script", "style"];

/// Filter one string through the allow-list
fn clean_html(input: &str) -> String {
    let mut builder = Builder::empty();
    builder
        .add_tags(ALLOWED_TAGS)
        .add_tag_attributes("a", LINK_ATTRIBUTES)
        .add_url_schemes(URL_SCHEMES)
        .add_clean_content_tags(STRIPPED_CONTENT_TAGS)
        .link_rel(None);
    builder.clean(input).to_string()
}

/// Sanitize a value before it is merged into a snapshot.
///
/// Text goes through the HTML allow-list, collections recurse, and numbers
/// are coerced to plain text.
pub fn sanitize_value(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Text(s) => FieldValue::Text(clean_html(s)),
        FieldValue::Number(n) => FieldValue::Text(n.to_string()),
        FieldValue::Collection(children) => FieldValue::Collection(sanitize_fields(children)),
    }
}

fn sanitize_fields(fields: &Fields) -> Fields {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), sanitize_value(v)))
        .collect()
}
