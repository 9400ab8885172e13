//! Placeholder extraction
//!
//! Finds `:name` placeholders in SQL text, skipping the regions where a colon
//! does not introduce a parameter.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// `::` is listed first so a scope qualifier is consumed before `:name` can match
// its second colon.
static COLON_NAMED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"::|:([a-zA-Z_][a-zA-Z0-9_]*)").expect("valid regex"));

// T-SQL string literals (with '' escapes), quoted and bracketed identifiers,
// and comments
static SKIP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|\[[^\]]*\]|--[^\n]*|/\*[\s\S]*?\*/"#)
        .expect("valid regex")
});

/// A placeholder occurrence: byte range of `:name` and the bare name
pub(crate) struct Placeholder {
    pub start: usize,
    pub end: usize,
    pub name: String,
}

/// Extracts the unique placeholder names in order of first occurrence.
///
/// ```
/// use batchrun_params::extract_placeholders;
///
/// let names = extract_placeholders("SELECT * FROM Plans WHERE Id = :id OR ParentId = :id");
/// assert_eq!(names, vec!["id".to_string()]);
/// ```
pub fn extract_placeholders(sql: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    find_placeholders(sql)
        .into_iter()
        .filter_map(|p| seen.insert(p.name.clone()).then_some(p.name))
        .collect()
}

/// Finds every `:name` occurrence outside literals, identifiers and comments.
pub(crate) fn find_placeholders(sql: &str) -> Vec<Placeholder> {
    let masked = mask_skipped_regions(sql);

    COLON_NAMED_REGEX
        .captures_iter(&masked)
        .filter_map(|cap| {
            let full = cap.get(0)?;
            let name = cap.get(1)?;
            Some(Placeholder {
                start: full.start(),
                end: full.end(),
                name: name.as_str().to_string(),
            })
        })
        .collect()
}

/// Replaces skipped regions with spaces of the same byte length so offsets
/// found in the masked text are valid in the original.
fn mask_skipped_regions(sql: &str) -> String {
    SKIP_REGEX
        .replace_all(sql, |caps: &regex::Captures| " ".repeat(caps[0].len()))
        .into_owned()
}
