//! Item-name canonicalization.
//!
//! Item names arrive from independently maintained sources with different
//! whitespace, casing and quoting. [`name_variants`] expands a raw name into a
//! small ordered set of lookup keys; the same expansion is applied to query
//! keys and to table keys, so two spellings of the same item share at least
//! one variant.

/// Collapse every whitespace run to a single space and trim both ends.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip leading and trailing double-quote characters.
pub fn strip_quotes(raw: &str) -> &str {
    raw.trim_matches('"')
}

/// Expand a raw item name into its lookup variants, most specific first.
///
/// Order: raw, whitespace-collapsed, collapsed upper-case, collapsed
/// lower-case, quotes stripped, trimmed then quotes stripped. Duplicates keep
/// their first position. The result is never empty: the raw string is always
/// the first element.
pub fn name_variants(raw: &str) -> Vec<String> {
    let normalized = collapse_whitespace(raw);
    let candidates = [
        raw.to_string(),
        normalized.clone(),
        normalized.to_uppercase(),
        normalized.to_lowercase(),
        strip_quotes(raw).to_string(),
        strip_quotes(raw.trim()).to_string(),
    ];

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}
