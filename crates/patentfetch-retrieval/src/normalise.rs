//! Patent identifier normalisation.
//!
//! Spreadsheet exports write the same patent many ways: `US 1,234,567 A`,
//! `US-1234567-A`, `US1234567A`. The detail page URL and the output filename
//! both use the compact form, so every separator goes.
//!
//! ```
//! use patentfetch_retrieval::normalise::normalize;
//! assert_eq!(normalize("US 1,234,567-A"), "US1234567A");
//! ```

/// Characters dropped from inside an identifier, besides whitespace.
const SEPARATORS: [char; 3] = ['-', ',', '/'];

/// Canonicalise a raw identifier into a fetch-ready token.
///
/// Trims the ends, then removes all whitespace plus hyphens, commas and
/// slashes. Pure and idempotent. An empty result means the input carried no
/// identifier at all; callers treat that as invalid.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !SEPARATORS.contains(c))
        .collect()
}
