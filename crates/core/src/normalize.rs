//! Title and artist-name comparison keys.
//!
//! Every match in the acquisition pipeline compares normalized strings for
//! equality. There is no fuzzy matching and no transliteration, so "Björk"
//! and "Bjork" produce different keys.

/// Lowercase the input and keep only ASCII letters and digits.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Whether two titles share the same comparison key.
pub fn same_title(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}
