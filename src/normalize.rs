//! Accent-insensitive text normalization and slugification.
//!
//! Matching is performed after full Unicode canonical decomposition (NFD)
//! with combining marks discarded, so "Café" and "cafe" compare equal.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strip diacritics and lowercase.
pub fn normalize(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Convert free text into a URL-safe slug: accent-stripped, lowercased,
/// non-alphanumeric runs collapsed to a single hyphen, trimmed.
pub fn slugify(s: &str) -> String {
    let lowered = normalize(s);
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
