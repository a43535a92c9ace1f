//! Helpers for sanitizing data before it enters tracing span attributes
//! or becomes part of a URL path segment.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields — reveals file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Turns an arbitrary document title into a URL-safe slug.
///
/// Lowercases, maps runs of non-alphanumeric characters to single hyphens,
/// and trims leading/trailing hyphens. A title with no usable characters
/// yields `"document"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        "document".to_string()
    } else {
        slug
    }
}
