//! Shared utility functions used across multiple modules.

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages and logs.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Normalize a list of category names: trim each, drop empties, and
/// de-duplicate while preserving first-seen order.
pub fn normalize_category_names(names: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if !seen.iter().any(|existing: &String| existing == name) {
            seen.push(name.to_string());
        }
    }
    seen
}
