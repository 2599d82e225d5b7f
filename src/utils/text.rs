//! Small text helpers for display and file naming.

/// Longest file name component produced by [`sanitize_path_component`]
const MAX_COMPONENT_LENGTH: usize = 120;

/// First `max_chars` characters of `text` (never splits a UTF-8 sequence).
///
/// ```
/// use arxiv_shelf::utils::truncate_chars;
///
/// assert_eq!(truncate_chars("Schrödinger", 7), "Schrödi");
/// assert_eq!(truncate_chars("Hi", 8), "Hi");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Turn a title or author name into a single safe path component.
///
/// Keeps alphanumerics, dash, underscore, dot and space; path separators and
/// other punctuation become `_`. Leading dots are stripped so the result can
/// never be `.` or `..`. Returns `None` when nothing usable is left.
pub fn sanitize_path_component(name: &str) -> Option<String> {
    let mut sanitized = String::new();
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() || ch == '-' || ch == '_' || ch == '.' || ch == ' ' {
            sanitized.push(ch);
        } else if !ch.is_control() {
            sanitized.push('_');
        }
    }

    let sanitized = sanitized.trim_start_matches('.').trim();
    let sanitized = truncate_chars(sanitized, MAX_COMPONENT_LENGTH).trim_end();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '_') {
        None
    } else {
        Some(sanitized.to_string())
    }
}
