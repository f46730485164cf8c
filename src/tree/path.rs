//! Dot-delimited path helpers.

/// Largest sequence index a path may address.
pub const MAX_SEQUENCE_INDEX: usize = 10_000;

/// Split a dot path into segments. The empty path has no segments.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    (!path.is_empty()).then(|| path.split('.')).into_iter().flatten()
}

/// Join a parent path and a child segment.
pub fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", parent, segment)
    }
}

/// Parse a segment as a sequence index.
///
/// Only plain ASCII digits count; `"+1"` or `" 1"` are mapping keys.
/// Digit runs too long for `usize` saturate so callers can reject them.
pub fn index_segment(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(segment.parse().unwrap_or(usize::MAX))
}

/// Last segment of a path, or the whole path if it has none.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
