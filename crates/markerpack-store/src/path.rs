//! Pack-relative path normalization.

/// Normalize a pack-relative path into a lookup key.
///
/// Separators become `/`, leading `./` and `/` are dropped, and the result
/// is lower-cased.
pub fn normalize_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut trimmed = unified.as_str();

    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }

    trimmed.to_lowercase()
}

/// Check whether `path` ends with `extension` (case-insensitive).
///
/// An empty extension matches everything.
pub(crate) fn has_extension(path: &str, extension: &str) -> bool {
    if extension.is_empty() {
        return true;
    }

    path.len() >= extension.len()
        && path
            .get(path.len() - extension.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(extension))
}
