//! Path algebra for the virtual filesystem.
//!
//! Paths are plain strings in normalized absolute form: a single leading
//! [`SEPARATOR`], non-empty segments joined by exactly one separator and no
//! trailing separator (except the root, which is the separator alone).
//! Every function here is pure.

use unicode_normalization::UnicodeNormalization;

use crate::error::NameError;

/// The reserved segment separator.
pub const SEPARATOR: char = '/';

/// The path of the root directory.
pub const ROOT: &str = "/";

/// Maximum length of a single name, in bytes.
pub const MAX_NAME_LENGTH: usize = 255;

/// Normalizes `path` into absolute form.
///
/// Repeated separators collapse into one, trailing separators are dropped
/// and a single leading separator is ensured. Empty input yields the root.
/// `.` and `..` segments are kept verbatim; they can never name a node, so
/// lookups through them simply fail.
///
/// # Examples
///
/// ```
/// use arbor_core::fs::path::normalize;
///
/// assert_eq!(normalize("//src///lib/"), "/src/lib");
/// assert_eq!(normalize(""), "/");
/// ```
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments(path) {
        out.push(SEPARATOR);
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push(SEPARATOR);
    }
    out
}

/// Iterates over the non-empty segments of `path`.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty())
}

/// Joins `base` with each of `parts`, stripping stray separators.
pub fn join<S: AsRef<str>>(base: &str, parts: &[S]) -> String {
    let mut joined = String::from(base);
    for part in parts {
        let part = part.as_ref().trim_matches(SEPARATOR);
        if part.is_empty() {
            continue;
        }
        joined.push(SEPARATOR);
        joined.push_str(part);
    }
    normalize(&joined)
}

/// Joins a directory path with a single child name.
pub fn child(parent: &str, name: &str) -> String {
    join(parent, &[name])
}

/// Returns the parent directory of `path`. The root is its own parent.
pub fn dirname(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind(SEPARATOR) {
        Some(0) | None => ROOT.to_string(),
        Some(idx) => normalized[..idx].to_string(),
    }
}

/// Returns the last segment of `path`, optionally without `ext`.
///
/// The extension is only stripped when it is a proper suffix, so
/// `basename("/.env", Some(".env"))` stays `.env`. The root has an empty
/// basename.
pub fn basename(path: &str, ext: Option<&str>) -> String {
    let name = segments(path).last().unwrap_or("");
    match ext {
        Some(ext) if !ext.is_empty() && name.len() > ext.len() && name.ends_with(ext) => {
            name[..name.len() - ext.len()].to_string()
        }
        _ => name.to_string(),
    }
}

/// Returns the extension of the last segment including the leading dot,
/// or an empty string. Dot-files such as `.gitignore` have no extension.
pub fn extname(path: &str) -> String {
    let name = basename(path, None);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_string(),
        _ => String::new(),
    }
}

/// Splits a non-root path into `(parent, name)`. Returns `None` for the root.
pub fn split(path: &str) -> Option<(String, String)> {
    let normalized = normalize(path);
    if normalized == ROOT {
        return None;
    }
    Some((dirname(&normalized), basename(&normalized, None)))
}

/// Returns `true` if `child` is strictly nested under `parent`.
///
/// A path is never a sub-path of itself.
pub fn is_sub_path(parent: &str, child: &str) -> bool {
    let parent = normalize(parent);
    let child = normalize(child);
    if parent == child {
        return false;
    }
    if parent == ROOT {
        return true;
    }
    child
        .strip_prefix(parent.as_str())
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// Returns `true` if `path` equals `ancestor` or is nested under it.
pub fn is_within(ancestor: &str, path: &str) -> bool {
    normalize(ancestor) == normalize(path) || is_sub_path(ancestor, path)
}

/// Validates a single node name.
///
/// # Errors
///
/// - [`NameError::Empty`]: the name is empty.
/// - [`NameError::ContainsSeparator`]: the name contains `/` or `\`.
/// - [`NameError::InvalidCharacter`]: the name contains a control character.
/// - [`NameError::ReservedName`]: the name is `.` or `..`.
/// - [`NameError::TooLong`]: the name exceeds [`MAX_NAME_LENGTH`] bytes.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.contains(SEPARATOR) || name.contains('\\') {
        return Err(NameError::ContainsSeparator);
    }
    if name.chars().any(char::is_control) {
        return Err(NameError::InvalidCharacter);
    }
    if name == "." || name == ".." {
        return Err(NameError::ReservedName);
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(NameError::TooLong);
    }
    Ok(())
}

/// Normalises a name to NFC (composed) form.
///
/// macOS stores filenames in NFD (decomposed), so archives built there
/// carry decomposed names. Composing them first keeps `한글.txt` typed in
/// the editor and `한글.txt` imported from a zip pointing at the same node.
pub fn nfc_name(name: &str) -> String {
    name.nfc().collect()
}
