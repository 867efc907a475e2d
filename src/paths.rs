//! Logical resource names.
//!
//! Names are compared in a single canonical form: forward-slash separated,
//! relative, without empty or `.` segments. Backslashes are treated as
//! separators so that Windows-style names and archive entries written on
//! Windows compare equal to their forward-slash counterparts.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters that would end or escape a URI path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Convert a name to its canonical forward-slash form.
///
/// ```
/// assert_eq!(resfind::paths::normalize("a\\b//./c/"), "a/b/c");
/// assert_eq!(resfind::paths::normalize("./test1.file"), "test1.file");
/// ```
pub fn normalize(name: &str) -> String {
    name.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent component of a normalized name, or `""` for top-level names.
pub fn parent(name: &str) -> &str {
    match name.rfind('/') {
        Some(idx) => &name[..idx],
        None => "",
    }
}

/// Last component of a normalized name.
pub fn base_name(name: &str) -> &str {
    match name.rfind('/') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Join two normalized names.
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{}", parent, child)
    }
}

/// `"txt"` and `".txt"` both become `".txt"`.
pub fn prefix_dot(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{}", extension)
    }
}

/// Literal suffix match of `name` against a dotted `extension`.
pub fn has_extension(name: &str, extension: &str) -> bool {
    name.len() >= extension.len() && name.ends_with(extension)
}

/// Whether a normalized name climbs above its root.
pub fn escapes_root(name: &str) -> bool {
    name.split('/').any(|segment| segment == "..")
}

/// A normalized name as a relative URI path, each segment percent-encoded.
///
/// ```
/// assert_eq!(resfind::paths::encode_uri_path("a/x #1.file"), "a/x%20%231.file");
/// ```
pub fn encode_uri_path(name: &str) -> String {
    name.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
