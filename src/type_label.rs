//! File type labels used as destination folder names.
//!
//! A label is derived from the file name alone (no content sniffing) and then
//! sanitized so it is always safe to use as a single path component.
//!
//! # Examples
//!
//! ```
//! use std::path::Path;
//! use typesort::type_label::TypeLabel;
//!
//! assert_eq!(TypeLabel::for_path(Path::new("report.PDF")).as_str(), "pdf");
//! assert_eq!(TypeLabel::for_path(Path::new("notes.tar.gz")).as_str(), "tar.gz");
//! assert_eq!(TypeLabel::for_path(Path::new(".bashrc")).as_str(), "dotfile");
//! assert_eq!(TypeLabel::for_path(Path::new("Makefile")).as_str(), "no-extension");
//! ```

use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Compressed tarball suffixes that are kept whole instead of split at the last dot.
pub static MULTIPART_EXTENSIONS: &[&str] =
    &[".tar.gz", ".tar.bz2", ".tar.xz", ".tar.zst", ".tar.lz4"];

/// Label for names like `.bashrc`.
pub const DOTFILE_LABEL: &str = "dotfile";
/// Label for names without a suffix.
pub const NO_EXTENSION_LABEL: &str = "no-extension";
/// Label used when sanitization leaves nothing behind.
pub const UNKNOWN_LABEL: &str = "unknown";

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex is valid"));

/// A sanitized folder name derived from a file's name.
///
/// Only contains ASCII alphanumerics, `.`, `_` and `-`, never starts or ends
/// with one of the separators and is never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeLabel(String);

impl TypeLabel {
    /// Classifies a path by its file name and sanitizes the result.
    pub fn for_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        Self::sanitize(&raw_type_name(&name))
    }

    /// Turns an arbitrary string into a label.
    ///
    /// Runs of unsafe characters collapse to a single `_`, boundary separators
    /// are trimmed, and an empty result becomes [`UNKNOWN_LABEL`].
    pub fn sanitize(type_name: &str) -> Self {
        let cleaned = UNSAFE_CHARS.replace_all(type_name.trim(), "_");
        let cleaned = cleaned.trim_matches(|c: char| matches!(c, '.' | '_' | '-'));
        if cleaned.is_empty() {
            Self(UNKNOWN_LABEL.to_string())
        } else {
            Self(cleaned.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for TypeLabel {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// Returns the unsanitized type name for a file name.
///
/// Checked in order: single-dot dotfiles, known multi-part archive suffixes,
/// then the lowercase last suffix.
pub fn raw_type_name(file_name: &str) -> String {
    if file_name.starts_with('.') && file_name.matches('.').count() == 1 {
        return DOTFILE_LABEL.to_string();
    }

    let lower = file_name.to_lowercase();
    if let Some(ext) = MULTIPART_EXTENSIONS.iter().find(|ext| lower.ends_with(*ext)) {
        return ext.trim_start_matches('.').to_string();
    }

    match split_suffix(file_name) {
        (_, Some(suffix)) => suffix.to_lowercase(),
        (_, None) => NO_EXTENSION_LABEL.to_string(),
    }
}

/// Splits a file name into stem and suffix at the last dot.
///
/// A dot at the first or last position does not start a suffix, so
/// `.bashrc` and `file.` have none.
pub fn split_suffix(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < file_name.len() => {
            (&file_name[..idx], Some(&file_name[idx + 1..]))
        }
        _ => (file_name, None),
    }
}
