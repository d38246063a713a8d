//! Helpers for keeping upload names safe on disk and in tracing spans.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Turns a client-supplied file name into a single safe path component.
///
/// Whitespace runs become `_`, path separators and control characters are
/// dropped, and leading dots are stripped so the result can never escape the
/// upload directory or become a hidden file.
pub fn safe_file_name(original: &str) -> String {
    // Clients may send a full path; keep only the last component.
    let last = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);

    let mut out = String::with_capacity(last.len());
    let mut in_whitespace = false;
    for c in last.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_control() || c == ':' {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lowercased extension of a file name including the dot, or an empty string.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(&PathBuf::from("/srv/uploads/abc-lecture.pdf")),
            "abc-lecture.pdf"
        );
    }

    #[test]
    fn test_redact_path_root() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_safe_file_name_replaces_whitespace() {
        assert_eq!(safe_file_name("Week 3  Notes.pdf"), "Week_3_Notes.pdf");
    }

    #[test]
    fn test_safe_file_name_strips_directories() {
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("C:\\Users\\me\\slides.pptx"), "slides.pptx");
    }

    #[test]
    fn test_safe_file_name_hidden_and_empty() {
        assert_eq!(safe_file_name(".env"), "env");
        assert_eq!(safe_file_name(""), "file");
        assert_eq!(safe_file_name(".."), "file");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Lecture.PDF"), ".pdf");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
    }
}
