//! Name list reading
//!
//! The names file is plain UTF-8 text, one name per line. Lines are
//! trimmed of surrounding whitespace; lines that trim to nothing are
//! skipped. Order is preserved and duplicates are kept.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Read the ordered list of non-empty trimmed names from a text file
///
/// An empty file yields an empty list, which is not an error.
pub fn read_names(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let raw = fs::read_to_string(path)?;

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_names_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write names");
        file
    }

    #[test]
    fn test_trims_and_drops_blank_lines() {
        let file = write_names_file("  Alice\n\nBob  \n   \n");
        let names = read_names(file.path()).unwrap();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_preserves_order_and_duplicates() {
        let file = write_names_file("Jane Doe\nAlice\nJane Doe\n");
        let names = read_names(file.path()).unwrap();
        assert_eq!(names, vec!["Jane Doe", "Alice", "Jane Doe"]);
    }

    #[test]
    fn test_empty_file_yields_empty_list() {
        let file = write_names_file("");
        let names = read_names(file.path()).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = read_names(Path::new("nonexistent-names.txt"));
        assert!(matches!(result.unwrap_err(), Error::FileNotFound(_)));
    }

    #[test]
    fn test_windows_line_endings() {
        let file = write_names_file("Alice\r\nBob\r\n");
        let names = read_names(file.path()).unwrap();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }
}
