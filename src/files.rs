//! Opening Markdown files.
//!
//! Validates the extension before touching the disk, then reads the text as
//! UTF-8, falling back to Latin-1 for legacy files.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name shown when no file is open.
pub const APP_NAME: &str = "marksight";

const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

/// Why a file could not be opened.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileError {
    #[error("Not a markdown file. Please drop a .md or .markdown file.")]
    InvalidFileType(PathBuf),
    #[error("The file could not be found.")]
    NotFound(PathBuf),
    #[error("Could not read the file: {0}")]
    Read(String),
}

/// Whether `ext` (without the dot) is a Markdown extension. Case-insensitive.
pub fn is_markdown_extension(ext: &str) -> bool {
    MARKDOWN_EXTENSIONS
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// Whether `path` has a Markdown extension.
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(is_markdown_extension)
}

/// Read a Markdown file.
///
/// # Errors
/// [`FileError::InvalidFileType`] for other extensions (checked first),
/// [`FileError::NotFound`] if nothing exists at `path`, and
/// [`FileError::Read`] for any I/O failure.
pub fn read_markdown_file(path: &Path) -> Result<String, FileError> {
    if !is_markdown_file(path) {
        return Err(FileError::InvalidFileType(path.to_path_buf()));
    }
    if !path.exists() {
        return Err(FileError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|err| FileError::Read(err.to_string()))?;
    Ok(decode(bytes))
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        // every byte is a valid Latin-1 code point
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

/// Display form of `path` with the home directory shortened to `~`.
///
/// # Example
///
/// ```
/// use marksight::files::{APP_NAME, abbreviate_path};
///
/// assert_eq!(abbreviate_path(None), APP_NAME);
/// assert_eq!(abbreviate_path(Some(std::path::Path::new(""))), "");
/// ```
pub fn abbreviate_path(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return APP_NAME.to_string();
    };
    let home = std::env::var_os("HOME").map(PathBuf::from);
    abbreviate_with_home(path, home.as_deref())
}

fn abbreviate_with_home(path: &Path, home: Option<&Path>) -> String {
    if path.as_os_str().is_empty() {
        return String::new();
    }
    if let Some(home) = home.filter(|home| !home.as_os_str().is_empty())
        && let Ok(rest) = path.strip_prefix(home)
    {
        if rest.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_markdown_extensions() {
        assert!(is_markdown_extension("md"));
        assert!(is_markdown_extension("MD"));
        assert!(is_markdown_extension("Markdown"));
        assert!(!is_markdown_extension("txt"));
        assert!(!is_markdown_extension(""));
        assert!(is_markdown_file(Path::new("notes/README.md")));
        assert!(!is_markdown_file(Path::new("README")));
    }

    #[test]
    fn test_invalid_type_checked_before_existence() {
        let err = read_markdown_file(Path::new("/definitely/missing.txt")).unwrap_err();
        assert!(matches!(err, FileError::InvalidFileType(_)));
        assert_eq!(
            err.to_string(),
            "Not a markdown file. Please drop a .md or .markdown file."
        );
    }

    #[test]
    fn test_missing_markdown_file() {
        let dir = tempdir().unwrap();
        let err = read_markdown_file(&dir.path().join("gone.md")).unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
        assert_eq!(err.to_string(), "The file could not be found.");
    }

    #[test]
    fn test_directory_with_markdown_name_is_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("folder.md");
        fs::create_dir(&path).unwrap();
        let err = read_markdown_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Could not read the file: "));
    }

    #[test]
    fn test_reads_utf8_and_latin1() {
        let dir = tempdir().unwrap();
        let utf8 = dir.path().join("a.md");
        fs::write(&utf8, "# Café").unwrap();
        assert_eq!(read_markdown_file(&utf8).unwrap(), "# Café");

        let latin1 = dir.path().join("b.markdown");
        fs::write(&latin1, [b'C', b'a', b'f', 0xE9]).unwrap();
        assert_eq!(read_markdown_file(&latin1).unwrap(), "Café");
    }

    #[test]
    fn test_abbreviate_with_home() {
        let home = Path::new("/Users/sam");
        assert_eq!(
            abbreviate_with_home(Path::new("/Users/sam/docs/a.md"), Some(home)),
            "~/docs/a.md"
        );
        assert_eq!(abbreviate_with_home(home, Some(home)), "~");
        assert_eq!(
            abbreviate_with_home(Path::new("/tmp/a.md"), Some(home)),
            "/tmp/a.md"
        );
        assert_eq!(
            abbreviate_with_home(Path::new("/Users/samuel/a.md"), Some(home)),
            "/Users/samuel/a.md"
        );
        assert_eq!(abbreviate_with_home(Path::new("/tmp/a.md"), None), "/tmp/a.md");
    }
}
