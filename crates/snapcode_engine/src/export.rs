use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use snapcode_logging::snap_info;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::preview::UTILITY_STYLESHEET_URL;

/// Default file name for a downloaded component.
pub const EXPORT_FILE_NAME: &str = "snapcode-component.html";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("nothing to export")]
    Empty,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Wraps generated markup into a self-contained page that loads the utility
/// stylesheet and renders on its own.
pub fn build_standalone_document(markup: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    \
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    \
<title>Generated Component</title>\n    <script src=\"{UTILITY_STYLESHEET_URL}\"></script>\n</head>\n\
<body class=\"bg-gray-100 p-8\">\n{}\n</body>\n</html>\n",
        markup.trim()
    )
}

/// Creates `dir` if needed and checks that it is writable.
pub fn ensure_output_dir(dir: &Path) -> Result<(), ExportError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(ExportError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes `content` to `path` through a sibling temp file and a rename, so a
/// reader never sees a partial page.
pub fn write_atomically(path: &Path, content: &str) -> Result<PathBuf, ExportError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_output_dir(&dir)?;

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| ExportError::Io(e.error))?;
    Ok(path.to_path_buf())
}

/// Exports `markup` as a standalone page at `path`.
pub fn export_standalone(path: &Path, markup: &str) -> Result<PathBuf, ExportError> {
    if markup.trim().is_empty() {
        return Err(ExportError::Empty);
    }
    let written = write_atomically(path, &build_standalone_document(markup))?;
    snap_info!("Exported component to {:?}", written);
    Ok(written)
}

/// Exports `markup` into `dir` under [`EXPORT_FILE_NAME`].
pub fn write_standalone_document(dir: &Path, markup: &str) -> Result<PathBuf, ExportError> {
    export_standalone(&dir.join(EXPORT_FILE_NAME), markup)
}
