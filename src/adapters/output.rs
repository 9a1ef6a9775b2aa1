//! JSON output writer for joined rows

use crate::domain::{JoinedRow, Result, SwimbestError};
use std::fs;
use std::path::Path;

/// Write `rows` to `path` as a pretty-printed JSON array
///
/// Missing parent directories are created. The file is written to a sibling
/// temporary path first and renamed into place, so readers never observe a
/// half-written array.
///
/// # Errors
///
/// Returns an I/O error if the directory or file cannot be written.
pub fn write_rows(path: impl AsRef<Path>, rows: &[JoinedRow]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            SwimbestError::Io(format!(
                "Failed to create output directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let json = serde_json::to_string_pretty(rows)?;
    let tmp_path = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
    fs::write(&tmp_path, json).map_err(|e| {
        SwimbestError::Io(format!("Failed to write {}: {e}", tmp_path.display()))
    })?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(SwimbestError::Io(format!(
            "Failed to move output into {}: {e}",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), rows = rows.len(), "Output written");
    Ok(rows.len())
}
