use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::Result;

/// Compute SHA256 hash of file contents
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let content = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    let hash = hasher.finalize();
    Ok(format!("{:x}", hash))
}

/// Table name for a CSV file path: the file stem, e.g. `raw/disease_gene.csv` -> `disease_gene`.
///
/// Returns `None` for anything that is not a `.csv` file (case-insensitive).
pub fn table_name_from_path(path: &Path) -> Option<String> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if !is_csv {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
