use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::table_name_from_path;
use crate::error::Result;

/// A CSV file found in the raw directory
#[derive(Debug, Clone)]
pub struct TableFile {
    pub name: String,
    pub path: PathBuf,
    pub file_size: u64,
}

/// List the CSV tables sitting directly in `root`, sorted by name.
///
/// A missing `root` yields an empty list: every table is then simply absent.
pub fn discover_tables(root: &Path) -> Result<Vec<TableFile>> {
    if !root.exists() {
        log::warn!("Raw directory {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = table_name_from_path(path) else {
            continue;
        };

        let metadata = std::fs::metadata(path)?;
        files.push(TableFile {
            name,
            path: path.to_path_buf(),
            file_size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    log::info!("Discovered {} CSV tables in {}", files.len(), root.display());
    Ok(files)
}
