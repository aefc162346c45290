use csv::{ReaderBuilder, Trim};
use std::path::{Path, PathBuf};

use super::{compute_file_hash, Table, TableSource};
use crate::error::Result;

/// Reads `<root>/<name>.csv` files written by the extraction stage.
pub struct CsvTableSource {
    root: PathBuf,
    null_markers: Vec<String>,
}

impl CsvTableSource {
    pub fn new<P: AsRef<Path>>(root: P, null_markers: Vec<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            null_markers,
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.csv", name))
    }

    fn normalize_cell(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || self.null_markers.iter().any(|m| m == trimmed) {
            return None;
        }
        Some(trimmed.to_string())
    }

    fn read_table(&self, name: &str, path: &Path) -> Result<Table> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)?;

        let columns = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let row = (0..columns.len())
                .map(|idx| record.get(idx).and_then(|cell| self.normalize_cell(cell)))
                .collect();
            rows.push(row);
        }

        Ok(Table {
            name: name.to_string(),
            columns,
            rows,
            checksum: Some(compute_file_hash(path)?),
        })
    }
}

impl TableSource for CsvTableSource {
    fn load(&self, name: &str) -> Result<Option<Table>> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Ok(None);
        }
        self.read_table(name, &path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source(dir: &TempDir) -> CsvTableSource {
        CsvTableSource::new(dir.path(), vec!["NA".to_string(), "NaN".to_string()])
    }

    #[test]
    fn test_missing_file_is_absent() {
        let temp_dir = TempDir::new().unwrap();
        assert!(source(&temp_dir).load("disease_gene").unwrap().is_none());
    }

    #[test]
    fn test_reads_headers_and_normalizes_nulls() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("disease_gene.csv"),
            "DiseaseCui,DiseaseName,GeneId\nC001, Lung cancer ,7157\nC002,,NaN\n,x,NA\n",
        )
        .unwrap();

        let table = source(&temp_dir).load("disease_gene").unwrap().unwrap();
        assert_eq!(table.columns, vec!["DiseaseCui", "DiseaseName", "GeneId"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(0, 1), Some("Lung cancer"));
        assert_eq!(table.cell(0, 2), Some("7157"));
        assert_eq!(table.cell(1, 1), None);
        assert_eq!(table.cell(1, 2), None);
        assert_eq!(table.cell(2, 0), None);
        assert_eq!(table.checksum.as_ref().map(|c| c.len()), Some(64));
    }

    #[test]
    fn test_short_rows_pad_with_nulls() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("t.csv"), "A,B,C\n1\n1,2,3\n").unwrap();

        let table = source(&temp_dir).load("t").unwrap().unwrap();
        assert_eq!(table.rows[0], vec![Some("1".to_string()), None, None]);
        assert_eq!(table.cell(1, 2), Some("3"));
    }

    #[test]
    fn test_header_only_file_is_present_but_empty() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("disease_biomarker.csv"), "DiseaseCui,BiomarkerId\n").unwrap();

        let table = source(&temp_dir).load("disease_biomarker").unwrap().unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.columns.len(), 2);
    }
}
