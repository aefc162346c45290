pub mod csv_source;
pub mod metadata;
pub mod walker;

pub use csv_source::CsvTableSource;
pub use metadata::{compute_file_hash, table_name_from_path};
pub use walker::{discover_tables, TableFile};

use std::collections::HashMap;

use crate::error::{HetgraphError, Result};
use crate::graph::RelationSchema;

/// A fully materialised source table. Null cells are already `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    /// SHA-256 of the source file, when the table came from disk.
    pub checksum: Option<String>,
}

impl Table {
    /// Build an in-memory table; empty cells become null.
    pub fn new(name: impl Into<String>, columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|cell| cell.filter(|s| !s.is_empty()).map(str::to_string))
                        .collect()
                })
                .collect(),
            checksum: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of `column`, or a schema mismatch.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| HetgraphError::SchemaMismatch {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Cell at (`row`, `col`); short rows read as null.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }
}

/// Trait for table stores
pub trait TableSource {
    /// Load the named table; `Ok(None)` when the store does not have it.
    fn load(&self, name: &str) -> Result<Option<Table>>;
}

/// The set of tables present for one run, keyed by name.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<String, Table>,
}

impl TableRegistry {
    /// Load every table the schema declares from `source`.
    ///
    /// Missing tables are logged and skipped; a present table without a
    /// required column aborts the load.
    pub fn load(source: &dyn TableSource, schema: &RelationSchema) -> Result<Self> {
        let mut registry = Self::default();

        for name in schema.tables() {
            match source.load(name)? {
                Some(table) => {
                    log::info!("Loaded {} -> {} rows", name, table.row_count());
                    registry.insert(table);
                }
                None => {
                    log::warn!("Table {} not found, skipping", name);
                }
            }
        }

        registry.validate(schema)?;
        Ok(registry)
    }

    /// Registry over tables already in memory.
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        let mut registry = Self::default();
        for table in tables {
            registry.insert(table);
        }
        registry
    }

    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Check every present table against the schema's column contract.
    pub fn validate(&self, schema: &RelationSchema) -> Result<()> {
        for name in schema.tables() {
            if let Some(table) = self.get(name) {
                for column in schema.required_columns(name) {
                    table.column_index(column)?;
                }
            }
        }
        Ok(())
    }
}
