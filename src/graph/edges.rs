//! Row-pair to edge-index translation.

use std::collections::HashSet;

use super::{EdgeIndex, IdMap};
use crate::error::Result;
use crate::tables::Table;

/// Edges resolved from one relation table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeBuild {
    pub edges: EdgeIndex,
    /// Rows skipped because an endpoint did not resolve.
    pub dropped_rows: usize,
}

impl EdgeBuild {
    /// Keep only the first occurrence of each (src, dst) pair.
    pub fn dedup(self) -> Self {
        let mut seen = HashSet::new();
        let mut edges = EdgeIndex::default();
        for (s, d) in self.edges.pairs() {
            if seen.insert((s, d)) {
                edges.push(s, d);
            }
        }
        Self {
            edges,
            dropped_rows: self.dropped_rows,
        }
    }
}

/// Resolve every row of `table` against the endpoint ID maps, in row order.
///
/// Rows whose source or destination value is null or unknown to its map are
/// skipped and counted. Repeated pairs are kept.
pub fn build_edges(
    table: &Table,
    src_column: &str,
    dst_column: &str,
    src_map: &IdMap,
    dst_map: &IdMap,
) -> Result<EdgeBuild> {
    let src_col = table.column_index(src_column)?;
    let dst_col = table.column_index(dst_column)?;

    let mut out = EdgeBuild::default();
    for row in 0..table.row_count() {
        let src = table.cell(row, src_col).and_then(|k| src_map.get(k));
        let dst = table.cell(row, dst_col).and_then(|k| dst_map.get(k));
        match (src, dst) {
            (Some(s), Some(d)) => out.edges.push(s, d),
            _ => out.dropped_rows += 1,
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HetgraphError;

    fn map(keys: &[&str]) -> IdMap {
        IdMap::from_ordered_keys(keys.iter().map(|k| k.to_string()).collect())
    }

    fn disease_gene(rows: Vec<Vec<Option<&str>>>) -> Table {
        Table::new("disease_gene", &["DiseaseCui", "GeneId"], rows)
    }

    #[test]
    fn test_row_order_and_drops() {
        let table = disease_gene(vec![
            vec![Some("D1"), Some("G1")],
            vec![Some("D2"), Some("G2")],
            vec![Some("D1"), Some("G2")],
            vec![Some(""), Some("G3")],
        ]);
        let built = build_edges(&table, "DiseaseCui", "GeneId", &map(&["D1", "D2"]), &map(&["G1", "G2"])).unwrap();

        assert_eq!(built.edges.pairs().collect::<Vec<_>>(), vec![(0, 0), (1, 1), (0, 1)]);
        assert_eq!(built.dropped_rows, 1);
    }

    #[test]
    fn test_unknown_key_dropped() {
        let table = disease_gene(vec![vec![Some("D9"), Some("G1")], vec![Some("D1"), None]]);
        let built = build_edges(&table, "DiseaseCui", "GeneId", &map(&["D1"]), &map(&["G1"])).unwrap();
        assert!(built.edges.is_empty());
        assert_eq!(built.edges.shape(), (2, 0));
        assert_eq!(built.dropped_rows, 2);
    }

    #[test]
    fn test_duplicates_kept_unless_deduped() {
        let table = disease_gene(vec![
            vec![Some("D1"), Some("G1")],
            vec![Some("D1"), Some("G1")],
            vec![Some("D1"), Some("G2")],
        ]);
        let built = build_edges(&table, "DiseaseCui", "GeneId", &map(&["D1"]), &map(&["G1", "G2"])).unwrap();
        assert_eq!(built.edges.len(), 3);

        let deduped = built.dedup();
        assert_eq!(deduped.edges.pairs().collect::<Vec<_>>(), vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let table = disease_gene(vec![]);
        let err = build_edges(&table, "DiseaseCui", "VariantId", &map(&[]), &map(&[])).unwrap_err();
        assert!(matches!(err, HetgraphError::SchemaMismatch { .. }));
    }
}
