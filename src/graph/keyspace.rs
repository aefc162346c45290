//! Per-type key space collection.

use std::collections::{BTreeMap, HashSet};

use super::{EntityType, RelationSchema};
use crate::error::Result;
use crate::tables::TableRegistry;

/// Deduplicated external keys per entity type. Unordered within a type.
pub type KeySpaces = BTreeMap<EntityType, HashSet<String>>;

/// Where a key column of one table gets its values from.
enum KeySource {
    /// Read by no relation on the table: every non-null cell counts.
    Standalone(usize),
    /// Endpoint of one or more relations: a cell counts only in rows where
    /// both columns of at least one of those relations are non-null.
    Paired { col: usize, partners: Vec<usize> },
}

/// Collect the key space of every entity type the schema declares.
///
/// Keys are gathered per column and unioned. A column that is a relation
/// endpoint only contributes from rows whose relation pair is complete, so
/// a key whose only occurrence has a null partner never enters its key
/// space. Absent tables contribute nothing; declared types with no keys
/// map to an empty set.
pub fn build_key_spaces(tables: &TableRegistry, schema: &RelationSchema) -> Result<KeySpaces> {
    let mut spaces: KeySpaces = schema
        .entity_types()
        .into_iter()
        .map(|t| (t, HashSet::new()))
        .collect();

    for name in schema.tables() {
        let Some(table) = tables.get(name) else {
            continue;
        };

        let mut sources: Vec<(EntityType, KeySource)> = Vec::new();
        for (entity, column) in schema.key_columns(name) {
            let col = table.column_index(column)?;
            let mut partners = Vec::new();
            for rule in schema.relations.iter().filter(|r| r.table == name) {
                if rule.src_type == entity && rule.src_column == column {
                    partners.push(table.column_index(rule.dst_column)?);
                }
                if rule.dst_type == entity && rule.dst_column == column {
                    partners.push(table.column_index(rule.src_column)?);
                }
            }
            let source = if partners.is_empty() {
                KeySource::Standalone(col)
            } else {
                KeySource::Paired { col, partners }
            };
            sources.push((entity, source));
        }

        let mut skipped = 0usize;
        for row in 0..table.row_count() {
            for (entity, source) in &sources {
                let value = match source {
                    KeySource::Standalone(col) => table.cell(row, *col),
                    KeySource::Paired { col, partners } => table
                        .cell(row, *col)
                        .filter(|_| partners.iter().any(|&p| table.cell(row, p).is_some())),
                };
                match value {
                    Some(v) => {
                        spaces.entry(*entity).or_default().insert(v.to_string());
                    }
                    None => skipped += 1,
                }
            }
        }

        if skipped > 0 {
            log::debug!("{}: {} key cells null or unpaired", name, skipped);
        }
    }

    Ok(spaces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Table;

    fn disease_gene() -> Table {
        Table::new(
            "disease_gene",
            &["DiseaseCui", "GeneId"],
            vec![
                vec![Some("D1"), Some("G1")],
                vec![Some("D2"), Some("G2")],
                vec![Some("D1"), Some("G2")],
                vec![Some(""), Some("G3")],
            ],
        )
    }

    #[test]
    fn test_unpaired_keys_excluded() {
        let registry = TableRegistry::from_tables([disease_gene()]);
        let spaces = build_key_spaces(&registry, &RelationSchema::builtin()).unwrap();

        let disease = &spaces[&EntityType::Disease];
        let gene = &spaces[&EntityType::Gene];
        assert_eq!(disease.len(), 2);
        assert!(disease.contains("D1") && disease.contains("D2"));
        assert_eq!(gene.len(), 2);
        assert!(!gene.contains("G3"));
        assert!(!disease.contains(""));
    }

    #[test]
    fn test_union_across_tables_and_namespaces() {
        let pathway = Table::new(
            "disease_gene_pathway",
            &["DiseaseCui", "GeneId", "PathwayId"],
            vec![vec![Some("D3"), Some("G1"), Some("P1")]],
        );
        // Same string in a different type must not collide.
        let chem = Table::new(
            "chemical_location",
            &["ChemicalId", "CityId"],
            vec![vec![Some("D1"), Some("C1")]],
        );
        let registry = TableRegistry::from_tables([disease_gene(), pathway, chem]);
        let spaces = build_key_spaces(&registry, &RelationSchema::builtin()).unwrap();

        assert_eq!(spaces[&EntityType::Disease].len(), 3);
        assert_eq!(spaces[&EntityType::Gene].len(), 2);
        assert_eq!(spaces[&EntityType::Pathway].len(), 1);
        assert!(spaces[&EntityType::Chemical].contains("D1"));
        assert!(spaces[&EntityType::Biomarker].is_empty());
        assert_eq!(spaces.len(), 11);
    }

    #[test]
    fn test_null_gene_keeps_disease_variant_pair() {
        let variants = Table::new(
            "disease_variant",
            &["DiseaseCui", "GeneId", "VariantId"],
            vec![
                vec![Some("D1"), None, Some("rs1")],
                vec![Some("D2"), Some("G1"), None],
            ],
        );
        let registry = TableRegistry::from_tables([variants]);
        let spaces = build_key_spaces(&registry, &RelationSchema::builtin()).unwrap();

        let disease = &spaces[&EntityType::Disease];
        assert_eq!(disease.len(), 1);
        assert!(disease.contains("D1"));
        assert_eq!(spaces[&EntityType::Variant].len(), 1);
        assert!(spaces[&EntityType::Variant].contains("rs1"));
        // G1 pairs only with a null variant.
        assert!(spaces[&EntityType::Gene].is_empty());
    }

    #[test]
    fn test_null_disease_keeps_gene_pathway_pair() {
        let pathway = Table::new(
            "disease_gene_pathway",
            &["DiseaseCui", "GeneId", "PathwayId"],
            vec![
                vec![None, Some("G1"), Some("P1")],
                vec![Some("D9"), Some("G2"), None],
            ],
        );
        let registry = TableRegistry::from_tables([pathway]);
        let spaces = build_key_spaces(&registry, &RelationSchema::builtin()).unwrap();

        assert_eq!(spaces[&EntityType::Gene].len(), 1);
        assert!(spaces[&EntityType::Gene].contains("G1"));
        assert!(spaces[&EntityType::Pathway].contains("P1"));
        // No relation reads DiseaseCui here, so it is collected on its own.
        assert!(spaces[&EntityType::Disease].contains("D9"));
    }
}
