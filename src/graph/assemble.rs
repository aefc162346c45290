//! Single-pass graph assembly: key spaces -> ID maps -> edges -> graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{assign_ids, build_edges, build_key_spaces, EdgeType, HeteroGraph, IdMap, IdMaps, NodeSet, RelationSchema};
use crate::error::{HetgraphError, Result};
use crate::tables::TableRegistry;

/// Assembly switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Collapse repeated (src, dst) pairs within each relation.
    pub dedup_edges: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Loaded,
    Missing,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Loaded => "loaded",
            TableStatus::Missing => "missing",
        }
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TableStatus {
    type Err = HetgraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "loaded" => Ok(TableStatus::Loaded),
            "missing" => Ok(TableStatus::Missing),
            other => Err(HetgraphError::Artifact(format!("unknown table status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub status: TableStatus,
    pub row_count: usize,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationReport {
    pub edge_type: EdgeType,
    pub table: String,
    pub num_edges: usize,
    pub dropped_rows: usize,
}

/// What one build saw: source table status and per-relation resolution counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Whether repeated pairs were collapsed.
    pub dedup_edges: bool,
    pub tables: Vec<TableReport>,
    pub relations: Vec<RelationReport>,
}

impl BuildReport {
    pub fn missing_tables(&self) -> impl Iterator<Item = &str> {
        self.tables
            .iter()
            .filter(|t| t.status == TableStatus::Missing)
            .map(|t| t.table.as_str())
    }

    pub fn dropped_rows(&self) -> usize {
        self.relations.iter().map(|r| r.dropped_rows).sum()
    }
}

/// The finished graph plus everything a consumer needs to map it back.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub graph: HeteroGraph,
    /// Every declared type, including those left out of the graph for having no keys.
    pub id_maps: IdMaps,
    pub report: BuildReport,
}

/// Assemble with default options (multigraph edges).
pub fn assemble(tables: &TableRegistry, schema: &RelationSchema) -> Result<Assembly> {
    assemble_with(tables, schema, &BuildOptions::default())
}

/// Build the heterogeneous graph for every type and relation in schema order.
pub fn assemble_with(tables: &TableRegistry, schema: &RelationSchema, options: &BuildOptions) -> Result<Assembly> {
    tables.validate(schema)?;

    let key_spaces = build_key_spaces(tables, schema)?;
    let id_maps: IdMaps = key_spaces
        .iter()
        .map(|(entity, keys)| (*entity, assign_ids(keys)))
        .collect();

    let mut graph = HeteroGraph::new();
    for entity in schema.entity_types() {
        let n = id_maps.get(&entity).map(IdMap::len).unwrap_or(0);
        log::info!("Node type '{}': {} nodes", entity, n);
        if n > 0 {
            graph.insert_nodes(entity, NodeSet::placeholder(n));
        }
    }

    let mut report = BuildReport {
        dedup_edges: options.dedup_edges,
        ..Default::default()
    };
    for name in schema.tables() {
        report.tables.push(match tables.get(name) {
            Some(table) => TableReport {
                table: name.to_string(),
                status: TableStatus::Loaded,
                row_count: table.row_count(),
                checksum: table.checksum.clone(),
            },
            None => TableReport {
                table: name.to_string(),
                status: TableStatus::Missing,
                row_count: 0,
                checksum: None,
            },
        });
    }

    let empty = IdMap::default();
    for rule in schema.relations {
        let Some(table) = tables.get(rule.table) else {
            log::debug!("Relation {} skipped: table {} absent", rule.relation, rule.table);
            continue;
        };

        let src_map = id_maps.get(&rule.src_type).unwrap_or(&empty);
        let dst_map = id_maps.get(&rule.dst_type).unwrap_or(&empty);
        let mut built = build_edges(table, rule.src_column, rule.dst_column, src_map, dst_map)?;
        if options.dedup_edges {
            built = built.dedup();
        }

        let edge_type = rule.edge_type();
        log::info!("Edges {}: {}", edge_type, built.edges.len());
        if built.dropped_rows > 0 {
            log::debug!("Edges {}: {} unresolved rows dropped", edge_type, built.dropped_rows);
        }

        report.relations.push(RelationReport {
            edge_type: edge_type.clone(),
            table: rule.table.to_string(),
            num_edges: built.edges.len(),
            dropped_rows: built.dropped_rows,
        });
        graph.insert_edges(edge_type, built.edges);
    }

    Ok(Assembly { graph, id_maps, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EntityType;
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

    fn chemical_location() -> Table {
        Table::new(
            "chemical_location",
            &["ChemicalId", "CityId", "Value"],
            vec![
                vec![Some("CH2"), Some("MAD"), Some("3.1")],
                vec![Some("CH1"), Some("BCN"), Some("1.0")],
                vec![Some("CH2"), Some("MAD"), Some("2.2")],
            ],
        )
    }

    #[test]
    fn test_disease_gene_scenario() {
        let registry = TableRegistry::from_tables([disease_gene()]);
        let Assembly { graph, id_maps, report } = assemble(&registry, &RelationSchema::builtin()).unwrap();

        let disease = &id_maps[&EntityType::Disease];
        assert_eq!(disease.get("D1"), Some(0));
        assert_eq!(disease.get("D2"), Some(1));
        assert_eq!(disease.len(), 2);
        let gene = &id_maps[&EntityType::Gene];
        assert_eq!(gene.get("G1"), Some(0));
        assert_eq!(gene.get("G2"), Some(1));
        assert_eq!(gene.get("G3"), None);

        let et = EdgeType::new(EntityType::Disease, "assoc_gene", EntityType::Gene);
        let edges = graph.edge_index(&et).unwrap();
        assert_eq!(edges.pairs().collect::<Vec<_>>(), vec![(0, 0), (1, 1), (0, 1)]);

        assert_eq!(graph.node_types().collect::<Vec<_>>(), vec![EntityType::Disease, EntityType::Gene]);
        assert_eq!(graph.node_set(EntityType::Gene).unwrap().features, vec![1.0, 1.0]);
        assert_eq!(report.relations.len(), 1);
        assert_eq!(report.relations[0].dropped_rows, 1);
        assert_eq!(report.missing_tables().count(), 9);
    }

    #[test]
    fn test_absent_biomarker_table_omitted() {
        let registry = TableRegistry::from_tables([disease_gene(), chemical_location()]);
        let assembly = assemble(&registry, &RelationSchema::builtin()).unwrap();
        let graph = &assembly.graph;

        assert!(graph.node_set(EntityType::Biomarker).is_none());
        assert!(graph.relation("assoc_biomarker").is_none());
        assert!(graph.relation("assoc_gene").is_some());
        assert_eq!(graph.relation("measured_in").unwrap().1.len(), 3);
        assert_eq!(graph.num_nodes(EntityType::City), 2);
        // Dropped types still carry an (empty) ID map.
        assert!(assembly.id_maps[&EntityType::Biomarker].is_empty());
    }

    #[test]
    fn test_present_but_empty_table_gives_empty_relation() {
        let empty = Table::new("disease_biomarker", &["DiseaseCui", "BiomarkerId"], vec![]);
        let registry = TableRegistry::from_tables([empty]);
        let assembly = assemble(&registry, &RelationSchema::builtin()).unwrap();

        let (et, edges) = assembly.graph.relation("assoc_biomarker").unwrap();
        assert_eq!(et.dst, EntityType::Biomarker);
        assert_eq!(edges.shape(), (2, 0));
        assert_eq!(assembly.graph.node_types().count(), 0);
        assert_eq!(assembly.report.missing_tables().count(), 9);
    }

    #[test]
    fn test_edges_resolve_into_endpoint_maps() {
        let variants = Table::new(
            "disease_variant",
            &["DiseaseCui", "GeneId", "VariantId"],
            vec![
                vec![Some("D1"), Some("G7"), Some("rs1")],
                vec![Some("D2"), None, Some("rs2")],
                vec![Some("D1"), Some("G8"), Some("rs3")],
            ],
        );
        let registry = TableRegistry::from_tables([disease_gene(), variants]);
        let assembly = assemble(&registry, &RelationSchema::builtin()).unwrap();

        for (et, edges) in assembly.graph.edges() {
            let src_n = assembly.id_maps[&et.src].len();
            let dst_n = assembly.id_maps[&et.dst].len();
            assert!(edges.pairs().all(|(s, d)| s < src_n && d < dst_n), "{}", et);
        }
        let (_, located) = assembly.graph.relation("located_in").unwrap();
        assert_eq!(located.len(), 2);
        // A null GeneId only breaks the variant-gene pair of that row.
        let (_, assoc) = assembly.graph.relation("assoc_variant").unwrap();
        assert_eq!(assoc.len(), 3);
        let rs2 = assembly.id_maps[&EntityType::Variant].get("rs2").unwrap();
        let d2 = assembly.id_maps[&EntityType::Disease].get("D2").unwrap();
        assert_eq!(assoc.pairs().nth(1), Some((d2, rs2)));
    }

    #[test]
    fn test_null_disease_keeps_participates_in_edge() {
        let pathway = Table::new(
            "disease_gene_pathway",
            &["DiseaseCui", "GeneId", "PathwayId"],
            vec![vec![None, Some("G1"), Some("P1")]],
        );
        let registry = TableRegistry::from_tables([pathway]);
        let assembly = assemble(&registry, &RelationSchema::builtin()).unwrap();

        let (_, edges) = assembly.graph.relation("participates_in").unwrap();
        assert_eq!(edges.pairs().collect::<Vec<_>>(), vec![(0, 0)]);
        assert_eq!(assembly.graph.num_nodes(EntityType::Gene), 1);
        assert_eq!(assembly.graph.num_nodes(EntityType::Pathway), 1);
        assert_eq!(assembly.graph.num_nodes(EntityType::Disease), 0);
    }

    #[test]
    fn test_dedup_option() {
        let registry = TableRegistry::from_tables([chemical_location()]);
        let assembly = assemble_with(
            &registry,
            &RelationSchema::builtin(),
            &BuildOptions { dedup_edges: true },
        )
        .unwrap();
        let (_, edges) = assembly.graph.relation("measured_in").unwrap();
        assert_eq!(edges.pairs().collect::<Vec<_>>(), vec![(1, 1), (0, 0)]);
    }

    #[test]
    fn test_schema_mismatch_aborts() {
        let bad = Table::new("chemical_evidence", &["ChemicalId"], vec![vec![Some("CH1")]]);
        let registry = TableRegistry::from_tables([disease_gene(), bad]);
        let err = assemble(&registry, &RelationSchema::builtin()).unwrap_err();
        assert!(matches!(err, HetgraphError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_deterministic_across_row_order() {
        let mut shuffled = chemical_location();
        shuffled.rows.reverse();
        let a = assemble(&TableRegistry::from_tables([chemical_location()]), &RelationSchema::builtin()).unwrap();
        let b = assemble(&TableRegistry::from_tables([shuffled]), &RelationSchema::builtin()).unwrap();
        assert_eq!(a.id_maps, b.id_maps);
    }
}
