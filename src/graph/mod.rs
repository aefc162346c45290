//! Heterogeneous graph model and the table-to-graph assembly pipeline.
//!
//! Key spaces are collected per entity type from the declared source
//! columns, turned into dense sorted ID maps, and every relation table is
//! translated into integer edge pairs against those maps.

mod assemble;
mod edges;
mod ids;
mod keyspace;
pub mod schema;

pub use assemble::{assemble, assemble_with, Assembly, BuildOptions, BuildReport, RelationReport, TableReport, TableStatus};
pub use edges::{build_edges, EdgeBuild};
pub use ids::{assign_ids, IdMap, IdMaps};
pub use keyspace::{build_key_spaces, KeySpaces};
pub use schema::{ColumnRef, NodeRuleGroup, RelationRule, RelationSchema};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HetgraphError;

/// Width of the placeholder node feature.
pub const PLACEHOLDER_FEATURE_DIM: usize = 1;
/// Value every placeholder feature is filled with.
pub const PLACEHOLDER_FEATURE_VALUE: f32 = 1.0;

/// The closed set of node kinds. Declaration order is the canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Disease,
    Gene,
    Variant,
    GeneFusion,
    ChromRearr,
    Pathway,
    Biomarker,
    Chemical,
    Evidence,
    City,
    DemographicGroup,
}

impl EntityType {
    pub const ALL: [EntityType; 11] = [
        EntityType::Disease,
        EntityType::Gene,
        EntityType::Variant,
        EntityType::GeneFusion,
        EntityType::ChromRearr,
        EntityType::Pathway,
        EntityType::Biomarker,
        EntityType::Chemical,
        EntityType::Evidence,
        EntityType::City,
        EntityType::DemographicGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Disease => "disease",
            EntityType::Gene => "gene",
            EntityType::Variant => "variant",
            EntityType::GeneFusion => "gene_fusion",
            EntityType::ChromRearr => "chrom_rearr",
            EntityType::Pathway => "pathway",
            EntityType::Biomarker => "biomarker",
            EntityType::Chemical => "chemical",
            EntityType::Evidence => "evidence",
            EntityType::City => "city",
            EntityType::DemographicGroup => "demographic_group",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = HetgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| HetgraphError::InvalidInput(format!("unknown entity type '{}'", s)))
    }
}

/// A directed relation type: (source type, relation name, destination type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeType {
    pub src: EntityType,
    pub relation: String,
    pub dst: EntityType,
}

impl EdgeType {
    pub fn new(src: EntityType, relation: impl Into<String>, dst: EntityType) -> Self {
        Self {
            src,
            relation: relation.into(),
            dst,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.src, self.relation, self.dst)
    }
}

/// Nodes of one entity type: a count plus a row-major feature block.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSet {
    pub num_nodes: usize,
    pub feature_dim: usize,
    pub features: Vec<f32>,
}

impl NodeSet {
    /// `num_nodes` rows of the placeholder feature.
    pub fn placeholder(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            feature_dim: PLACEHOLDER_FEATURE_DIM,
            features: vec![PLACEHOLDER_FEATURE_VALUE; num_nodes * PLACEHOLDER_FEATURE_DIM],
        }
    }

    /// Feature row of node `index`.
    pub fn feature(&self, index: usize) -> Option<&[f32]> {
        if index >= self.num_nodes {
            return None;
        }
        let start = index * self.feature_dim;
        self.features.get(start..start + self.feature_dim)
    }
}

/// Edge list of one relation as two parallel index arrays, shape `(2, m)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeIndex {
    pub src: Vec<usize>,
    pub dst: Vec<usize>,
}

impl EdgeIndex {
    pub fn push(&mut self, src: usize, dst: usize) {
        self.src.push(src);
        self.dst.push(dst);
    }

    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    pub fn shape(&self) -> (usize, usize) {
        (2, self.len())
    }

    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.src.iter().copied().zip(self.dst.iter().copied())
    }
}

/// Entity-type list and relation triples, without any node or edge payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSchema {
    pub node_types: Vec<EntityType>,
    pub edge_types: Vec<EdgeType>,
}

/// Typed node sets plus typed edge lists, both kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeteroGraph {
    nodes: Vec<(EntityType, NodeSet)>,
    edges: Vec<(EdgeType, EdgeIndex)>,
}

impl HeteroGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the node set of `entity`.
    pub fn insert_nodes(&mut self, entity: EntityType, nodes: NodeSet) {
        match self.nodes.iter_mut().find(|(t, _)| *t == entity) {
            Some(slot) => slot.1 = nodes,
            None => self.nodes.push((entity, nodes)),
        }
    }

    /// Attach (or replace) the edge list of `edge_type`.
    pub fn insert_edges(&mut self, edge_type: EdgeType, edges: EdgeIndex) {
        match self.edges.iter_mut().find(|(t, _)| *t == edge_type) {
            Some(slot) => slot.1 = edges,
            None => self.edges.push((edge_type, edges)),
        }
    }

    pub fn node_types(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.nodes.iter().map(|(t, _)| *t)
    }

    pub fn edge_types(&self) -> impl Iterator<Item = &EdgeType> {
        self.edges.iter().map(|(t, _)| t)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (EntityType, &NodeSet)> {
        self.nodes.iter().map(|(t, n)| (*t, n))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeType, &EdgeIndex)> {
        self.edges.iter().map(|(t, e)| (t, e))
    }

    pub fn node_set(&self, entity: EntityType) -> Option<&NodeSet> {
        self.nodes.iter().find(|(t, _)| *t == entity).map(|(_, n)| n)
    }

    pub fn num_nodes(&self, entity: EntityType) -> usize {
        self.node_set(entity).map(|n| n.num_nodes).unwrap_or(0)
    }

    pub fn edge_index(&self, edge_type: &EdgeType) -> Option<&EdgeIndex> {
        self.edges.iter().find(|(t, _)| t == edge_type).map(|(_, e)| e)
    }

    /// Look up a relation by name alone.
    pub fn relation(&self, relation: &str) -> Option<(&EdgeType, &EdgeIndex)> {
        self.edges
            .iter()
            .find(|(t, _)| t.relation == relation)
            .map(|(t, e)| (t, e))
    }

    pub fn num_edges(&self) -> usize {
        self.edges.iter().map(|(_, e)| e.len()).sum()
    }

    pub fn schema(&self) -> GraphSchema {
        GraphSchema {
            node_types: self.node_types().collect(),
            edge_types: self.edge_types().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_names_round_trip() {
        for t in EntityType::ALL {
            assert_eq!(t.as_str().parse::<EntityType>().unwrap(), t);
        }
        assert!("protein".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_entity_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&EntityType::DemographicGroup).unwrap();
        assert_eq!(json, "\"demographic_group\"");
    }

    #[test]
    fn test_placeholder_node_set() {
        let nodes = NodeSet::placeholder(3);
        assert_eq!(nodes.num_nodes, 3);
        assert_eq!(nodes.features, vec![1.0, 1.0, 1.0]);
        assert_eq!(nodes.feature(2), Some(&[1.0f32][..]));
        assert_eq!(nodes.feature(3), None);
    }

    #[test]
    fn test_empty_edge_index_shape() {
        let edges = EdgeIndex::default();
        assert_eq!(edges.shape(), (2, 0));
        assert!(edges.is_empty());
    }

    #[test]
    fn test_graph_keeps_insertion_order() {
        let mut graph = HeteroGraph::new();
        graph.insert_nodes(EntityType::Gene, NodeSet::placeholder(2));
        graph.insert_nodes(EntityType::Disease, NodeSet::placeholder(1));
        let et = EdgeType::new(EntityType::Disease, "assoc_gene", EntityType::Gene);
        let mut edges = EdgeIndex::default();
        edges.push(0, 1);
        graph.insert_edges(et.clone(), edges);

        let schema = graph.schema();
        assert_eq!(schema.node_types, vec![EntityType::Gene, EntityType::Disease]);
        assert_eq!(schema.edge_types, vec![et.clone()]);
        assert_eq!(graph.num_nodes(EntityType::City), 0);
        assert_eq!(graph.edge_index(&et).unwrap().len(), 1);
        assert_eq!(et.to_string(), "(disease, assoc_gene, gene)");
    }
}
