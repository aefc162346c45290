//! Declarative extraction rules: which source columns feed each entity key
//! space and which column pairs realise each relation.
//!
//! Table names are file stems under the raw directory. Column names are the
//! extraction stage's headers verbatim (including its spelling of
//! `ChromosomalRearrengementName`).

use super::{EdgeType, EntityType};

/// One source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: &'static str,
    pub column: &'static str,
}

/// Every column contributing keys to one entity type.
#[derive(Debug, Clone, Copy)]
pub struct NodeRuleGroup {
    pub entity: EntityType,
    pub sources: &'static [ColumnRef],
}

/// One relation realised by a table's (source column, destination column) pairs.
#[derive(Debug, Clone, Copy)]
pub struct RelationRule {
    pub table: &'static str,
    pub src_column: &'static str,
    pub src_type: EntityType,
    pub relation: &'static str,
    pub dst_column: &'static str,
    pub dst_type: EntityType,
}

impl RelationRule {
    pub fn edge_type(&self) -> EdgeType {
        EdgeType::new(self.src_type, self.relation, self.dst_type)
    }
}

/// The full rule set. Processing code only ever loops over this.
#[derive(Debug, Clone, Copy)]
pub struct RelationSchema {
    pub node_groups: &'static [NodeRuleGroup],
    pub relations: &'static [RelationRule],
}

const fn col(table: &'static str, column: &'static str) -> ColumnRef {
    ColumnRef { table, column }
}

const DISEASE_GENE: &str = "disease_gene";
const DISEASE_GENE_FUSION: &str = "disease_gene_fusion";
const DISEASE_CHROM_REARR: &str = "disease_chromosomal_rearrangement";
const DISEASE_VARIANT: &str = "disease_variant";
const PATHWAY_DISEASE: &str = "pathway_disease_association";
const DISEASE_GENE_PATHWAY: &str = "disease_gene_pathway";
const DISEASE_BIOMARKER: &str = "disease_biomarker";
const CHEMICAL_EVIDENCE: &str = "chemical_evidence";
const CHEMICAL_LOCATION: &str = "chemical_location";
const DISEASE_DEMOGRAPHICS: &str = "disease_demographics";

const NODE_GROUPS: &[NodeRuleGroup] = &[
    NodeRuleGroup {
        entity: EntityType::Disease,
        sources: &[
            col(DISEASE_GENE, "DiseaseCui"),
            col(DISEASE_GENE_FUSION, "DiseaseCui"),
            col(DISEASE_CHROM_REARR, "DiseaseCui"),
            col(DISEASE_VARIANT, "DiseaseCui"),
            col(PATHWAY_DISEASE, "DiseaseCui"),
            col(DISEASE_GENE_PATHWAY, "DiseaseCui"),
            col(DISEASE_BIOMARKER, "DiseaseCui"),
            col(DISEASE_DEMOGRAPHICS, "DiseaseCui"),
        ],
    },
    NodeRuleGroup {
        entity: EntityType::Gene,
        sources: &[
            col(DISEASE_GENE, "GeneId"),
            col(DISEASE_VARIANT, "GeneId"),
            col(DISEASE_GENE_PATHWAY, "GeneId"),
        ],
    },
    NodeRuleGroup {
        entity: EntityType::Variant,
        sources: &[col(DISEASE_VARIANT, "VariantId")],
    },
    NodeRuleGroup {
        entity: EntityType::GeneFusion,
        sources: &[col(DISEASE_GENE_FUSION, "GeneFusion")],
    },
    NodeRuleGroup {
        entity: EntityType::ChromRearr,
        sources: &[col(DISEASE_CHROM_REARR, "ChromosomalRearrengementName")],
    },
    NodeRuleGroup {
        entity: EntityType::Pathway,
        sources: &[
            col(PATHWAY_DISEASE, "PathwayId"),
            col(DISEASE_GENE_PATHWAY, "PathwayId"),
        ],
    },
    NodeRuleGroup {
        entity: EntityType::Biomarker,
        sources: &[col(DISEASE_BIOMARKER, "BiomarkerId")],
    },
    NodeRuleGroup {
        entity: EntityType::Chemical,
        sources: &[
            col(CHEMICAL_EVIDENCE, "ChemicalId"),
            col(CHEMICAL_LOCATION, "ChemicalId"),
        ],
    },
    NodeRuleGroup {
        entity: EntityType::Evidence,
        sources: &[col(CHEMICAL_EVIDENCE, "EvidenceId")],
    },
    NodeRuleGroup {
        entity: EntityType::City,
        sources: &[col(CHEMICAL_LOCATION, "CityId")],
    },
    NodeRuleGroup {
        entity: EntityType::DemographicGroup,
        sources: &[col(DISEASE_DEMOGRAPHICS, "DemographicGroup")],
    },
];

const fn rel(
    table: &'static str,
    src_column: &'static str,
    src_type: EntityType,
    relation: &'static str,
    dst_column: &'static str,
    dst_type: EntityType,
) -> RelationRule {
    RelationRule {
        table,
        src_column,
        src_type,
        relation,
        dst_column,
        dst_type,
    }
}

const RELATIONS: &[RelationRule] = &[
    rel(DISEASE_GENE, "DiseaseCui", EntityType::Disease, "assoc_gene", "GeneId", EntityType::Gene),
    rel(
        DISEASE_GENE_FUSION,
        "DiseaseCui",
        EntityType::Disease,
        "assoc_gene_fusion",
        "GeneFusion",
        EntityType::GeneFusion,
    ),
    rel(
        DISEASE_CHROM_REARR,
        "DiseaseCui",
        EntityType::Disease,
        "assoc_chrom_rearr",
        "ChromosomalRearrengementName",
        EntityType::ChromRearr,
    ),
    rel(DISEASE_VARIANT, "DiseaseCui", EntityType::Disease, "assoc_variant", "VariantId", EntityType::Variant),
    rel(DISEASE_VARIANT, "VariantId", EntityType::Variant, "located_in", "GeneId", EntityType::Gene),
    rel(PATHWAY_DISEASE, "DiseaseCui", EntityType::Disease, "assoc_pathway", "PathwayId", EntityType::Pathway),
    rel(DISEASE_GENE_PATHWAY, "GeneId", EntityType::Gene, "participates_in", "PathwayId", EntityType::Pathway),
    rel(
        DISEASE_BIOMARKER,
        "DiseaseCui",
        EntityType::Disease,
        "assoc_biomarker",
        "BiomarkerId",
        EntityType::Biomarker,
    ),
    rel(CHEMICAL_EVIDENCE, "ChemicalId", EntityType::Chemical, "has_evidence", "EvidenceId", EntityType::Evidence),
    rel(CHEMICAL_LOCATION, "ChemicalId", EntityType::Chemical, "measured_in", "CityId", EntityType::City),
    rel(
        DISEASE_DEMOGRAPHICS,
        "DiseaseCui",
        EntityType::Disease,
        "has_demographic_stats",
        "DemographicGroup",
        EntityType::DemographicGroup,
    ),
];

impl RelationSchema {
    /// The disease / chemical knowledge-base schema.
    pub const fn builtin() -> Self {
        Self {
            node_groups: NODE_GROUPS,
            relations: RELATIONS,
        }
    }

    /// Distinct table names, in first-declared order (relations first).
    pub fn tables(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        let declared = self
            .relations
            .iter()
            .map(|r| r.table)
            .chain(self.node_groups.iter().flat_map(|g| g.sources.iter().map(|s| s.table)));
        for table in declared {
            if !out.contains(&table) {
                out.push(table);
            }
        }
        out
    }

    /// Columns whose values feed an entity key space, for one table.
    pub fn key_columns(&self, table: &str) -> Vec<(EntityType, &'static str)> {
        let mut out = Vec::new();
        for group in self.node_groups {
            for source in group.sources.iter().filter(|s| s.table == table) {
                if !out.contains(&(group.entity, source.column)) {
                    out.push((group.entity, source.column));
                }
            }
        }
        out
    }

    /// Every column the schema reads from `table`.
    pub fn required_columns(&self, table: &str) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = Vec::new();
        let from_keys = self.key_columns(table).into_iter().map(|(_, c)| c);
        let from_relations = self
            .relations
            .iter()
            .filter(|r| r.table == table)
            .flat_map(|r| [r.src_column, r.dst_column]);
        for column in from_keys.chain(from_relations) {
            if !out.contains(&column) {
                out.push(column);
            }
        }
        out
    }

    /// Entity types in declaration order.
    pub fn entity_types(&self) -> Vec<EntityType> {
        self.node_groups.iter().map(|g| g.entity).collect()
    }
}
