//! Graph artifact persistence: one SQLite file per build, published atomically.

use rusqlite::{params, Connection, OpenFlags};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{HetgraphError, Result};
use crate::graph::{
    Assembly, BuildReport, EdgeIndex, EdgeType, EntityType, GraphSchema, HeteroGraph, IdMap, IdMaps, NodeSet,
    RelationReport, TableReport,
};

pub mod migrate;

/// Provenance recorded with every artifact
#[derive(Debug, Clone, PartialEq)]
pub struct BuildMeta {
    pub build_id: String,
    pub created_at: String,
    pub crate_version: String,
    pub schema_version: u32,
}

/// Everything read back from an artifact
#[derive(Debug, Clone)]
pub struct StoredGraph {
    pub meta: BuildMeta,
    pub graph: HeteroGraph,
    pub id_maps: IdMaps,
    pub report: BuildReport,
}

/// Handle on an artifact path
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `assembly`, replacing any previous artifact only once the new
    /// one is completely written.
    pub fn write(&self, assembly: &Assembly) -> Result<BuildMeta> {
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| HetgraphError::InvalidInput(format!("invalid artifact path: {}", self.path.display())))?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let meta = BuildMeta {
            build_id: Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: migrate::latest_version(),
        };

        let tmp = dir.join(format!(".{}.{}.tmp", file_name, meta.build_id));
        let published = write_into(&tmp, assembly, &meta).and_then(|()| fs::rename(&tmp, &self.path).map_err(HetgraphError::Io));
        if let Err(e) = published {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        log::info!("Saved hetero graph to {}", self.path.display());
        Ok(meta)
    }

    fn open_read_only(&self) -> Result<Connection> {
        if !self.path.is_file() {
            return Err(HetgraphError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("artifact not found: {}", self.path.display()),
            )));
        }
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
            .map_err(|e| HetgraphError::Artifact(format!("not a graph artifact: {}", e)))?;
        if version > migrate::latest_version() {
            return Err(HetgraphError::Artifact(format!(
                "artifact schema version {} is newer than supported {}",
                version,
                migrate::latest_version()
            )));
        }
        Ok(conn)
    }

    /// Node types and relation triples only; no payload is read.
    pub fn read_schema(&self) -> Result<GraphSchema> {
        let conn = self.open_read_only()?;
        let node_types = conn
            .prepare("SELECT node_type FROM node_types ORDER BY position")?
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?
            .iter()
            .map(|s| parse_entity(s))
            .collect::<Result<Vec<_>>>()?;
        let edge_types = read_edge_type_rows(&conn)?
            .into_iter()
            .map(|row| row.report.edge_type)
            .collect();
        Ok(GraphSchema { node_types, edge_types })
    }

    /// Read the full graph, ID maps, build report and provenance.
    pub fn read(&self) -> Result<StoredGraph> {
        let conn = self.open_read_only()?;
        let meta = read_meta(&conn)?;

        let mut graph = HeteroGraph::new();
        let mut stmt = conn.prepare("SELECT node_type, num_nodes, feature_dim, features FROM node_types ORDER BY position")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        for (node_type, num_nodes, feature_dim, blob) in rows {
            let entity = parse_entity(&node_type)?;
            let num_nodes = to_usize(num_nodes, "num_nodes")?;
            let feature_dim = to_usize(feature_dim, "feature_dim")?;
            let features = decode_features(&blob)?;
            if features.len() != num_nodes * feature_dim {
                return Err(HetgraphError::Artifact(format!(
                    "{}: {} feature values for {} x {}",
                    node_type,
                    features.len(),
                    num_nodes,
                    feature_dim
                )));
            }
            graph.insert_nodes(
                entity,
                NodeSet {
                    num_nodes,
                    feature_dim,
                    features,
                },
            );
        }

        let mut report = BuildReport {
            dedup_edges: meta_flag(&conn, "dedup_edges")?,
            tables: read_source_tables(&conn)?,
            relations: Vec::new(),
        };

        let mut edge_stmt =
            conn.prepare("SELECT src_index, dst_index FROM edges WHERE edge_type_position = ?1 ORDER BY ordinal")?;
        for row in read_edge_type_rows(&conn)? {
            let mut edges = EdgeIndex::default();
            let pairs = edge_stmt
                .query_map([row.position], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)))?
                .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
            for (s, d) in pairs {
                edges.push(to_usize(s, "src_index")?, to_usize(d, "dst_index")?);
            }
            if edges.len() != row.report.num_edges {
                return Err(HetgraphError::Artifact(format!(
                    "{}: expected {} edges, found {}",
                    row.report.edge_type,
                    row.report.num_edges,
                    edges.len()
                )));
            }
            graph.insert_edges(row.report.edge_type.clone(), edges);
            report.relations.push(row.report);
        }

        let id_maps = read_id_maps(&conn)?;

        Ok(StoredGraph {
            meta,
            graph,
            id_maps,
            report,
        })
    }

    /// SQLite integrity plus graph consistency: every node set matches its
    /// ID map and every edge index is in range.
    pub fn verify(&self) -> Result<StoredGraph> {
        let integrity: String = self
            .open_read_only()?
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(HetgraphError::Artifact(format!("integrity check failed: {}", integrity)));
        }

        let stored = self.read()?;
        for (entity, nodes) in stored.graph.nodes() {
            let keys = stored.id_maps.get(&entity).map(IdMap::len).unwrap_or(0);
            if keys != nodes.num_nodes {
                return Err(HetgraphError::Artifact(format!(
                    "{}: {} nodes but {} mapped keys",
                    entity, nodes.num_nodes, keys
                )));
            }
        }
        for (edge_type, edges) in stored.graph.edges() {
            let src_n = stored.graph.num_nodes(edge_type.src);
            let dst_n = stored.graph.num_nodes(edge_type.dst);
            if let Some((s, d)) = edges.pairs().find(|&(s, d)| s >= src_n || d >= dst_n) {
                return Err(HetgraphError::Artifact(format!(
                    "{}: edge ({}, {}) out of range ({} x {})",
                    edge_type, s, d, src_n, dst_n
                )));
            }
        }
        log::debug!("Artifact {} verified", self.path.display());
        Ok(stored)
    }
}

fn write_into(path: &Path, assembly: &Assembly, meta: &BuildMeta) -> Result<()> {
    let mut conn = Connection::open(path)?;
    // Rollback journal, not WAL: the file is renamed once closed and must stand alone.
    conn.execute_batch(
        "PRAGMA journal_mode = DELETE; \
         PRAGMA synchronous = FULL; \
         PRAGMA foreign_keys = ON; \
         PRAGMA temp_store = MEMORY;",
    )?;
    migrate::run_migrations(&mut conn)?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare("INSERT INTO build_meta (key, value) VALUES (?1, ?2)")?;
        stmt.execute(params!["build_id", meta.build_id])?;
        stmt.execute(params!["created_at", meta.created_at])?;
        stmt.execute(params!["crate_version", meta.crate_version])?;
        stmt.execute(params!["dedup_edges", assembly.report.dedup_edges.to_string()])?;

        let mut stmt = tx.prepare(
            "INSERT INTO source_tables (position, table_name, status, row_count, checksum) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (pos, t) in assembly.report.tables.iter().enumerate() {
            stmt.execute(params![pos as i64, t.table, t.status.as_str(), t.row_count as i64, t.checksum])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO node_types (position, node_type, num_nodes, feature_dim, features) VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (pos, (entity, nodes)) in assembly.graph.nodes().enumerate() {
            stmt.execute(params![
                pos as i64,
                entity.as_str(),
                nodes.num_nodes as i64,
                nodes.feature_dim as i64,
                encode_features(&nodes.features),
            ])?;
        }

        let mut stmt = tx.prepare("INSERT INTO id_maps (node_type, external_key, node_index) VALUES (?1, ?2, ?3)")?;
        for (entity, map) in &assembly.id_maps {
            for (key, index) in map.iter() {
                stmt.execute(params![entity.as_str(), key, index as i64])?;
            }
        }

        let mut type_stmt = tx.prepare(
            "INSERT INTO edge_types (position, src_type, relation, dst_type, source_table, num_edges, dropped_rows) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        let mut edge_stmt =
            tx.prepare("INSERT INTO edges (edge_type_position, ordinal, src_index, dst_index) VALUES (?1, ?2, ?3, ?4)")?;
        for (pos, (edge_type, edges)) in assembly.graph.edges().enumerate() {
            let relation = assembly.report.relations.iter().find(|r| &r.edge_type == edge_type);
            type_stmt.execute(params![
                pos as i64,
                edge_type.src.as_str(),
                edge_type.relation,
                edge_type.dst.as_str(),
                relation.map(|r| r.table.as_str()).unwrap_or(""),
                edges.len() as i64,
                relation.map(|r| r.dropped_rows).unwrap_or(0) as i64,
            ])?;
            for (ordinal, (s, d)) in edges.pairs().enumerate() {
                edge_stmt.execute(params![pos as i64, ordinal as i64, s as i64, d as i64])?;
            }
        }
    }
    tx.commit()?;

    conn.close().map_err(|(_, e)| HetgraphError::Database(e))?;
    Ok(())
}

struct EdgeTypeRow {
    position: i64,
    report: RelationReport,
}

fn read_edge_type_rows(conn: &Connection) -> Result<Vec<EdgeTypeRow>> {
    let mut stmt = conn.prepare(
        "SELECT position, src_type, relation, dst_type, source_table, num_edges, dropped_rows \
         FROM edge_types ORDER BY position",
    )?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    raw.into_iter()
        .map(|(position, src, relation, dst, table, num_edges, dropped)| {
            Ok(EdgeTypeRow {
                position,
                report: RelationReport {
                    edge_type: EdgeType::new(parse_entity(&src)?, relation, parse_entity(&dst)?),
                    table,
                    num_edges: to_usize(num_edges, "num_edges")?,
                    dropped_rows: to_usize(dropped, "dropped_rows")?,
                },
            })
        })
        .collect()
}

fn read_source_tables(conn: &Connection) -> Result<Vec<TableReport>> {
    let mut stmt = conn.prepare("SELECT table_name, status, row_count, checksum FROM source_tables ORDER BY position")?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    raw.into_iter()
        .map(|(table, status, row_count, checksum)| {
            Ok(TableReport {
                table,
                status: status.parse()?,
                row_count: to_usize(row_count, "row_count")?,
                checksum,
            })
        })
        .collect()
}

fn read_id_maps(conn: &Connection) -> Result<IdMaps> {
    let mut stmt = conn.prepare("SELECT node_type, external_key FROM id_maps ORDER BY node_type, node_index")?;
    let raw = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

    let mut keys: std::collections::BTreeMap<EntityType, Vec<String>> = Default::default();
    for (node_type, key) in raw {
        keys.entry(parse_entity(&node_type)?).or_default().push(key);
    }
    Ok(keys
        .into_iter()
        .map(|(entity, keys)| (entity, IdMap::from_ordered_keys(keys)))
        .collect())
}

fn read_meta(conn: &Connection) -> Result<BuildMeta> {
    let get = |key: &str| -> Result<String> {
        conn.query_row("SELECT value FROM build_meta WHERE key = ?1", [key], |row| row.get(0))
            .map_err(|e| HetgraphError::Artifact(format!("build_meta.{}: {}", key, e)))
    };
    let schema_version = conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))?;
    Ok(BuildMeta {
        build_id: get("build_id")?,
        created_at: get("created_at")?,
        crate_version: get("crate_version")?,
        schema_version,
    })
}

fn meta_flag(conn: &Connection, key: &str) -> Result<bool> {
    let value: Option<String> = conn
        .query_row("SELECT value FROM build_meta WHERE key = ?1", [key], |row| row.get(0))
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;
    Ok(value.as_deref() == Some("true"))
}

fn parse_entity(name: &str) -> Result<EntityType> {
    name.parse()
        .map_err(|_| HetgraphError::Artifact(format!("unknown node type '{}'", name)))
}

fn to_usize(value: i64, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| HetgraphError::Artifact(format!("negative {}: {}", what, value)))
}

fn encode_features(features: &[f32]) -> Vec<u8> {
    features.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_features(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(HetgraphError::Artifact(format!("feature blob of {} bytes", blob.len())));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
