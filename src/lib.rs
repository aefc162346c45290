pub mod config;
pub mod error;
pub mod graph;
pub mod render;
pub mod store;
pub mod tables;

pub use config::Config;
pub use error::{HetgraphError, Result};
pub use graph::{assemble, assemble_with, Assembly, BuildOptions, HeteroGraph, RelationSchema};
pub use store::ArtifactStore;
pub use tables::{CsvTableSource, TableRegistry};
