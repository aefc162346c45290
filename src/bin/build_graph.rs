use anyhow::Result;
use clap::Parser;
use hetgraph::graph::{assemble_with, BuildOptions, RelationSchema};
use hetgraph::store::ArtifactStore;
use hetgraph::tables::{discover_tables, CsvTableSource, TableRegistry};
use hetgraph::Config;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "build-graph")]
#[command(about = "Assemble the heterogeneous graph from the raw association tables")]
struct Args {
    /// Directory with the extracted <table>.csv files (overrides config)
    #[arg(long)]
    raw_dir: Option<PathBuf>,

    /// Artifact path (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Collapse repeated (src, dst) pairs within each relation
    #[arg(long)]
    dedup_edges: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.paths.log_level)).init();

    log::info!("Config: {}", config.describe_source());

    if let Some(raw_dir) = args.raw_dir {
        config.paths.raw_dir = raw_dir;
    }
    if let Some(output) = args.output {
        config.paths.output_path = output;
    }
    config.graph.dedup_edges |= args.dedup_edges;
    config.validate()?;

    log::info!("Raw tables: {}", config.raw_dir().display());
    log::info!("Artifact path: {}", config.output_path().display());

    let start = Instant::now();
    let schema = RelationSchema::builtin();
    let declared = schema.tables();
    let discovered = discover_tables(config.raw_dir())?;
    for file in &discovered {
        if !declared.iter().any(|t| *t == file.name) {
            log::debug!("Ignoring undeclared table file {}", file.path.display());
        }
    }
    log::info!(
        "Discovered {} CSV files ({} bytes)",
        discovered.len(),
        discovered.iter().map(|f| f.file_size).sum::<u64>()
    );

    let source = CsvTableSource::new(config.raw_dir(), config.tables.null_markers.clone());
    let registry = TableRegistry::load(&source, &schema)?;
    if registry.is_empty() {
        log::warn!("No source tables found; the graph will be empty.");
    }

    let options = BuildOptions {
        dedup_edges: config.graph.dedup_edges,
    };
    let assembly = assemble_with(&registry, &schema, &options)?;

    let store = ArtifactStore::new(config.output_path());
    let meta = store.write(&assembly)?;

    let missing: Vec<_> = assembly.report.missing_tables().collect();
    log::info!("=== Build Complete ===");
    log::info!("Build id: {}", meta.build_id);
    log::info!("Tables loaded: {} of {}", registry.len(), declared.len());
    if !missing.is_empty() {
        log::info!("  Missing: {}", missing.join(", "));
    }
    log::info!("Node types: {}", assembly.graph.node_types().count());
    log::info!("Relations: {}", assembly.graph.edge_types().count());
    log::info!("Edges: {}", assembly.graph.num_edges());
    log::info!("Unresolved rows dropped: {}", assembly.report.dropped_rows());
    log::info!("Time: {:?}", start.elapsed());

    Ok(())
}
