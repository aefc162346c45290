use anyhow::Result;
use hetgraph::graph::RelationSchema;
use hetgraph::store::ArtifactStore;
use hetgraph::tables::{discover_tables, CsvTableSource, TableRegistry};
use hetgraph::Config;

fn main() -> Result<()> {
    let config = Config::load()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.paths.log_level)).init();

    log::info!("Config: {}", config.describe_source());

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("verify");

    match command {
        "verify-artifact" => run_artifact_verification(&config)?,
        "verify" => run_input_verification(&config)?,
        other => {
            log::error!("Unknown command '{}' (expected verify or verify-artifact)", other);
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Check the raw tables against the relation schema without writing anything
fn run_input_verification(config: &Config) -> Result<()> {
    log::info!("Starting hetgraph v{}", env!("CARGO_PKG_VERSION"));

    log::info!("Raw tables: {}", config.raw_dir().display());
    log::info!("Artifact path: {}", config.output_path().display());

    let schema = RelationSchema::builtin();
    let declared = schema.tables();

    let discovered = discover_tables(config.raw_dir())?;
    for file in &discovered {
        if !declared.iter().any(|t| *t == file.name) {
            log::debug!("Ignoring undeclared table file {}", file.path.display());
        }
    }

    let source = CsvTableSource::new(config.raw_dir(), config.tables.null_markers.clone());
    let registry = TableRegistry::load(&source, &schema)?;

    println!("\n=== Source tables ===\n");
    println!("{:<40} {:>10} {:>12}  {}", "Table", "Rows", "Bytes", "Relations");
    println!("{:-<90}", "");
    for name in &declared {
        let relations: Vec<_> = schema
            .relations
            .iter()
            .filter(|r| r.table == *name)
            .map(|r| r.relation)
            .collect();
        let rows = match registry.get(name) {
            Some(t) => t.row_count().to_string(),
            None => "missing".to_string(),
        };
        let bytes = discovered
            .iter()
            .find(|f| f.name == *name)
            .map(|f| f.file_size.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<40} {:>10} {:>12}  {}", name, rows, bytes, relations.join(", "));
    }
    println!("{:-<90}", "");

    let missing: Vec<_> = declared.iter().filter(|t| !registry.contains(t)).copied().collect();
    println!(
        "{} of {} declared tables present; column contract satisfied.",
        registry.len(),
        declared.len()
    );
    if !missing.is_empty() {
        println!("Relations over these tables will be omitted: {}", missing.join(", "));
    }

    Ok(())
}

/// Check an existing artifact for integrity and index consistency
fn run_artifact_verification(config: &Config) -> Result<()> {
    let store = ArtifactStore::new(config.output_path());
    let stored = store.verify()?;

    log::info!(
        "✓ Artifact {} (build {}, {} node types, {} relations, {} edges)",
        store.path().display(),
        stored.meta.build_id,
        stored.graph.node_types().count(),
        stored.graph.edge_types().count(),
        stored.graph.num_edges()
    );
    Ok(())
}
