use clap::Parser;
use hetgraph::{config::Config, store::ArtifactStore};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stats")]
#[command(about = "Summarise a graph artifact")]
struct Args {
    /// Artifact path (defaults to paths.output_path)
    #[arg(short, long)]
    artifact: Option<PathBuf>,

    /// Print the build report and schema as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let path = match args.artifact {
        Some(p) => p,
        None => Config::load()?.paths.output_path,
    };
    let stored = ArtifactStore::new(&path).read()?;

    if args.json {
        let summary = serde_json::json!({
            "build_id": stored.meta.build_id,
            "created_at": stored.meta.created_at,
            "crate_version": stored.meta.crate_version,
            "schema": stored.graph.schema(),
            "num_nodes": stored.graph.nodes().map(|(t, n)| (t.as_str(), n.num_nodes)).collect::<std::collections::BTreeMap<_, _>>(),
            "report": stored.report,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("\n=== hetgraph Artifact Statistics ===\n");
    println!("Artifact: {}", path.display());
    println!("Build: {} ({})", stored.meta.build_id, stored.meta.created_at);
    println!("Written by: hetgraph {}", stored.meta.crate_version);
    println!(
        "Edge multiplicity: {}",
        if stored.report.dedup_edges { "deduplicated" } else { "preserved" }
    );

    println!("\nSource Tables:\n");
    println!("{:-<80}", "");
    println!("{:<40} {:>10} {:>12}  {}", "Table", "Status", "Rows", "SHA-256");
    println!("{:-<80}", "");
    for t in &stored.report.tables {
        let checksum = t.checksum.as_deref().map(short_checksum).unwrap_or_else(|| "-".to_string());
        println!("{:<40} {:>10} {:>12}  {}", t.table, t.status, t.row_count, checksum);
    }
    println!("{:-<80}", "");

    println!("\nNode Types:\n");
    println!("{:-<50}", "");
    println!("{:<25} {:>12} {:>10}", "Type", "Nodes", "Feat dim");
    println!("{:-<50}", "");
    for (entity, nodes) in stored.graph.nodes() {
        println!("{:<25} {:>12} {:>10}", entity, nodes.num_nodes, nodes.feature_dim);
    }
    println!("{:-<50}", "");

    println!("\nRelations:\n");
    println!("{:-<80}", "");
    println!("{:<55} {:>10} {:>12}", "Relation", "Edges", "Dropped rows");
    println!("{:-<80}", "");
    for r in &stored.report.relations {
        println!("{:<55} {:>10} {:>12}", r.edge_type.to_string(), r.num_edges, r.dropped_rows);
    }
    println!("{:-<80}", "");

    println!("\nTotals:");
    println!("  Nodes: {}", stored.graph.nodes().map(|(_, n)| n.num_nodes).sum::<usize>());
    println!("  Edges: {}", stored.graph.num_edges());
    println!("  Unresolved rows dropped: {}", stored.report.dropped_rows());
    println!();

    Ok(())
}

/// First 12 characters of a stored checksum; never splits a character.
fn short_checksum(checksum: &str) -> String {
    checksum.chars().take(12).collect()
}
