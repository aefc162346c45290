use anyhow::{Context, Result};
use clap::Parser;
use hetgraph::render::{render_dot, RenderOptions};
use hetgraph::store::ArtifactStore;
use hetgraph::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "schema")]
#[command(about = "Render the graph schema (node types and relations) as Graphviz DOT")]
struct Args {
    /// Artifact path (defaults to paths.output_path)
    #[arg(short, long)]
    artifact: Option<PathBuf>,

    /// Write the diagram here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let artifact = args.artifact.unwrap_or_else(|| config.paths.output_path.clone());

    let schema = ArtifactStore::new(&artifact)
        .read_schema()
        .with_context(|| format!("Failed to read schema from {}", artifact.display()))?;

    let options = RenderOptions {
        title: config.render.title.clone(),
        center: config.render_center()?,
    };
    let dot = render_dot(&schema, &options);

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, dot).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Saved schema diagram to {}", path.display());
        }
        None => print!("{}", dot),
    }

    Ok(())
}
