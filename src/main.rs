use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use xmlgraph::ingest::{discover_xml_files, import_file, plan_file};
use xmlgraph::{Config, MappingConfig, Neo4jStore};

#[derive(Parser, Debug)]
#[command(name = "xmlgraph", version)]
#[command(about = "Import XML documents into Neo4j as nodes and relationships")]
struct Args {
    /// XML file or directory to import (overrides import.path)
    path: Option<PathBuf>,

    /// Config file (defaults to $XMLGRAPH_CONFIG, then ./config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load and map only; print the import plan as JSON without connecting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.xmlgraph.log_level.as_str())
    ).init();

    log::info!("Starting xmlgraph v{}", env!("CARGO_PKG_VERSION"));

    let input = args
        .path
        .clone()
        .or_else(|| config.import_path().map(PathBuf::from))
        .ok_or_else(|| anyhow::anyhow!(
            "No input given. Pass a file or directory, or set import.path in the config."
        ))?;

    let files = discover_xml_files(&input)?;
    if files.is_empty() {
        log::warn!("No XML files found under {}", input.display());
        return Ok(());
    }

    if args.dry_run {
        let failed = dry_run(&files, &config.mapping, &mut std::io::stdout().lock())?;
        if failed > 0 {
            anyhow::bail!("{} of {} file(s) could not be planned", failed, files.len());
        }
        return Ok(());
    }

    let mut store = Neo4jStore::connect(&config.neo4j).await?;

    let start = Instant::now();
    let total = files.len();
    let mut nodes = 0;
    let mut edges = 0;
    let mut links = 0;
    let mut errors = 0;

    for (idx, file) in files.iter().enumerate() {
        log::info!("[{}/{}] Importing: {}", idx + 1, total, file.display());

        match import_file(&mut store, file, &config.mapping).await {
            Ok(summary) => {
                nodes += summary.written.nodes;
                edges += summary.written.edges;
                links += summary.written.links;
                log::info!(
                    "✓ {} ({} nodes, {} edges, {} links)",
                    file.display(),
                    summary.written.nodes,
                    summary.written.edges,
                    summary.written.links
                );
            }
            Err(e) => {
                errors += 1;
                log::error!("✗ {}: {}", file.display(), e);
            }
        }
    }

    drop(store);

    log::info!("=== Import Complete ===");
    log::info!("Files: {} (success: {}, errors: {})", total, total - errors, errors);
    log::info!("Nodes created: {}", nodes);
    log::info!("Edges created: {}", edges + links);
    log::info!("Time: {:?}", start.elapsed());

    if errors > 0 {
        anyhow::bail!("{} of {} file(s) failed to import", errors, total);
    }

    Ok(())
}

/// Print the plan of every file as JSON; returns how many files failed.
fn dry_run<W: Write>(files: &[PathBuf], mapping: &MappingConfig, out: &mut W) -> Result<usize> {
    let mut failed = 0;
    for file in files {
        match plan_file(file, mapping) {
            Ok(plan) => {
                let json = serde_json::json!({
                    "file": file.display().to_string(),
                    "plan": plan,
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
            }
            Err(e) => {
                failed += 1;
                log::error!("✗ {}: {}", file.display(), e);
            }
        }
    }
    Ok(failed)
}
