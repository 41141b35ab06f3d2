use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use xmlgraph::ingest::load_document;

/// Print every path of an XML file with its value, in the syntax
/// `[mapping.fields]` and `value_path` expect.
#[derive(Parser, Debug)]
#[command(name = "xmlgraph-inspect")]
#[command(about = "List the addressable paths of an XML document")]
struct Args {
    /// XML file to inspect
    file: PathBuf,

    /// Only show paths starting with this prefix
    #[arg(short, long)]
    prefix: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let doc = load_document(&args.file)?;

    let mut shown = 0;
    for (path, value) in doc.root.paths() {
        if let Some(prefix) = &args.prefix {
            if !path.starts_with(prefix.as_str()) {
                continue;
            }
        }
        println!("{} = {:?}", path, value);
        shown += 1;
    }

    log::info!("{} paths listed from {}", shown, args.file.display());
    Ok(())
}
