use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dgraph_eval::{execute_with, EngineConfig};
use dgraph_transforms::TransformRegistry;
use dgraph_types::GraphDocument;

#[derive(Parser)]
#[command(name = "dgraph", version, about = "Run declarative computation graphs")]
struct Cli {
    /// Engine settings as JSON (`{"trace": bool, "maxDepth": n}`)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log every executed step
    #[arg(short, long, global = true, env = "DGRAPH_DEBUG")]
    debug: bool,

    /// Nesting bound before a run fails as cyclic
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a graph and print its output as JSON
    Run {
        /// Graph document (step array or `{ data: [...] }`)
        graph: PathBuf,
        /// Inputs document; `-` reads standard input
        #[arg(short, long)]
        inputs: Option<PathBuf>,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Load and validate a graph without running it
    Check {
        graph: PathBuf,
    },
    /// List the available transform functions
    Functions,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "dgraph=debug,warn" } else { "dgraph=info,warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = engine_config(&cli)?;
    let registry = TransformRegistry::standard();

    match cli.command {
        Commands::Run {
            graph,
            inputs,
            pretty,
        } => {
            let definition = read_json(&graph)?;
            let inputs = match inputs {
                Some(path) => read_json(&path)?,
                None => Value::Object(Default::default()),
            };
            let output = execute_with(&definition, inputs, &registry, &config)
                .with_context(|| format!("failed to execute {}", graph.display()))?;
            let output = Value::Object(output);
            let text = if pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{text}");
        }
        Commands::Check { graph } => {
            let document = GraphDocument::from_value(&read_json(&graph)?)
                .with_context(|| format!("invalid graph {}", graph.display()))?;
            info!(graph = %document.label(), steps = document.data.len(), "graph is valid");
            println!("{}: ok ({} steps)", document.label(), document.data.len());
        }
        Commands::Functions => {
            for name in registry.names() {
                println!("{name}");
            }
        }
    }
    Ok(())
}

/// Config file first, then command-line overrides.
fn engine_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => serde_json::from_value(read_json(path)?)
            .with_context(|| format!("invalid engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if cli.debug {
        config.trace = true;
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    Ok(config)
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read standard input")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}
