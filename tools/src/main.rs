use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use demodec_tools::{decode_entities, format_demo_pretty, inspect_demo, load_registry};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "demodec-tools",
    version,
    about = "demodec inspection and decoding tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a demo's header and message inventory.
    Header {
        /// Path to the demo file.
        demo: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
        /// Maximum payload size of a single message, in bytes.
        #[arg(long)]
        max_message_bytes: Option<usize>,
    },
    /// Decode a packet-entities payload and print the resulting entities.
    Entities {
        /// Path to the raw payload bytes.
        payload: PathBuf,
        /// Schema JSON describing classes and flattened tables.
        #[arg(long)]
        schema: PathBuf,
        /// Number of entity slots.
        #[arg(long)]
        max_entities: Option<usize>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Header {
            demo,
            format,
            max_message_bytes,
        } => {
            let bytes = read_file(&demo)?;
            let mut limits = wire::Limits::default();
            if let Some(max) = max_message_bytes {
                limits.max_message_bytes = max;
            }
            let report = inspect_demo(&bytes, &limits)
                .with_context(|| format!("decode demo {}", demo.display()))?;
            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&report).context("serialize json")?;
                    println!("{json}");
                }
                OutputFormat::Pretty => print!("{}", format_demo_pretty(&report)),
            }
        }
        Command::Entities {
            payload,
            schema,
            max_entities,
        } => {
            let contents = fs::read_to_string(&schema)
                .with_context(|| format!("read schema {}", schema.display()))?;
            let classes = load_registry(&contents)?;
            let mut limits = codec::CodecLimits::default();
            if let Some(max) = max_entities {
                limits.max_entities = max;
            }
            let bytes = read_file(&payload)?;
            debug!(bytes = bytes.len(), "decoding packet entities");
            let report = decode_entities(&bytes, &classes, &limits);
            let json = serde_json::to_string_pretty(&report).context("serialize json")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read {}", path.display()))
}
