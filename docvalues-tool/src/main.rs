//! Docvalues Tool - CLI for writing and inspecting doc values segments
//!
//! # Commands
//!
//! - `encode` - Encode a JSONL file (one object per document) into a new segment
//! - `inspect` - Show the storage strategy and memory use of every field
//! - `dump` - Print each document's decoded value for one field
//!
//! # Examples
//!
//! ```bash
//! docvalues-tool encode -d ./segments -s schema.json -i docs.jsonl
//! docvalues-tool inspect -d ./segments -s schema.json --segment 0192f0c4...
//! docvalues-tool dump -d ./segments -s schema.json --segment 0192f0c4... -f norms
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod segment_ops;

#[derive(Parser)]
#[command(name = "docvalues-tool")]
#[command(version, about = "CLI for writing and inspecting doc values segments")]
#[command(after_help = "Use 'docvalues-tool <command> --help' for more information.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode documents from a JSONL file into a new segment
    Encode {
        /// Directory holding the segment files
        #[arg(short, long)]
        dir: PathBuf,

        /// Path to the JSON schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// JSONL input, one object of field values per document
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show per-field strategy, stored count and memory use
    Inspect {
        /// Directory holding the segment files
        #[arg(short, long)]
        dir: PathBuf,

        /// Path to the JSON schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Segment id (32 hex chars)
        #[arg(long)]
        segment: String,
    },

    /// Print the decoded value of every document for one field
    Dump {
        /// Directory holding the segment files
        #[arg(short, long)]
        dir: PathBuf,

        /// Path to the JSON schema file
        #[arg(short, long)]
        schema: PathBuf,

        /// Segment id (32 hex chars)
        #[arg(long)]
        segment: String,

        /// Field name
        #[arg(short, long)]
        field: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docvalues_tool=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { dir, schema, input } => {
            segment_ops::encode(dir, schema, input).await?;
        }
        Commands::Inspect {
            dir,
            schema,
            segment,
        } => {
            segment_ops::inspect(dir, schema, segment).await?;
        }
        Commands::Dump {
            dir,
            schema,
            segment,
            field,
        } => {
            segment_ops::dump(dir, schema, segment, field).await?;
        }
    }

    Ok(())
}
